//! Shared command line pieces for the binaries.

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::batch::AttachmentError;
use crate::config::Config;
use crate::i18n::{translate, Locale};
use crate::import::ImportError;
use crate::preview::Preview;
use crate::render::{html_to_text, MessageTemplate};
use crate::session::Session;
use crate::store::{KeyValueStore, StorageService};
use crate::util::format_file_size;

/// Install the tracing subscriber. Logs go to stderr so stdout stays free
/// for user-facing output.
pub fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().flatten_event(true).with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().compact().with_writer(std::io::stderr))
            .init();
    }
}

/// Open the configured settings/template store.
pub fn open_storage(config: &Config) -> Result<StorageService> {
    let store = KeyValueStore::open(config.store_kind, &config.data_dir)
        .with_context(|| format!("Failed to open store in {}", config.data_dir.display()))?;
    Ok(StorageService::new(store))
}

/// A preview page as terminal text.
pub fn format_preview(preview: &Preview, locale: Locale) -> String {
    let none = translate("none", locale, &[]);
    let to = if preview.message.to.is_empty() {
        format!("({})", none)
    } else {
        preview.message.to.clone()
    };
    let attachments = if preview.attachments.is_empty() {
        none
    } else {
        preview.attachments.join(", ")
    };

    format!(
        "{}\n{}: {}\n{}: {}\n{}: {}\n\n{}\n",
        translate("preview_position", locale, &[&preview.position, &preview.total]),
        translate("to", locale, &[]),
        to,
        translate("subject", locale, &[]),
        preview.message.subject,
        translate("attachments", locale, &[]),
        attachments,
        html_to_text(preview.message.content.as_str()),
    )
}

/// An import failure in the user's language.
pub fn describe_import_error(err: &ImportError, locale: Locale) -> String {
    match err {
        ImportError::NoData => translate("file_no_data", locale, &[]),
        ImportError::NoHeaders => translate("excel_no_headers", locale, &[]),
        ImportError::MalformedRows(issues) => translate("parse_error", locale, &[&issues.join(", ")]),
        ImportError::UnsupportedFormat(name) => translate("unsupported_file", locale, &[name]),
        ImportError::Workbook(reason) => format!("{}: {}", translate("excel_error", locale, &[]), reason),
        ImportError::Io(e) => format!("{}: {}", translate("file_error", locale, &[]), e),
    }
}

/// Everything needed to compose a batch: data, template and attachments.
#[derive(Debug, Clone, Args)]
pub struct ComposeArgs {
    /// CSV or spreadsheet file with one recipient per row
    #[arg(short, long)]
    pub data: PathBuf,

    /// Subject line; may contain {{placeholders}}
    #[arg(short, long, conflicts_with = "template")]
    pub subject: Option<String>,

    /// File containing the HTML body
    #[arg(short, long, conflicts_with = "template")]
    pub body: Option<PathBuf>,

    /// Id of a saved template to use for subject and body
    #[arg(short, long)]
    pub template: Option<String>,

    /// Send the visible text of the body instead of HTML
    #[arg(long)]
    pub plain_text: bool,

    /// Files to attach to every message
    #[arg(short, long = "attach", value_name = "FILE")]
    pub attachments: Vec<PathBuf>,

    /// Attachment given as NAME=FILE, where FILE holds a data: URL or base64 text
    #[arg(long = "attach-data", value_name = "NAME=FILE", value_parser = parse_named_path)]
    pub data_attachments: Vec<(String, PathBuf)>,
}

fn parse_named_path(raw: &str) -> Result<(String, PathBuf), String> {
    match raw.split_once('=') {
        Some((name, path)) if !name.trim().is_empty() && !path.is_empty() => {
            Ok((name.trim().to_string(), PathBuf::from(path)))
        }
        _ => Err(format!("expected NAME=FILE, got {}", raw)),
    }
}

impl ComposeArgs {
    /// Build the message template from a saved template or the given
    /// subject and body file.
    pub fn message_template(&self, storage: &StorageService, locale: Locale) -> Result<MessageTemplate> {
        if let Some(id) = &self.template {
            let Some(template) = storage.find_template(id) else {
                bail!("{}: {}", translate("template_not_found", locale, &[]), id);
            };
            println!("{}", translate("template_loaded", locale, &[&template.name]));
            return Ok(template.to_message_template(self.plain_text));
        }

        let body = match &self.body {
            Some(path) => fs::read_to_string(path)
                .with_context(|| format!("Failed to read body from {}", path.display()))?,
            None => String::new(),
        };

        Ok(MessageTemplate::new(
            self.subject.clone().unwrap_or_default(),
            body,
            self.plain_text,
        ))
    }

    /// Load data, template and attachments into a new session.
    ///
    /// Attachments that cannot be added are reported and skipped.
    pub fn build_session(&self, storage: &StorageService, config: &Config) -> Result<Session> {
        let settings = config.apply(storage.get_settings());
        let mut session = Session::new(settings);
        let locale = session.locale();

        let rows = match session.load_file(&self.data) {
            Ok(rows) => rows,
            Err(e) => bail!("{}: {}", self.data.display(), describe_import_error(&e, locale)),
        };
        println!("{}", translate("data_loaded", locale, &[&rows]));

        session.set_template(self.message_template(storage, locale)?);
        for field in session.unknown_fields() {
            eprintln!("{}", translate("unknown_placeholder", locale, &[&field]));
        }

        for rejected in session.add_attachment_paths(&self.attachments) {
            let name = rejected.path.display();
            match rejected.error {
                AttachmentError::TooLarge { .. } => {
                    eprintln!("{}", translate("file_too_large", locale, &[&name]));
                }
                other => eprintln!("{}: {}", translate("warning", locale, &[]), other),
            }
        }

        for (name, path) in &self.data_attachments {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read attachment data from {}", path.display()))?;
            match session.add_attachment_data(name, &content) {
                Ok(()) => {}
                Err(AttachmentError::TooLarge { .. }) => {
                    eprintln!("{}", translate("file_too_large", locale, &[&name]));
                }
                Err(AttachmentError::Conversion(e)) => {
                    bail!(translate("conversion_error", locale, &[&e]));
                }
                Err(other) => eprintln!("{}: {}", translate("warning", locale, &[]), other),
            }
        }

        for attachment in session.attachments() {
            println!(
                "{}: {} ({})",
                translate("attachment_added", locale, &[]),
                attachment.filename,
                format_file_size(attachment.size_bytes)
            );
        }

        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{StoreKind, Template};
    use clap::Parser;

    #[derive(Debug, Parser)]
    struct TestCli {
        #[command(flatten)]
        compose: ComposeArgs,
    }

    fn storage(dir: &std::path::Path) -> StorageService {
        StorageService::new(KeyValueStore::open(StoreKind::Json, dir).unwrap())
    }

    #[test]
    fn test_parse_compose_args() {
        let cli = TestCli::parse_from([
            "test", "--data", "people.csv", "--subject", "Hi {{name}}", "--plain-text", "-a", "a.pdf",
            "-a", "b.png",
        ]);

        assert_eq!(cli.compose.data, PathBuf::from("people.csv"));
        assert_eq!(cli.compose.subject.as_deref(), Some("Hi {{name}}"));
        assert!(cli.compose.plain_text);
        assert_eq!(cli.compose.attachments.len(), 2);
    }

    #[test]
    fn test_parse_attach_data() {
        let cli = TestCli::parse_from(["test", "--data", "x.csv", "--attach-data", "invoice.pdf=inv.b64"]);
        assert_eq!(
            cli.compose.data_attachments,
            vec![("invoice.pdf".to_string(), PathBuf::from("inv.b64"))]
        );

        let bad = TestCli::try_parse_from(["test", "--data", "x.csv", "--attach-data", "inv.b64"]);
        assert!(bad.is_err());
    }

    #[test]
    fn test_describe_import_error_is_translated() {
        assert_eq!(
            describe_import_error(&ImportError::NoData, Locale::De),
            "Die Datei enthält keine Daten"
        );
        assert_eq!(
            describe_import_error(&ImportError::UnsupportedFormat("a.txt".into()), Locale::En),
            "Unsupported file type: a.txt"
        );
        assert_eq!(
            describe_import_error(&ImportError::MalformedRows(vec!["r1".into(), "r2".into()]), Locale::De),
            "Fehler beim Parsen: r1, r2"
        );
        assert_eq!(
            describe_import_error(&ImportError::NoHeaders, Locale::En),
            "No valid column headers found."
        );
    }

    #[test]
    fn test_template_conflicts_with_subject() {
        let result = TestCli::try_parse_from([
            "test", "--data", "x.csv", "--subject", "Hi", "--template", "template_1",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_message_template_from_saved_template() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage(dir.path());
        let saved = storage
            .save_template(Template::new("Welcome", "Hi {{name}}", "<p>Hello</p>"))
            .unwrap();

        let cli = TestCli::parse_from(["test", "--data", "x.csv", "--template", saved.id.as_str()]);
        let template = cli.compose.message_template(&storage, Locale::En).unwrap();
        assert_eq!(template.subject, "Hi {{name}}");
        assert_eq!(template.body, "<p>Hello</p>");

        let missing = TestCli::parse_from(["test", "--data", "x.csv", "--template", "nope"]);
        assert!(missing.compose.message_template(&storage, Locale::En).is_err());
    }

    #[test]
    fn test_format_preview() {
        let preview = Preview {
            message: crate::render::RenderedMessage {
                to: String::new(),
                subject: "Hi Bob".into(),
                content: crate::render::MessageContent::Html("<p>Hello Bob</p>".into()),
            },
            position: 2,
            total: 3,
            attachments: Vec::new(),
        };

        let page = format_preview(&preview, Locale::En);
        assert!(page.starts_with("Recipient 2 of 3\n"));
        assert!(page.contains("To: (None)\n"));
        assert!(page.contains("Attachments: None\n"));
        assert!(page.contains("Hello Bob"));
        assert!(!page.contains("<p>"));
    }

    #[test]
    fn test_build_session() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("people.csv");
        let body = dir.path().join("body.html");
        fs::write(&data, "name,email\nAnn,ann@x.com\n").unwrap();
        fs::write(&body, "<p>Hello {{name}}</p>").unwrap();

        let config = Config {
            data_dir: dir.path().join("store"),
            store_kind: StoreKind::Json,
            language: None,
            webhook_url: Some("https://hook".into()),
            default_sender: None,
            webhook_timeout_secs: None,
            log_json: false,
        };
        let storage = open_storage(&config).unwrap();

        let cli = TestCli::parse_from([
            "test",
            "--data",
            data.to_str().unwrap(),
            "--subject",
            "Hi {{name}}",
            "--body",
            body.to_str().unwrap(),
        ]);
        let session = cli.compose.build_session(&storage, &config).unwrap();

        assert_eq!(session.rows().len(), 1);
        assert_eq!(session.settings().webhook_url, "https://hook");
        assert_eq!(session.preview().unwrap().message.subject, "Hi Ann");
    }

    #[test]
    fn test_build_session_reports_import_error_in_locale() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("empty.csv");
        fs::write(&data, "name,email\n").unwrap();

        let config = Config {
            data_dir: dir.path().join("store"),
            store_kind: StoreKind::Json,
            language: Some(Locale::De),
            webhook_url: None,
            default_sender: None,
            webhook_timeout_secs: None,
            log_json: false,
        };
        let storage = open_storage(&config).unwrap();

        let cli = TestCli::parse_from(["test", "--data", data.to_str().unwrap()]);
        let err = cli.compose.build_session(&storage, &config).unwrap_err();
        assert!(err.to_string().ends_with("Die Datei enthält keine Daten"));
    }

    #[test]
    fn test_build_session_with_data_attachment() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("people.csv");
        let encoded = dir.path().join("note.b64");
        fs::write(&data, "name,email\nAnn,ann@x.com\n").unwrap();
        fs::write(&encoded, "data:text/plain;base64,aGVsbG8=\n").unwrap();

        let config = Config {
            data_dir: dir.path().join("store"),
            store_kind: StoreKind::Json,
            language: None,
            webhook_url: None,
            default_sender: None,
            webhook_timeout_secs: None,
            log_json: false,
        };
        let storage = open_storage(&config).unwrap();

        let attach = format!("note.txt={}", encoded.display());
        let cli = TestCli::parse_from(["test", "--data", data.to_str().unwrap(), "--attach-data", attach.as_str()]);
        let session = cli.compose.build_session(&storage, &config).unwrap();

        assert_eq!(session.attachments().len(), 1);
        assert_eq!(session.attachments()[0].filename, "note.txt");
        assert_eq!(session.attachments()[0].bytes(), b"hello");
    }
}
