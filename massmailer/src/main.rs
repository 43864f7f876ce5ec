//! MassMailer - send a mail-merge batch to a delivery webhook.
//!
//! Loads recipients from a CSV or spreadsheet file, renders the template for
//! every row and posts the whole batch, attachments included, as one JSON
//! request. Also manages the saved settings and templates.

use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use massmailer::cli::{describe_import_error, format_preview, init_tracing, open_storage, ComposeArgs};
use massmailer::dispatch::DispatchError;
use massmailer::import::import_file;
use massmailer::{translate, Config, Locale, SendError, SendReport, Settings, StorageService, Template, WebhookDispatcher};

#[derive(Debug, Parser)]
#[command(name = "massmailer", version, about = "Mail-merge batches sent through a webhook")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Render every row and post the batch to the webhook
    Send {
        #[command(flatten)]
        compose: ComposeArgs,

        /// Send even when no row has a recipient
        #[arg(long)]
        allow_empty: bool,

        /// Print the payload instead of sending it
        #[arg(long)]
        dry_run: bool,
    },

    /// Show the rendered message for one row
    Preview {
        #[command(flatten)]
        compose: ComposeArgs,

        /// One-based row number
        #[arg(long, default_value_t = 1)]
        row: usize,
    },

    /// List the placeholders available in a data file
    Columns {
        /// CSV or spreadsheet file
        data: PathBuf,
    },

    /// Show or change the saved settings
    Settings {
        #[arg(long)]
        webhook_url: Option<String>,

        #[arg(long)]
        default_sender: Option<String>,

        /// Webhook timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Interface language (en, de)
        #[arg(long)]
        language: Option<String>,
    },

    /// Manage saved templates
    #[command(subcommand)]
    Templates(TemplateCommand),

    /// Write all settings and templates as JSON
    Export {
        /// Output file; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Replace settings and templates from an exported file
    Import {
        /// Exported JSON file; stdin when "-"
        input: PathBuf,
    },

    /// Delete all saved settings and templates
    Clear {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Debug, Subcommand)]
enum TemplateCommand {
    /// List saved templates
    List,

    /// Print a saved template
    Show { id: String },

    /// Save a new template, or update one when --id is given
    Save {
        #[arg(long)]
        id: Option<String>,

        #[arg(long)]
        name: String,

        #[arg(long, default_value = "")]
        subject: String,

        /// File containing the HTML body
        #[arg(long)]
        body: Option<PathBuf>,
    },

    /// Save a copy of a template under a new id
    Copy { id: String },

    /// Delete a template
    Delete { id: String },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let config = Config::from_env();
    init_tracing(config.log_json);

    info!(
        data_dir = %config.data_dir.display(),
        store = ?config.store_kind,
        webhook_override = config.webhook_url.is_some(),
        "config_loaded"
    );

    let storage = open_storage(&config)?;
    let locale = config.apply(storage.get_settings()).locale();

    match cli.command {
        Command::Send {
            compose,
            allow_empty,
            dry_run,
        } => send(&compose, &storage, &config, allow_empty, dry_run).await,
        Command::Preview { compose, row } => {
            let mut session = compose.build_session(&storage, &config)?;
            for _ in 1..row {
                if !session.next_preview() {
                    break;
                }
            }
            if let Some(preview) = session.preview() {
                print!("{}", format_preview(&preview, session.locale()));
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Columns { data: path } => {
            let data = match import_file(&path) {
                Ok(data) => data,
                Err(e) => bail!("{}: {}", path.display(), describe_import_error(&e, locale)),
            };
            println!("{}", translate("data_loaded", locale, &[&data.rows.len()]));
            println!("{}:", translate("available_placeholders", locale, &[]));
            for placeholder in data.columns.placeholders() {
                println!("  {}", placeholder);
            }
            if let Some(first) = data.rows.first() {
                println!();
                println!("{}:", translate("first_row", locale, &[]));
                for (column, value) in first.iter() {
                    println!("  {} = {}", column, value);
                }
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Settings {
            webhook_url,
            default_sender,
            timeout,
            language,
        } => {
            let mut settings = storage.get_settings();
            let changed = webhook_url.is_some()
                || default_sender.is_some()
                || timeout.is_some()
                || language.is_some();

            if let Some(url) = webhook_url {
                settings.webhook_url = url;
            }
            if let Some(sender) = default_sender {
                settings.default_sender = sender;
            }
            if let Some(secs) = timeout {
                settings.webhook_timeout = secs;
            }
            if let Some(language) = language {
                let Some(parsed) = Locale::parse(&language) else {
                    let available: Vec<&str> = Locale::ALL.iter().map(Locale::code).collect();
                    bail!(translate(
                        "unsupported_language",
                        locale,
                        &[&language, &available.join(", ")]
                    ));
                };
                settings.language = parsed.code().to_string();
            }

            if changed {
                storage
                    .save_settings(&settings)
                    .context(translate("settings_error", settings.locale(), &[]))?;
                println!("{}", translate("settings_saved", settings.locale(), &[]));
            }
            print_settings(&settings);
            Ok(ExitCode::SUCCESS)
        }
        Command::Templates(command) => templates(command, &storage, locale),
        Command::Export { output } => {
            let bundle = storage.export_data();
            let json = serde_json::to_string_pretty(&bundle).context(translate("export_error", locale, &[]))?;
            match output {
                Some(path) => {
                    fs::write(&path, json)
                        .with_context(|| format!("{}: {}", translate("export_error", locale, &[]), path.display()))?;
                    eprintln!("{}", translate("export_success", locale, &[]));
                }
                None => println!("{}", json),
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Import { input } => {
            let content = if input.as_os_str() == "-" {
                let mut buf = String::new();
                io::stdin().read_to_string(&mut buf).context("Failed to read stdin")?;
                buf
            } else {
                fs::read_to_string(&input).with_context(|| format!("Failed to read {}", input.display()))?
            };
            let value: serde_json::Value =
                serde_json::from_str(&content).context(translate("import_error", locale, &[]))?;
            storage
                .import_data(&value)
                .context(translate("import_error", locale, &[]))?;
            println!("{}", translate("import_success", locale, &[]));
            Ok(ExitCode::SUCCESS)
        }
        Command::Clear { yes } => {
            if !yes && !confirm(&translate("confirm_delete_data", locale, &[]))? {
                return Ok(ExitCode::SUCCESS);
            }
            storage
                .clear_all()
                .context(translate("delete_error", locale, &[]))?;
            println!("{}", translate("data_deleted", locale, &[]));
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn send(
    compose: &ComposeArgs,
    storage: &StorageService,
    config: &Config,
    allow_empty: bool,
    dry_run: bool,
) -> Result<ExitCode> {
    let session = compose.build_session(storage, config)?;
    let locale = session.locale();

    if dry_run {
        let assembly = session
            .assemble()
            .map_err(|e| anyhow::anyhow!(translate("conversion_error", locale, &[&e])))?;
        for skip in &assembly.skipped {
            eprintln!("{}", translate("no_email", locale, &[&skip.row_number()]));
        }
        println!("{}", serde_json::to_string_pretty(&assembly.payload)?);
        return Ok(ExitCode::SUCCESS);
    }

    let assembly = match session.prepare(allow_empty) {
        Ok(assembly) => assembly,
        Err(err) => {
            eprintln!("{}", describe_send_error(&err, locale));
            return Ok(ExitCode::FAILURE);
        }
    };

    let dispatcher = WebhookDispatcher::new().context("Failed to create HTTP client")?;
    println!(
        "{}",
        translate("sending", locale, &[&assembly.payload.messages.len()])
    );

    match session.dispatch(&dispatcher, assembly).await {
        Ok(report) => {
            print_report(&report, locale);
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            eprintln!("{}", describe_send_error(&err, locale));
            Ok(ExitCode::FAILURE)
        }
    }
}

fn print_report(report: &SendReport, locale: Locale) {
    for skip in &report.skipped {
        eprintln!("{}", translate("no_email", locale, &[&skip.row_number()]));
    }

    let seconds = format!("{:.2}", report.result.duration.as_secs_f64());
    println!("{}", translate("send_success", locale, &[&seconds]));

    if let Some(results) = &report.result.results {
        for (i, outcome) in results.iter().enumerate() {
            println!(
                "{}",
                translate("message_status", locale, &[&(i + 1), &outcome.label()])
            );
        }
    }
}

fn describe_send_error(err: &SendError, locale: Locale) -> String {
    match err {
        SendError::NoData => translate("no_csv", locale, &[]),
        SendError::NoWebhook => translate("no_webhook", locale, &[]),
        SendError::Empty { skipped } => {
            let mut lines: Vec<String> = skipped
                .iter()
                .map(|skip| translate("no_email", locale, &[&skip.row_number()]))
                .collect();
            lines.push(translate("no_messages", locale, &[]));
            lines.join("\n")
        }
        SendError::Conversion(e) => translate("conversion_error", locale, &[e]),
        SendError::Dispatch(DispatchError::Timeout(timeout)) => {
            translate("webhook_timeout", locale, &[&timeout.as_secs()])
        }
        SendError::Dispatch(DispatchError::Server {
            status,
            status_text,
            body,
        }) => {
            let summary = format!("{} {}", status, status_text);
            let mut message = translate("request_error", locale, &[&summary.trim()]);
            if !body.is_empty() {
                message.push_str(&format!("\n{}: {}", translate("details", locale, &[]), body));
            }
            message
        }
        SendError::Dispatch(e @ DispatchError::Network(_)) => {
            format!("{}: {}", translate("network_error", locale, &[]), e)
        }
        SendError::Dispatch(e) => translate("request_error", locale, &[e]),
    }
}

fn print_settings(settings: &Settings) {
    let locale = settings.locale();
    let none = translate("none", locale, &[]);
    let url = if settings.has_webhook() {
        settings.webhook_url.as_str()
    } else {
        none.as_str()
    };
    println!("webhookUrl:     {}", url);
    println!("defaultSender:  {}", settings.default_sender);
    println!("webhookTimeout: {}s", settings.timeout().as_secs());
    println!("language:       {} ({})", locale.code(), locale.display_name());
}

fn templates(command: TemplateCommand, storage: &StorageService, locale: Locale) -> Result<ExitCode> {
    match command {
        TemplateCommand::List => {
            for template in storage.get_templates() {
                let updated = template
                    .updated
                    .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_default();
                println!("{}\t{}\t{}", template.id, template.name, updated);
            }
        }
        TemplateCommand::Show { id } => {
            let template = storage
                .find_template(&id)
                .with_context(|| translate("template_not_found", locale, &[]))?;
            println!("{}: {}", translate("subject", locale, &[]), template.subject);
            println!();
            println!("{}", template.html);
        }
        TemplateCommand::Save {
            id,
            name,
            subject,
            body,
        } => {
            let html = match body {
                Some(path) => fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read body from {}", path.display()))?,
                None => String::new(),
            };
            let mut template = Template::new(name, subject, html);
            if let Some(id) = id {
                template.id = id;
            }
            let saved = storage
                .save_template(template)
                .context(translate("template_not_saved", locale, &[]))?;
            println!("{} ({})", translate("template_saved", locale, &[]), saved.id);
        }
        TemplateCommand::Copy { id } => {
            let template = storage
                .find_template(&id)
                .with_context(|| translate("template_not_found", locale, &[]))?;
            let copy = template.copy_named(&translate("copy", locale, &[]));
            let saved = storage
                .save_template(copy)
                .context(translate("template_not_saved", locale, &[]))?;
            println!("{} ({})", translate("template_copied", locale, &[&template.name]), saved.id);
        }
        TemplateCommand::Delete { id } => {
            let deleted = storage
                .delete_template(&id)
                .context(translate("template_delete_error", locale, &[]))?;
            if !deleted {
                eprintln!("{}", translate("template_not_found", locale, &[]));
                return Ok(ExitCode::FAILURE);
            }
            println!("{}", translate("template_deleted", locale, &[]));
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn confirm(question: &str) -> Result<bool> {
    print!("{} [y/N] ", question);
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes" | "j" | "ja"))
}
