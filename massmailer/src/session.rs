//! Working state of one mail-merge run.
//!
//! ```text
//! load_data ──► rows/columns ──► preview()/next/previous
//!                    │
//! template ──────────┼──► assemble() ──► send() ──► WebhookDispatcher
//! attachments ───────┘
//! ```

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

use crate::batch::{assemble, Assembly, Attachment, AttachmentError, ConversionError, SkipDiagnostic};
use crate::dispatch::{DispatchError, DispatchResult, WebhookDispatcher};
use crate::i18n::Locale;
use crate::import::{import_file, ColumnSet, DataSet, ImportError, RowRecord};
use crate::preview::{Preview, PreviewNavigator};
use crate::render::{referenced_fields, MessageTemplate};
use crate::store::Settings;

#[derive(Debug, Error)]
pub enum SendError {
    #[error("no data loaded")]
    NoData,

    #[error("no webhook URL configured")]
    NoWebhook,

    #[error("no row has a recipient")]
    Empty { skipped: Vec<SkipDiagnostic> },

    #[error(transparent)]
    Conversion(#[from] ConversionError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

/// What a successful send produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendReport {
    pub sent: usize,
    pub skipped: Vec<SkipDiagnostic>,
    pub result: DispatchResult,
}

/// An attachment path that was not added.
#[derive(Debug)]
pub struct RejectedAttachment {
    pub path: PathBuf,
    pub error: AttachmentError,
}

#[derive(Debug, Clone, Default)]
pub struct Session {
    data: DataSet,
    template: MessageTemplate,
    attachments: Vec<Attachment>,
    settings: Settings,
    navigator: PreviewNavigator,
}

impl Session {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    /// Replace the loaded rows and rewind the preview.
    pub fn load_data(&mut self, data: DataSet) {
        self.navigator.reset(data.rows.len());
        info!(rows = data.rows.len(), columns = data.columns.len(), "session_data_loaded");
        self.data = data;
    }

    /// Import a CSV or spreadsheet file. Returns the number of rows loaded.
    pub fn load_file(&mut self, path: &Path) -> Result<usize, ImportError> {
        let data = import_file(path)?;
        let rows = data.rows.len();
        self.load_data(data);
        Ok(rows)
    }

    pub fn rows(&self) -> &[RowRecord] {
        &self.data.rows
    }

    pub fn columns(&self) -> &ColumnSet {
        &self.data.columns
    }

    pub fn has_data(&self) -> bool {
        !self.data.rows.is_empty()
    }

    pub fn template(&self) -> &MessageTemplate {
        &self.template
    }

    pub fn set_template(&mut self, template: MessageTemplate) {
        self.template = template;
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: Settings) {
        self.settings = settings;
    }

    pub fn locale(&self) -> Locale {
        self.settings.locale()
    }

    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    pub fn add_attachment(&mut self, attachment: Attachment) {
        info!(
            filename = %attachment.filename,
            size_bytes = attachment.size_bytes,
            "session_attachment_added"
        );
        self.attachments.push(attachment);
    }

    /// Load each file as an attachment. Files that are too large or
    /// unreadable are skipped and returned; the rest are added.
    pub fn add_attachment_paths<P: AsRef<Path>>(&mut self, paths: &[P]) -> Vec<RejectedAttachment> {
        let mut rejected = Vec::new();

        for path in paths {
            let path = path.as_ref();
            match Attachment::from_path(path) {
                Ok(attachment) => self.add_attachment(attachment),
                Err(error) => {
                    warn!(path = %path.display(), error = %error, "session_attachment_skipped");
                    rejected.push(RejectedAttachment {
                        path: path.to_path_buf(),
                        error,
                    });
                }
            }
        }

        rejected
    }

    /// Add an attachment from a `data:` URL or bare base64 text.
    pub fn add_attachment_data(&mut self, filename: &str, data_url: &str) -> Result<(), AttachmentError> {
        let attachment = Attachment::from_data_url(filename, data_url)?;
        self.add_attachment(attachment);
        Ok(())
    }

    pub fn remove_attachment(&mut self, index: usize) -> Option<Attachment> {
        if index < self.attachments.len() {
            Some(self.attachments.remove(index))
        } else {
            None
        }
    }

    pub fn navigator(&self) -> &PreviewNavigator {
        &self.navigator
    }

    /// Render the row under the preview cursor.
    pub fn preview(&self) -> Option<Preview> {
        self.navigator
            .current(&self.data.rows, &self.template, &self.attachments)
    }

    pub fn next_preview(&mut self) -> bool {
        self.navigator.next()
    }

    pub fn previous_preview(&mut self) -> bool {
        self.navigator.previous()
    }

    pub fn assemble(&self) -> Result<Assembly, ConversionError> {
        assemble(
            &self.data.rows,
            &self.template,
            &self.attachments,
            &self.settings.default_sender,
        )
    }

    /// Check that the session can be sent and assemble the batch.
    ///
    /// An empty batch is refused unless `allow_empty` is set.
    pub fn prepare(&self, allow_empty: bool) -> Result<Assembly, SendError> {
        if !self.has_data() {
            return Err(SendError::NoData);
        }
        if !self.settings.has_webhook() {
            return Err(SendError::NoWebhook);
        }

        let assembly = self.assemble()?;

        if assembly.payload.messages.is_empty() && !allow_empty {
            warn!(skipped = assembly.skipped.len(), "session_send_refused_empty");
            return Err(SendError::Empty {
                skipped: assembly.skipped,
            });
        }

        Ok(assembly)
    }

    /// Dispatch a prepared batch to the configured webhook.
    pub async fn dispatch(
        &self,
        dispatcher: &WebhookDispatcher,
        assembly: Assembly,
    ) -> Result<SendReport, SendError> {
        let Assembly { payload, skipped } = assembly;
        let sent = payload.messages.len();
        let result = dispatcher
            .dispatch(&payload, &self.settings.webhook_url, self.settings.timeout())
            .await?;

        Ok(SendReport {
            sent,
            skipped,
            result,
        })
    }

    /// Prepare and dispatch the whole batch.
    pub async fn send(
        &self,
        dispatcher: &WebhookDispatcher,
        allow_empty: bool,
    ) -> Result<SendReport, SendError> {
        let assembly = self.prepare(allow_empty)?;
        self.dispatch(dispatcher, assembly).await
    }

    /// Placeholders in the subject or body that name no imported column.
    pub fn unknown_fields(&self) -> Vec<String> {
        let mut fields = referenced_fields(&self.template.subject);
        for field in referenced_fields(&self.template.body) {
            if !fields.contains(&field) {
                fields.push(field);
            }
        }
        fields.retain(|field| !self.data.columns.names().contains(field));
        fields
    }
}
