//! Payload types sent to the delivery webhook.

use serde::Serialize;

use crate::render::RenderedMessage;

/// Attachment in wire form: bare file name and its bytes as a number array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EncodedAttachment {
    pub filename: String,
    pub data: Vec<u8>,
}

/// The single request body for a whole batch.
///
/// Attachments are listed once for the batch, never per message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchPayload {
    pub messages: Vec<RenderedMessage>,
    pub attachments: Vec<EncodedAttachment>,
    pub default_sender: String,
}

/// Why a row contributed no message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NoRecipient,
}

/// A row left out of the batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkipDiagnostic {
    /// Zero-based index into the imported rows.
    pub row_index: usize,
    pub reason: SkipReason,
}

impl SkipDiagnostic {
    /// One-based row number, as shown to users.
    pub fn row_number(&self) -> usize {
        self.row_index + 1
    }
}

/// Output of the assembler: the payload plus rows that were skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assembly {
    pub payload: BatchPayload,
    pub skipped: Vec<SkipDiagnostic>,
}
