//! Batch assembly: every row rendered, attachments encoded once.

use tracing::{info, warn};

use super::attachment::{Attachment, ConversionError};
use super::types::{Assembly, BatchPayload, SkipDiagnostic, SkipReason};
use crate::import::RowRecord;
use crate::render::{render_message, MessageTemplate};

/// Build the outbound payload for all rows.
///
/// Rows without a recipient are skipped and reported, never fatal. An empty
/// message list is still a valid payload; deciding whether to send it is up to
/// the caller.
pub fn assemble(
    rows: &[RowRecord],
    template: &MessageTemplate,
    attachments: &[Attachment],
    default_sender: &str,
) -> Result<Assembly, ConversionError> {
    info!(
        rows = rows.len(),
        attachments = attachments.len(),
        plain_text = template.plain_text,
        "batch_assemble_start"
    );

    let mut messages = Vec::with_capacity(rows.len());
    let mut skipped = Vec::new();

    for (row_index, row) in rows.iter().enumerate() {
        match render_message(template, row) {
            Some(message) => messages.push(message),
            None => {
                warn!(row_number = row_index + 1, "batch_row_no_recipient");
                skipped.push(SkipDiagnostic {
                    row_index,
                    reason: SkipReason::NoRecipient,
                });
            }
        }
    }

    let encoded = attachments
        .iter()
        .map(Attachment::encode)
        .collect::<Result<Vec<_>, _>>()?;

    info!(
        messages = messages.len(),
        skipped = skipped.len(),
        attachments = encoded.len(),
        attachment_bytes = encoded.iter().map(|a| a.data.len()).sum::<usize>(),
        "batch_assemble_complete"
    );

    Ok(Assembly {
        payload: BatchPayload {
            messages,
            attachments: encoded,
            default_sender: default_sender.to_string(),
        },
        skipped,
    })
}
