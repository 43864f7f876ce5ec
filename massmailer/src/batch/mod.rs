//! Batch assembly for the delivery webhook.
//!
//! ```text
//! rows + MessageTemplate + attachments → assemble() → Assembly { payload, skipped }
//! ```

pub mod assembler;
pub mod attachment;
pub mod types;

pub use assembler::assemble;
pub use attachment::{Attachment, AttachmentError, ConversionError, MAX_ATTACHMENT_BYTES};
pub use types::{Assembly, BatchPayload, EncodedAttachment, SkipDiagnostic, SkipReason};
