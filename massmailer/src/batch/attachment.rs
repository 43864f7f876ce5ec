//! Batch-global attachments.
//!
//! An attachment is loaded once and shared by every message of a batch; its
//! bytes sit behind an `Arc` so cloning a session or preview never copies them.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use thiserror::Error;
use tracing::{info, warn};

use super::types::EncodedAttachment;
use crate::util::{format_file_size, mime_hint};

/// Per-file size cap (10 MiB). Larger files are skipped.
pub const MAX_ATTACHMENT_BYTES: u64 = 10 * 1024 * 1024;

/// Attachment content that cannot be turned into bytes for the payload.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConversionError {
    #[error("attachment has no file name")]
    MissingFilename,

    #[error("attachment {filename} is not valid base64: {reason}")]
    InvalidBase64 { filename: String, reason: String },
}

/// Reasons an attachment is not added to the batch.
#[derive(Debug, Error)]
pub enum AttachmentError {
    #[error("file {filename} is larger than 10 MB ({size_bytes} bytes)")]
    TooLarge { filename: String, size_bytes: u64 },

    #[error("could not read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Conversion(#[from] ConversionError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub filename: String,
    pub mime_hint: String,
    pub size_bytes: u64,
    bytes: Arc<[u8]>,
}

impl Attachment {
    /// Wrap raw bytes, enforcing the size cap.
    pub fn from_bytes(filename: impl Into<String>, bytes: Vec<u8>) -> Result<Self, AttachmentError> {
        let filename = filename.into();
        let size_bytes = bytes.len() as u64;
        if size_bytes > MAX_ATTACHMENT_BYTES {
            return Err(AttachmentError::TooLarge { filename, size_bytes });
        }

        Ok(Self {
            mime_hint: mime_hint(&filename),
            filename,
            size_bytes,
            bytes: Arc::from(bytes),
        })
    }

    /// Load a file from disk. The size is checked before the file is read.
    pub fn from_path(path: &Path) -> Result<Self, AttachmentError> {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let io_err = |source| AttachmentError::Io {
            path: path.to_path_buf(),
            source,
        };

        let size_bytes = std::fs::metadata(path).map_err(io_err)?.len();
        if size_bytes > MAX_ATTACHMENT_BYTES {
            warn!(
                filename = %filename,
                size_bytes = size_bytes,
                limit_bytes = MAX_ATTACHMENT_BYTES,
                "attachment_too_large"
            );
            return Err(AttachmentError::TooLarge { filename, size_bytes });
        }

        let bytes = std::fs::read(path).map_err(io_err)?;
        let attachment = Self::from_bytes(filename, bytes)?;

        info!(
            filename = %attachment.filename,
            mime_hint = %attachment.mime_hint,
            size_bytes = attachment.size_bytes,
            "attachment_loaded"
        );

        Ok(attachment)
    }

    /// Decode a `data:<mime>;base64,<payload>` URL or a bare base64 string.
    ///
    /// Whitespace inside the payload is ignored. A MIME type in the URL header
    /// takes precedence over the one guessed from the file name.
    pub fn from_data_url(filename: impl Into<String>, data_url: &str) -> Result<Self, AttachmentError> {
        let filename = filename.into();
        if filename.trim().is_empty() {
            return Err(ConversionError::MissingFilename.into());
        }

        let (header, payload) = match data_url.find("base64,") {
            Some(idx) => (&data_url[..idx], &data_url[idx + "base64,".len()..]),
            None => ("", data_url),
        };

        let cleaned: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
        let bytes = STANDARD
            .decode(cleaned.as_bytes())
            .map_err(|e| ConversionError::InvalidBase64 {
                filename: filename.clone(),
                reason: e.to_string(),
            })?;

        let mut attachment = Self::from_bytes(filename, bytes)?;

        let declared = header
            .strip_prefix("data:")
            .map(|h| h.trim_end_matches(';'))
            .filter(|h| !h.is_empty());
        if let Some(mime) = declared {
            attachment.mime_hint = mime.to_string();
        }

        Ok(attachment)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// `"name (1.2 KB)"`, as listed in previews.
    pub fn summary(&self) -> String {
        format!("{} ({})", self.filename, format_file_size(self.size_bytes))
    }

    /// Wire form: bare file name plus the raw bytes.
    pub fn encode(&self) -> Result<EncodedAttachment, ConversionError> {
        let filename = strip_path(&self.filename);
        if filename.is_empty() {
            return Err(ConversionError::MissingFilename);
        }

        Ok(EncodedAttachment {
            filename: filename.to_string(),
            data: self.bytes.to_vec(),
        })
    }
}

/// Drop any `/` or `\` separated directory components.
fn strip_path(name: &str) -> &str {
    name.rsplit(&['/', '\\'][..]).next().unwrap_or(name).trim()
}
