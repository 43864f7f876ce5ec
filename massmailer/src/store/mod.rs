//! Persistent settings and templates.
//!
//! ```text
//! StorageService ──► KeyValueStore ─┬─► JsonFileStore  (<dir>/<key>.json)
//!                                   └─► SqliteStore    (<dir>/massmailer.db)
//! ```

pub mod kv;
pub mod service;

use thiserror::Error;

pub use kv::{JsonFileStore, KeyValueStore, SqliteStore, StoreKind};
pub use service::{ExportBundle, Settings, StorageService, Template};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("stored value for {key} is corrupt: {reason}")]
    Corrupt { key: String, reason: String },

    #[error("invalid import data: {0}")]
    InvalidImport(String),
}
