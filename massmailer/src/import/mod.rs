//! Tabular recipient import.
//!
//! Turns uploaded CSV or spreadsheet bytes into a [`DataSet`]:
//!
//! ```text
//! file bytes + FileKind → import_bytes() → DataSet { columns, rows }
//! ```
//!
//! An import either yields every row or fails as a whole; callers never see a
//! partially populated data set.

pub mod delimited;
pub mod spreadsheet;
pub mod types;

use std::path::Path;

use thiserror::Error;
use tracing::info;

pub use delimited::parse_delimited;
pub use spreadsheet::parse_spreadsheet;
pub use types::{ColumnSet, DataSet, RowRecord};

/// Reasons an import is rejected.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("the file contains no data")]
    NoData,

    #[error("malformed rows: {}", .0.join(", "))]
    MalformedRows(Vec<String>),

    #[error("no valid column headers found")]
    NoHeaders,

    #[error("unsupported file type: {0}")]
    UnsupportedFormat(String),

    #[error("could not read workbook: {0}")]
    Workbook(String),

    #[error("could not read file: {0}")]
    Io(#[from] std::io::Error),
}

/// Declared kind of an uploaded data file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Delimited,
    Spreadsheet,
}

impl FileKind {
    /// Infer the kind from a file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Result<Self, ImportError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "csv" => Ok(FileKind::Delimited),
            "xlsx" | "xls" | "xlsm" | "ods" => Ok(FileKind::Spreadsheet),
            _ => Err(ImportError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Parse raw bytes of the given kind.
pub fn import_bytes(bytes: &[u8], kind: FileKind) -> Result<DataSet, ImportError> {
    let data = match kind {
        FileKind::Delimited => parse_delimited(bytes)?,
        FileKind::Spreadsheet => parse_spreadsheet(bytes)?,
    };

    info!(
        kind = ?kind,
        columns = data.columns.len(),
        rows = data.rows.len(),
        "import_complete"
    );

    Ok(data)
}

/// Read a data file from disk and parse it according to its extension.
pub fn import_file(path: &Path) -> Result<DataSet, ImportError> {
    let kind = FileKind::from_path(path)?;
    let bytes = std::fs::read(path)?;

    info!(
        path = %path.display(),
        size_bytes = bytes.len(),
        "import_file_read"
    );

    import_bytes(&bytes, kind)
}
