//! Delimited-text (CSV) import.

use csv::ReaderBuilder;
use tracing::{debug, warn};

use super::types::{ColumnSet, DataSet, RowRecord};
use super::ImportError;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Field separators recognised in the header line, in tie-break order.
const DELIMITERS: [u8; 4] = [b',', b';', b'\t', b'|'];

/// Parse CSV bytes with the first row as field names.
///
/// The separator is detected from the header line. Cells that are not valid
/// UTF-8 are decoded lossily. Blank lines and rows whose cells are all empty
/// are skipped. Row-level problems do not stop the parse: every diagnostic is
/// collected and reported together as [`ImportError::MalformedRows`].
pub fn parse_delimited(bytes: &[u8]) -> Result<DataSet, ImportError> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let delimiter = detect_delimiter(bytes);

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .delimiter(delimiter)
        .from_reader(bytes);

    let headers = reader
        .byte_headers()
        .map_err(|e| ImportError::MalformedRows(vec![e.to_string()]))?
        .clone();
    let columns = ColumnSet::from_headers(headers.iter().map(decode_cell));

    debug!(
        delimiter = %char::from(delimiter).escape_default(),
        columns = columns.len(),
        "csv_headers_read"
    );

    let mut rows = Vec::new();
    let mut issues = Vec::new();

    for (idx, record) in reader.byte_records().enumerate() {
        match record {
            Ok(record) => {
                if record.iter().all(|cell| cell.is_empty()) {
                    debug!(record_index = idx, "csv_blank_row_skipped");
                    continue;
                }
                rows.push(RowRecord::from_pairs(
                    columns.names().iter().cloned().zip(record.iter().map(decode_cell)),
                ));
            }
            Err(e) => {
                warn!(record_index = idx, error = %e, "csv_row_malformed");
                issues.push(e.to_string());
            }
        }
    }

    if !issues.is_empty() {
        return Err(ImportError::MalformedRows(issues));
    }

    if rows.is_empty() {
        return Err(ImportError::NoData);
    }

    Ok(DataSet { columns, rows })
}

fn decode_cell(cell: &[u8]) -> String {
    String::from_utf8_lossy(cell).into_owned()
}

/// Most frequent separator outside quotes on the header line; `,` when the
/// line has none.
fn detect_delimiter(bytes: &[u8]) -> u8 {
    let mut counts = [0usize; DELIMITERS.len()];
    let mut in_quotes = false;

    for &b in bytes {
        match b {
            b'"' => in_quotes = !in_quotes,
            b'\n' | b'\r' if !in_quotes => break,
            _ if !in_quotes => {
                if let Some(pos) = DELIMITERS.iter().position(|&d| d == b) {
                    counts[pos] += 1;
                }
            }
            _ => {}
        }
    }

    let mut best = 0;
    for (pos, &count) in counts.iter().enumerate() {
        if count > counts[best] {
            best = pos;
        }
    }
    DELIMITERS[best]
}
