//! Spreadsheet (xlsx/xls/ods) import. Only the first sheet is read.

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use tracing::{debug, info};

use super::types::{ColumnSet, DataSet, RowRecord};
use super::ImportError;

/// Parse workbook bytes, using the first row of the first sheet as headers.
pub fn parse_spreadsheet(bytes: &[u8]) -> Result<DataSet, ImportError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| ImportError::Workbook(e.to_string()))?;

    let sheet_names = workbook.sheet_names();
    info!(
        sheet_count = sheet_names.len(),
        first_sheet = ?sheet_names.first(),
        "spreadsheet_opened"
    );

    let range = match workbook.worksheet_range_at(0) {
        Some(Ok(range)) => range,
        Some(Err(e)) => return Err(ImportError::Workbook(e.to_string())),
        None => return Err(ImportError::NoData),
    };

    range_to_dataset(&range)
}

/// Convert a sheet range into rows keyed by the header row.
///
/// Columns with a blank header cell are dropped. Empty cells are left out of
/// the row record, and rows with no values at all are skipped. A range that
/// starts below the first sheet row has a blank header row.
pub fn range_to_dataset(range: &Range<Data>) -> Result<DataSet, ImportError> {
    if let Some((start_row, _)) = range.start() {
        if start_row > 0 {
            return Err(ImportError::NoHeaders);
        }
    }

    let mut rows_iter = range.rows();

    let header_row = rows_iter.next().ok_or(ImportError::NoData)?;

    let header_cells: Vec<(usize, String)> = header_row
        .iter()
        .enumerate()
        .map(|(idx, cell)| (idx, cell_to_string(cell).trim().to_string()))
        .filter(|(_, name)| !name.is_empty())
        .collect();

    if header_cells.is_empty() {
        return Err(ImportError::NoHeaders);
    }

    let columns = ColumnSet::from_headers(header_cells.iter().map(|(_, name)| name.clone()));

    let mut rows = Vec::new();
    for (row_idx, row) in rows_iter.enumerate() {
        let pairs: Vec<(String, String)> = header_cells
            .iter()
            .zip(columns.names())
            .filter_map(|((col_idx, _), column)| {
                let value = row.get(*col_idx).map(cell_to_string).unwrap_or_default();
                (!value.is_empty()).then(|| (column.clone(), value))
            })
            .collect();

        if pairs.is_empty() {
            debug!(row_index = row_idx + 1, "spreadsheet_blank_row_skipped");
            continue;
        }
        rows.push(RowRecord::from_pairs(pairs));
    }

    if rows.is_empty() {
        return Err(ImportError::NoData);
    }

    Ok(DataSet { columns, rows })
}

/// Render a cell the way it reads in the sheet.
fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet(cells: &[&[&str]]) -> Range<Data> {
        let height = cells.len() as u32;
        let width = cells.iter().map(|r| r.len()).max().unwrap_or(1) as u32;
        let mut range = Range::new((0, 0), (height - 1, width - 1));
        for (r, row) in cells.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                if !value.is_empty() {
                    range.set_value((r as u32, c as u32), Data::String(value.to_string()));
                }
            }
        }
        range
    }

    #[test]
    fn test_first_row_is_header() {
        let range = sheet(&[
            &["name", "Email"],
            &["Ann", "ann@x.com"],
            &["Bob", "bob@x.com"],
        ]);

        let data = range_to_dataset(&range).unwrap();
        assert_eq!(data.columns.names(), &["name", "Email"]);
        assert_eq!(data.rows.len(), 2);
        assert_eq!(data.rows[1].get("Email"), Some("bob@x.com"));
    }

    #[test]
    fn test_empty_header_row() {
        let range = sheet(&[&["", ""], &["Ann", "ann@x.com"]]);
        assert!(matches!(range_to_dataset(&range), Err(ImportError::NoHeaders)));
    }

    #[test]
    fn test_header_without_rows() {
        let range = sheet(&[&["name", "email"]]);
        assert!(matches!(range_to_dataset(&range), Err(ImportError::NoData)));
    }

    #[test]
    fn test_blank_rows_and_cells() {
        let range = sheet(&[
            &["name", "email"],
            &["", ""],
            &["Bob", ""],
        ]);

        let data = range_to_dataset(&range).unwrap();
        assert_eq!(data.rows.len(), 1);
        assert_eq!(data.rows[0].get("name"), Some("Bob"));
        assert_eq!(data.rows[0].get("email"), None);
    }

    #[test]
    fn test_numeric_cells() {
        let mut range = Range::new((0, 0), (1, 2));
        range.set_value((0, 0), Data::String("id".into()));
        range.set_value((0, 1), Data::String("price".into()));
        range.set_value((0, 2), Data::String("count".into()));
        range.set_value((1, 0), Data::Float(42.0));
        range.set_value((1, 1), Data::Float(9.5));
        range.set_value((1, 2), Data::Int(3));

        let data = range_to_dataset(&range).unwrap();
        assert_eq!(data.rows[0].get("id"), Some("42"));
        assert_eq!(data.rows[0].get("price"), Some("9.5"));
        assert_eq!(data.rows[0].get("count"), Some("3"));
    }

    #[test]
    fn test_header_row_below_first_sheet_row() {
        let mut range = Range::new((1, 0), (2, 1));
        range.set_value((1, 0), Data::String("Ann".into()));
        range.set_value((2, 0), Data::String("Bob".into()));
        assert!(matches!(range_to_dataset(&range), Err(ImportError::NoHeaders)));
    }

    #[test]
    fn test_workbook_reads_first_sheet_only() {
        let bytes = include_bytes!(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/two_sheets.xlsx"));
        let data = parse_spreadsheet(bytes).unwrap();

        assert_eq!(data.columns.names(), &["name", "Email", "id"]);
        assert_eq!(data.rows.len(), 2);
        assert_eq!(data.rows[0].get("Email"), Some("ann@x.com"));
        assert_eq!(data.rows[0].get("id"), Some("42"));
        assert_eq!(data.rows[1].get("name"), Some("Bob"));
        assert!(data.rows.iter().all(|row| row.get("sku").is_none()));
    }

    #[test]
    fn test_workbook_with_blank_header_row() {
        let bytes = include_bytes!(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/blank_header.xlsx"));
        assert!(matches!(parse_spreadsheet(bytes), Err(ImportError::NoHeaders)));
    }

    #[test]
    fn test_garbage_bytes_are_workbook_error() {
        assert!(matches!(
            parse_spreadsheet(b"definitely not a workbook"),
            Err(ImportError::Workbook(_))
        ));
    }
}
