//! Human-readable sizes and MIME hints.

use std::path::Path;

/// Format a byte count as `B`, `KB` or `MB` with one decimal.
pub fn format_file_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

/// MIME type guessed from a file name, `application/octet-stream` if unknown.
pub fn mime_hint(filename: &str) -> String {
    mime_guess::from_path(Path::new(filename))
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}
