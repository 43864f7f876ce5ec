//! Small shared helpers.

pub mod format;
pub mod http;

pub use format::{format_file_size, mime_hint};
pub use http::{build_headers, user_agent};
