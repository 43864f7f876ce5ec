//! MassMailer - mail-merge batch preparation and webhook dispatch.
//!
//! This library provides shared modules for the two binaries:
//! - `massmailer`: Send batches and manage settings/templates
//! - `massmailer-preview`: Page through rendered messages one row at a time
//!
//! ## Architecture
//!
//! ```text
//! CSV/XLSX → import → rows ─┬─► preview (one row, on demand)
//!                           └─► batch::assemble → dispatch → webhook
//! ```

pub mod batch;
pub mod cli;
pub mod config;
pub mod dispatch;
pub mod i18n;
pub mod import;
pub mod preview;
pub mod render;
pub mod session;
pub mod store;
pub mod util;

// Re-export commonly used types
pub use batch::{assemble, Assembly, Attachment, BatchPayload, ConversionError};
pub use config::Config;
pub use dispatch::{DispatchError, DispatchResult, WebhookDispatcher};
pub use i18n::{translate, Locale};
pub use import::{import_file, ColumnSet, DataSet, ImportError, RowRecord};
pub use preview::{Preview, PreviewNavigator};
pub use render::{render_message, MessageTemplate, RenderedMessage};
pub use session::{SendError, SendReport, Session};
pub use store::{Settings, StorageService, Template};
