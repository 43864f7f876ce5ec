//! Webhook dispatch.
//!
//! A whole batch goes out as one POST; the webhook does the actual delivery.
//!
//! ```text
//! BatchPayload → WebhookDispatcher::dispatch() → DispatchResult | DispatchError
//! ```

pub mod types;
pub mod webhook;

pub use types::{DispatchError, DispatchResult, MessageOutcome};
pub use webhook::{parse_results, WebhookDispatcher};
