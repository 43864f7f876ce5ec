//! Webhook response types.

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// Per-message outcome reported by the webhook.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MessageOutcome {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

impl MessageOutcome {
    /// The webhook's message, or `OK` / `Error` when it sent none.
    pub fn label(&self) -> &str {
        match self.message.as_deref() {
            Some(message) if !message.is_empty() => message,
            _ if self.success => "OK",
            _ => "Error",
        }
    }
}

/// Optional structured body of a successful webhook response.
#[derive(Debug, Deserialize)]
pub(crate) struct ResultsBody {
    pub results: Vec<MessageOutcome>,
}

/// A batch the webhook accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchResult {
    /// Time from sending the request to reading the response body.
    pub duration: Duration,
    /// Per-message outcomes, when the webhook reported them.
    pub results: Option<Vec<MessageOutcome>>,
}

impl DispatchResult {
    /// Number of reported failures; zero without per-message detail.
    pub fn failed_count(&self) -> usize {
        self.results
            .as_ref()
            .map(|r| r.iter().filter(|o| !o.success).count())
            .unwrap_or(0)
    }
}

/// Reasons a dispatch failed. A single attempt is made; no retries.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("invalid webhook URL: {0}")]
    InvalidUrl(String),

    #[error("could not encode payload: {0}")]
    Encode(String),

    #[error("webhook did not respond within {} seconds", .0.as_secs_f64())]
    Timeout(Duration),

    #[error("network error: {0}")]
    Network(String),

    #[error("webhook returned {status} {status_text}")]
    Server {
        status: u16,
        status_text: String,
        body: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_label() {
        let ok = MessageOutcome { success: true, message: None };
        let failed = MessageOutcome { success: false, message: Some(String::new()) };
        let detailed = MessageOutcome { success: false, message: Some("bounced".into()) };

        assert_eq!(ok.label(), "OK");
        assert_eq!(failed.label(), "Error");
        assert_eq!(detailed.label(), "bounced");
    }

    #[test]
    fn test_results_body_parsing() {
        let body: ResultsBody = serde_json::from_str(
            r#"{"results": [{"success": true, "message": "sent"}, {"success": false}]}"#,
        )
        .unwrap();

        assert_eq!(body.results.len(), 2);
        assert_eq!(body.results[0].message.as_deref(), Some("sent"));
        assert!(!body.results[1].success);
    }

    #[test]
    fn test_failed_count() {
        let result = DispatchResult {
            duration: Duration::from_millis(10),
            results: Some(vec![
                MessageOutcome { success: true, message: None },
                MessageOutcome { success: false, message: None },
            ]),
        };
        assert_eq!(result.failed_count(), 1);

        let bare = DispatchResult { duration: Duration::ZERO, results: None };
        assert_eq!(bare.failed_count(), 0);
    }

    #[test]
    fn test_timeout_message() {
        let err = DispatchError::Timeout(Duration::from_secs(30));
        assert_eq!(err.to_string(), "webhook did not respond within 30 seconds");
    }
}
