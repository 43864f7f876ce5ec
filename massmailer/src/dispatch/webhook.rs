//! Sending an assembled batch to the delivery webhook.

use std::time::{Duration, Instant};

use reqwest::Client;
use tracing::{error, info, warn};
use url::Url;

use super::types::{DispatchError, DispatchResult, MessageOutcome, ResultsBody};
use crate::batch::BatchPayload;
use crate::util::{build_headers, user_agent};

/// Posts batches to a webhook with a shared HTTP client.
#[derive(Debug, Clone)]
pub struct WebhookDispatcher {
    client: Client,
    headers: Vec<(String, String)>,
}

impl WebhookDispatcher {
    /// Create a dispatcher with its own HTTP client.
    pub fn new() -> Result<Self, DispatchError> {
        let client = Client::builder()
            .build()
            .map_err(|e| DispatchError::Network(format!("failed to create HTTP client: {}", e)))?;
        Ok(Self::with_client(client))
    }

    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            headers: build_headers(&user_agent()),
        }
    }

    /// Send the whole batch as one JSON POST.
    ///
    /// The timeout covers the request and reading the response body. Expiry is
    /// reported as [`DispatchError::Timeout`], distinct from other network
    /// failures. Non-2xx responses carry status, reason phrase and body; a body
    /// that cannot be read is reported as empty.
    pub async fn dispatch(
        &self,
        payload: &BatchPayload,
        url: &str,
        timeout: Duration,
    ) -> Result<DispatchResult, DispatchError> {
        let url = validate_url(url)?;
        let body = serde_json::to_vec(payload).map_err(|e| DispatchError::Encode(e.to_string()))?;

        info!(
            url = %url,
            messages = payload.messages.len(),
            attachments = payload.attachments.len(),
            body_bytes = body.len(),
            timeout_seconds = timeout.as_secs_f64(),
            "webhook_dispatch_starting"
        );

        let mut request = self.client.post(url).timeout(timeout).body(body);
        for (key, value) in &self.headers {
            request = request.header(key.as_str(), value.as_str());
        }

        let started = Instant::now();
        let response = request
            .send()
            .await
            .map_err(|e| classify_error(e, timeout))?;

        let status = response.status();

        if !status.is_success() {
            let status_text = status.canonical_reason().unwrap_or_default().to_string();
            let body = response.text().await.unwrap_or_default();

            error!(
                status_code = status.as_u16(),
                status_text = %status_text,
                body_length = body.len(),
                "webhook_dispatch_rejected"
            );

            return Err(DispatchError::Server {
                status: status.as_u16(),
                status_text,
                body,
            });
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) if e.is_timeout() => return Err(classify_error(e, timeout)),
            Err(e) => {
                warn!(error = %e, "webhook_response_body_unreadable");
                String::new()
            }
        };

        let results = parse_results(&body);
        let duration = started.elapsed();

        info!(
            status_code = status.as_u16(),
            duration_seconds = duration.as_secs_f64(),
            has_results = results.is_some(),
            result_count = results.as_ref().map(|r| r.len()).unwrap_or(0),
            "webhook_dispatch_complete"
        );

        Ok(DispatchResult { duration, results })
    }
}

/// Per-message outcomes from a response body, if it has a `results` array.
pub fn parse_results(body: &str) -> Option<Vec<MessageOutcome>> {
    serde_json::from_str::<ResultsBody>(body)
        .ok()
        .map(|parsed| parsed.results)
}

fn validate_url(raw: &str) -> Result<Url, DispatchError> {
    let url = Url::parse(raw.trim()).map_err(|e| DispatchError::InvalidUrl(format!("{}: {}", raw, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(DispatchError::InvalidUrl(format!(
            "{}: unsupported scheme {}",
            raw, other
        ))),
    }
}

fn classify_error(e: reqwest::Error, timeout: Duration) -> DispatchError {
    if e.is_timeout() {
        error!(
            timeout_seconds = timeout.as_secs_f64(),
            error = %e,
            "webhook_dispatch_timeout"
        );
        DispatchError::Timeout(timeout)
    } else {
        error!(error = %e, "webhook_dispatch_network_error");
        DispatchError::Network(e.to_string())
    }
}
