//! Outbound HTTP request headers.

/// User agent sent with webhook requests.
pub fn user_agent() -> String {
    format!("massmailer/{}", env!("CARGO_PKG_VERSION"))
}

/// Build standard headers for webhook requests.
pub fn build_headers(user_agent: &str) -> Vec<(String, String)> {
    vec![
        ("User-Agent".to_string(), user_agent.to_string()),
        ("Accept".to_string(), "application/json, text/plain, */*".to_string()),
        ("Content-Type".to_string(), "application/json".to_string()),
    ]
}
