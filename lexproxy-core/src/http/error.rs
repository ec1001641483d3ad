//! HTTP error mapping utilities

use serde_json::Value;
use thiserror::Error;

/// Failure to obtain any HTTP response from the upstream
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Request did not complete within its timeout
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// DNS, TCP or TLS connection failure
    #[error("Connection failed: {0}")]
    Connect(String),

    /// Response body exceeded the configured cap
    #[error("Response too large: {size} bytes exceeds maximum {max}")]
    ResponseTooLarge { size: usize, max: usize },

    /// Any other failure while sending or reading the body
    #[error("Network error: {0}")]
    Network(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        let timeout = err.is_timeout();
        let connect = err.is_connect();
        // The request URL carries the API key in its query string
        let message = err.without_url().to_string();

        if timeout {
            TransportError::Timeout(message)
        } else if connect {
            TransportError::Connect(message)
        } else {
            TransportError::Network(message)
        }
    }
}

/// Pull a human-readable message out of an upstream error body for logging.
/// The body itself is what callers receive; this only shortens log lines.
pub fn summarize_error_body(body: &str) -> String {
    let extracted = serde_json::from_str::<Value>(body).ok().and_then(|json| {
        // Google format: { "error": { "code": 404, "message": "...", "status": "NOT_FOUND" } }
        if let Some(error) = json.get("error") {
            if let Some(message) = error.get("message").and_then(|v| v.as_str()) {
                return Some(match error.get("status").and_then(|v| v.as_str()) {
                    Some(status) => format!("{}: {}", status, message),
                    None => message.to_string(),
                });
            }
            if let Some(message) = error.as_str() {
                return Some(message.to_string());
            }
        }
        json.get("message")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
    });

    let summary = extracted.unwrap_or_else(|| body.trim().to_string());
    truncate(&summary, 200)
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summarize_google_error() {
        let body = r#"{"error":{"code":404,"message":"models/gemini-pro is not found for API version v1beta","status":"NOT_FOUND"}}"#;
        assert_eq!(
            summarize_error_body(body),
            "NOT_FOUND: models/gemini-pro is not found for API version v1beta"
        );
    }

    #[test]
    fn test_summarize_plain_text() {
        assert_eq!(summarize_error_body("  Bad Gateway\n"), "Bad Gateway");
        assert_eq!(summarize_error_body(r#"{"message":"quota"}"#), "quota");
        assert_eq!(summarize_error_body(r#"{"error":"nope"}"#), "nope");
    }

    #[test]
    fn test_summary_truncated() {
        let body = "x".repeat(500);
        let summary = summarize_error_body(&body);
        assert_eq!(summary.len(), 203);
        assert!(summary.ends_with("..."));
    }
}
