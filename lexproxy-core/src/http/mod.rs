//! HTTP transport for upstream calls
//!
//! `HttpExecutor` posts a JSON body and hands back the status and raw body
//! text. Deciding what a status means is left to the gateway; this layer
//! only reports whether any response arrived.

pub mod client;
pub mod error;

pub use client::HttpClient;
pub use error::TransportError;

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use uuid::Uuid;

/// Per-call settings
#[derive(Debug, Clone)]
pub struct RequestOptions {
    /// Sent as `X-Request-ID` and attached to every log line of the call
    pub request_id: Uuid,
    pub timeout: Duration,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            request_id: Uuid::new_v4(),
            timeout: Duration::from_secs(60),
        }
    }
}

impl RequestOptions {
    /// Fresh request id, 60s timeout
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Status and body of a completed HTTP exchange, whatever the status
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Network seam of the gateway; tests substitute scripted transports
#[async_trait]
pub trait HttpExecutor: Send + Sync {
    /// POST a JSON body. Any HTTP status is `Ok`; `Err` means no response
    /// was received at all.
    async fn post_json(
        &self,
        url: &str,
        body: &Value,
        options: &RequestOptions,
    ) -> Result<RawResponse, TransportError>;
}
