//! HTTP client implementation using reqwest

use crate::config::{redact_url_key, UpstreamConfig};
use crate::http::{HttpExecutor, RawResponse, RequestOptions, TransportError};
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Maximum response size (10MB)
const MAX_RESPONSE_SIZE: usize = 10 * 1024 * 1024;

/// Default user agent
const USER_AGENT: &str = concat!("lexproxy/", env!("CARGO_PKG_VERSION"));

/// Shared HTTP client with connection pooling
#[derive(Clone)]
pub struct HttpClient {
    /// The underlying reqwest client
    client: Arc<Client>,

    /// Maximum response size to prevent OOM
    max_response_size: usize,
}

impl HttpClient {
    /// Create a new HTTP client with default settings
    pub fn new() -> Result<Self, TransportError> {
        Self::with_config(Duration::from_secs(10), Duration::from_secs(60), 10)
    }

    /// Create a client using the timeouts of the upstream configuration
    pub fn for_upstream(upstream: &UpstreamConfig) -> Result<Self, TransportError> {
        Self::with_config(upstream.connect_timeout(), upstream.request_timeout(), 10)
    }

    /// Create a new HTTP client with custom configuration
    pub fn with_config(
        connect_timeout: Duration,
        request_timeout: Duration,
        max_idle_per_host: usize,
    ) -> Result<Self, TransportError> {
        let client = ClientBuilder::new()
            .pool_max_idle_per_host(max_idle_per_host)
            .pool_idle_timeout(Duration::from_secs(90))
            .connect_timeout(connect_timeout)
            .timeout(request_timeout)
            .user_agent(USER_AGENT)
            .gzip(true)
            .build()?;

        Ok(Self {
            client: Arc::new(client),
            max_response_size: MAX_RESPONSE_SIZE,
        })
    }

    /// Override the response size cap
    pub fn with_max_response_size(mut self, max_response_size: usize) -> Self {
        self.max_response_size = max_response_size;
        self
    }
}

#[async_trait]
impl HttpExecutor for HttpClient {
    async fn post_json(
        &self,
        url: &str,
        body: &Value,
        options: &RequestOptions,
    ) -> Result<RawResponse, TransportError> {
        let request_id = options.request_id;
        debug!("POST {} [request_id: {}]", redact_url_key(url), request_id);

        let response = self
            .client
            .post(url)
            .timeout(options.timeout)
            .header("X-Request-ID", request_id.to_string())
            .json(body)
            .send()
            .await
            .map_err(|e| {
                let err = TransportError::from(e);
                match &err {
                    TransportError::Timeout(_) => {
                        warn!("Upstream timeout [request_id: {}]", request_id)
                    }
                    _ => error!("Upstream request error [request_id: {}]: {}", request_id, err),
                }
                err
            })?;

        let status = response.status().as_u16();
        debug!("Response status: {} [request_id: {}]", status, request_id);

        if let Some(content_length) = response.content_length() {
            if content_length as usize > self.max_response_size {
                return Err(TransportError::ResponseTooLarge {
                    size: content_length as usize,
                    max: self.max_response_size,
                });
            }
        }

        let bytes = response.bytes().await.map_err(|e| {
            error!("Failed to read response body [request_id: {}]: {}", request_id, e);
            TransportError::from(e)
        })?;

        if bytes.len() > self.max_response_size {
            return Err(TransportError::ResponseTooLarge {
                size: bytes.len(),
                max: self.max_response_size,
            });
        }

        Ok(RawResponse::new(
            status,
            String::from_utf8_lossy(&bytes).into_owned(),
        ))
    }
}
