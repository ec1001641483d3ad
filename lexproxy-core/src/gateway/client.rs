//! Upstream gateway client
//!
//! Turns a (request, model name) pair into one `generateContent` call and
//! classifies what came back. The client never recovers from a failure on
//! its own; retry and fallback decisions belong to its callers.

use crate::config::{
    redact_url_key, BackoffPolicy, FallbackPolicy, GatewayConfig, SecretString, TaskProfiles,
    UpstreamConfig,
};
use crate::gateway::error::{GatewayError, GatewayResult, UpstreamFailure, UpstreamOutcome};
use crate::gateway::prompt;
use crate::gateway::retry::{BackoffError, BackoffExecutor};
use crate::http::error::summarize_error_body;
use crate::http::{HttpClient, HttpExecutor, RawResponse, RequestOptions};
use crate::protocol::{GatewayRequest, GenerateContentResponse, ParsedText, Task};
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Client for the upstream generative-model endpoint
pub struct GatewayClient {
    upstream: UpstreamConfig,
    tasks: TaskProfiles,
    fallback: FallbackPolicy,
    executor: Arc<dyn HttpExecutor>,
}

impl GatewayClient {
    /// Create a client backed by a pooled reqwest client
    pub fn new(config: &GatewayConfig) -> GatewayResult<Self> {
        let http = HttpClient::for_upstream(&config.upstream).map_err(|e| {
            GatewayError::Configuration(format!("failed to create HTTP client: {}", e))
        })?;
        Ok(Self::with_executor(config, Arc::new(http)))
    }

    /// Create a client over any transport
    pub fn with_executor(config: &GatewayConfig, executor: Arc<dyn HttpExecutor>) -> Self {
        Self {
            upstream: config.upstream.clone(),
            tasks: config.tasks.clone(),
            fallback: config.fallback.clone(),
            executor,
        }
    }

    /// Whether an API key is configured
    pub fn has_credential(&self) -> bool {
        self.upstream.credential().is_some()
    }

    /// Ordered model names for a task
    pub fn models(&self, task: Task) -> &[String] {
        &self.tasks.profile(task).models
    }

    /// Full endpoint URL for a model, including the key
    fn endpoint(&self, model: &str, key: &SecretString) -> String {
        let key: String = url::form_urlencoded::byte_serialize(key.expose_secret().as_bytes())
            .collect();
        format!(
            "{}/models/{}:generateContent?key={}",
            self.upstream.base_url.trim_end_matches('/'),
            model,
            key
        )
    }

    /// Call one model once
    pub async fn invoke(
        &self,
        request: &GatewayRequest,
        model: &str,
    ) -> GatewayResult<UpstreamOutcome> {
        self.invoke_with_cancel(request, model, &CancellationToken::new())
            .await
    }

    /// Call one model once, aborting the in-flight call when `cancel` fires
    pub async fn invoke_with_cancel(
        &self,
        request: &GatewayRequest,
        model: &str,
        cancel: &CancellationToken,
    ) -> GatewayResult<UpstreamOutcome> {
        request.validate()?;

        let key = self.upstream.credential().ok_or_else(|| {
            GatewayError::Configuration("API key not configured".to_string())
        })?;

        if cancel.is_cancelled() {
            return Err(GatewayError::Cancelled);
        }

        let task = request.task();
        let body = serde_json::to_value(prompt::build_body(request, self.tasks.profile(task)))
            .map_err(|e| {
                GatewayError::Configuration(format!("failed to serialize request: {}", e))
            })?;
        let url = self.endpoint(model, key);
        let options = RequestOptions::new().with_timeout(self.upstream.request_timeout());
        let request_id = options.request_id;

        info!(
            "Invoking {} for {} task [request_id: {}]",
            model, task, request_id
        );
        debug!("Upstream URL: {}", redact_url_key(&url));

        let result = tokio::select! {
            result = self.executor.post_json(&url, &body, &options) => result,
            _ = cancel.cancelled() => {
                info!("Call to {} cancelled [request_id: {}]", model, request_id);
                return Err(GatewayError::Cancelled);
            }
        };

        let outcome = match result {
            Ok(raw) => self.classify(raw, task, model),
            Err(err) => {
                warn!(
                    "No response from {} [request_id: {}]: {}",
                    model, request_id, err
                );
                UpstreamOutcome::Failure(UpstreamFailure::transport(err.to_string()))
            }
        };

        if let UpstreamOutcome::Failure(failure) = &outcome {
            if !failure.is_transport() {
                warn!(
                    "{} returned {} (retryable: {}) [request_id: {}]: {}",
                    model,
                    failure.http_status,
                    failure.retryable,
                    request_id,
                    summarize_error_body(&failure.message)
                );
            }
        }

        Ok(outcome)
    }

    /// Call one model, repeating the identical call under `policy` while it
    /// fails
    ///
    /// Upstream and transport failures are retried; validation, configuration
    /// and cancellation errors end the loop at once. When the budget runs out
    /// the last failure is returned as an `UpstreamOutcome::Failure`.
    pub async fn invoke_with_backoff(
        &self,
        request: &GatewayRequest,
        model: &str,
        policy: &BackoffPolicy,
        cancel: &CancellationToken,
    ) -> GatewayResult<UpstreamOutcome> {
        let result = BackoffExecutor::new(policy.clone())
            .execute_with_cancel(cancel, || async {
                self.invoke_with_cancel(request, model, cancel)
                    .await?
                    .into_result()
                    .map_err(CallError::Failed)
            })
            .await;

        match result {
            Ok((text, model_used)) => Ok(UpstreamOutcome::Success { text, model_used }),
            Err(CallError::Failed(failure)) => Ok(UpstreamOutcome::Failure(failure)),
            Err(CallError::Fatal(error)) => Err(error),
        }
    }

    /// Interpret a completed HTTP exchange
    pub fn classify(&self, raw: RawResponse, task: Task, model: &str) -> UpstreamOutcome {
        if raw.is_success() {
            let text = match GenerateContentResponse::parse_text(&raw.body) {
                ParsedText::Parsed(text) => text,
                ParsedText::Missing => {
                    debug!("{} response has no candidate text", model);
                    prompt::placeholder(task).to_string()
                }
            };
            return UpstreamOutcome::Success {
                text,
                model_used: model.to_string(),
            };
        }

        UpstreamOutcome::Failure(UpstreamFailure::status(
            raw.status,
            raw.body,
            self.fallback.triggers_on(raw.status),
        ))
    }
}

/// Outcome of one attempt inside `invoke_with_backoff`
#[derive(Debug)]
enum CallError {
    Failed(UpstreamFailure),
    Fatal(GatewayError),
}

impl From<GatewayError> for CallError {
    fn from(error: GatewayError) -> Self {
        CallError::Fatal(error)
    }
}

impl fmt::Display for CallError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallError::Failed(failure) if failure.is_transport() => {
                write!(f, "no response: {}", failure.message)
            }
            CallError::Failed(failure) => write!(
                f,
                "status {}: {}",
                failure.http_status,
                summarize_error_body(&failure.message)
            ),
            CallError::Fatal(error) => error.fmt(f),
        }
    }
}

impl BackoffError for CallError {
    fn is_transient(&self) -> bool {
        match self {
            CallError::Failed(_) => true,
            CallError::Fatal(error) => error.is_transient(),
        }
    }

    fn cancelled() -> Self {
        CallError::Fatal(GatewayError::Cancelled)
    }
}
