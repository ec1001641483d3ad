//! Model fallback routing
//!
//! The dispatcher walks the configured model list for a task in order and
//! stops at the first success. A failure moves it to the next model only
//! when the failure is retryable; otherwise, or when no model is left, that
//! failure is the final answer. Attempts are strictly sequential because
//! each fallback decision depends on the previous outcome.

use crate::gateway::client::GatewayClient;
use crate::gateway::error::{GatewayError, GatewayResult, UpstreamOutcome};
use crate::protocol::{ChatReply, GatewayRequest, Task, TranslateReply};
use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// A model name and its position in the attempt order (primary = 0)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelAttempt {
    pub model: String,
    pub position: usize,
}

/// Successful routing result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatched {
    pub text: String,
    /// Model that produced `text`
    pub model_used: String,
    /// Position of that model in the attempt order
    pub attempt: usize,
}

impl Dispatched {
    pub fn used_fallback(&self) -> bool {
        self.attempt > 0
    }

    pub fn into_chat_reply(self) -> ChatReply {
        ChatReply {
            response: self.text,
            model: self.model_used,
        }
    }

    pub fn into_translate_reply(self) -> TranslateReply {
        TranslateReply {
            translation: self.text,
        }
    }
}

/// Trait for routing strategies
#[async_trait]
pub trait RoutingStrategy: Send + Sync {
    /// Execute the request, returning exactly one terminal outcome
    async fn route(
        &self,
        request: &GatewayRequest,
        cancel: &CancellationToken,
    ) -> GatewayResult<Dispatched>;

    /// Get the name of this routing strategy
    fn name(&self) -> &str;

    /// Models in order of preference for a task
    fn models(&self, task: Task) -> Vec<String>;
}

/// Primary model with ordered fallbacks
pub struct FallbackDispatcher {
    client: Arc<GatewayClient>,
}

impl FallbackDispatcher {
    pub fn new(client: GatewayClient) -> Self {
        Self {
            client: Arc::new(client),
        }
    }

    pub fn from_shared(client: Arc<GatewayClient>) -> Self {
        Self { client }
    }

    /// Attempt order for a task
    pub fn attempts(&self, task: Task) -> Vec<ModelAttempt> {
        self.client
            .models(task)
            .iter()
            .enumerate()
            .map(|(position, model)| ModelAttempt {
                model: model.clone(),
                position,
            })
            .collect()
    }

    /// Route without a cancellation signal
    pub async fn dispatch(&self, request: &GatewayRequest) -> GatewayResult<Dispatched> {
        self.route(request, &CancellationToken::new()).await
    }
}

#[async_trait]
impl RoutingStrategy for FallbackDispatcher {
    async fn route(
        &self,
        request: &GatewayRequest,
        cancel: &CancellationToken,
    ) -> GatewayResult<Dispatched> {
        if !self.client.has_credential() {
            return Err(GatewayError::Configuration(
                "API key not configured".to_string(),
            ));
        }
        request.validate()?;

        let task = request.task();
        let attempts = self.attempts(task);
        let Some(last) = attempts.len().checked_sub(1) else {
            return Err(GatewayError::Configuration(format!(
                "no models configured for {} task",
                task
            )));
        };

        for attempt in &attempts {
            if cancel.is_cancelled() {
                return Err(GatewayError::Cancelled);
            }

            let outcome = self
                .client
                .invoke_with_cancel(request, &attempt.model, cancel)
                .await?;

            match outcome {
                UpstreamOutcome::Success { text, model_used } => {
                    if attempt.position > 0 {
                        info!(
                            "{} task served by fallback model {} (attempt {})",
                            task, model_used, attempt.position
                        );
                    }
                    return Ok(Dispatched {
                        text,
                        model_used,
                        attempt: attempt.position,
                    });
                }
                UpstreamOutcome::Failure(failure) => {
                    if failure.retryable && attempt.position < last {
                        warn!(
                            "{} failed with status {}, falling back to {}",
                            attempt.model,
                            failure.http_status,
                            attempts[attempt.position + 1].model
                        );
                        continue;
                    }

                    let failure = if attempt.position > 0 {
                        failure.from_fallback()
                    } else {
                        failure
                    };
                    return Err(GatewayError::from_failure(
                        failure,
                        &attempt.model,
                        attempt.position,
                    ));
                }
            }
        }

        // Every path through the loop returns: the last attempt is never
        // allowed to continue.
        Err(GatewayError::Configuration(format!(
            "no models configured for {} task",
            task
        )))
    }

    fn name(&self) -> &str {
        "primary_with_fallbacks"
    }

    fn models(&self, task: Task) -> Vec<String> {
        self.client.models(task).to_vec()
    }
}
