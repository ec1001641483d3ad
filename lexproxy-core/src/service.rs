//! Caller-facing legal assistant operations
//!
//! `LegalAssistant` exposes `chat` and `translate` on top of a routing
//! strategy, optionally wrapping every dispatch in identical-call backoff.
//! Notable events (fallback use, terminal failures) go to a `Notifier`
//! supplied by the embedding application.

use crate::config::{BackoffPolicy, GatewayConfig};
use crate::gateway::{
    BackoffExecutor, Dispatched, FallbackDispatcher, GatewayClient, GatewayError, GatewayResult,
    RoutingStrategy,
};
use crate::protocol::{ChatReply, GatewayRequest, Task, TranslateReply, Turn};
use futures::future::try_join_all;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Event surfaced to the embedding application
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// The primary model failed and a fallback answered
    FallbackUsed { task: Task, model: String },
    /// The operation ended in an error
    Failed { task: Task, error: GatewayError },
}

/// Receiver of user-visible notices
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: &Notice);
}

/// Notifier that writes notices to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: &Notice) {
        match notice {
            Notice::FallbackUsed { task, model } => {
                info!("{} answered by fallback model {}", task, model)
            }
            Notice::Failed { task, error } => error!("{} failed: {}", task, error),
        }
    }
}

/// Chat and translation operations for UI/CLI callers
#[derive(Clone)]
pub struct LegalAssistant {
    router: Arc<dyn RoutingStrategy>,
    backoff: Option<BackoffPolicy>,
    notifier: Arc<dyn Notifier>,
}

impl LegalAssistant {
    /// Build the default fallback router over the configured upstream,
    /// wrapped in backoff when the config has a `backoff` section
    pub fn from_config(config: &GatewayConfig) -> GatewayResult<Self> {
        let client = GatewayClient::new(config)?;
        let assistant = Self::new(Arc::new(FallbackDispatcher::new(client)));
        Ok(match &config.backoff {
            Some(policy) => assistant.with_backoff(policy.clone()),
            None => assistant,
        })
    }

    pub fn new(router: Arc<dyn RoutingStrategy>) -> Self {
        Self {
            router,
            backoff: None,
            notifier: Arc::new(TracingNotifier),
        }
    }

    /// Retry the whole dispatch under `policy` on transient failures
    pub fn with_backoff(mut self, policy: BackoffPolicy) -> Self {
        self.backoff = Some(policy);
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn router(&self) -> &dyn RoutingStrategy {
        self.router.as_ref()
    }

    /// Ask the legal assistant a question
    pub async fn chat(&self, message: impl Into<String>) -> GatewayResult<ChatReply> {
        let request = GatewayRequest::chat(message);
        self.execute(&request, &CancellationToken::new())
            .await
            .map(Dispatched::into_chat_reply)
    }

    /// Ask a question in the context of earlier turns
    pub async fn chat_with_history(
        &self,
        message: impl Into<String>,
        history: Vec<Turn>,
    ) -> GatewayResult<ChatReply> {
        let request = GatewayRequest::chat_with_history(message, history);
        self.execute(&request, &CancellationToken::new())
            .await
            .map(Dispatched::into_chat_reply)
    }

    /// Translate a text into `target_language`
    pub async fn translate(
        &self,
        text: impl Into<String>,
        target_language: impl Into<String>,
    ) -> GatewayResult<TranslateReply> {
        let request = GatewayRequest::translate(text, target_language);
        self.execute(&request, &CancellationToken::new())
            .await
            .map(Dispatched::into_translate_reply)
    }

    /// Translate several texts concurrently; replies keep input order and
    /// the first error drops the calls still in flight
    pub async fn translate_many<S: AsRef<str>>(
        &self,
        texts: &[S],
        target_language: &str,
    ) -> GatewayResult<Vec<TranslateReply>> {
        let requests: Vec<GatewayRequest> = texts
            .iter()
            .map(|text| GatewayRequest::translate(text.as_ref(), target_language))
            .collect();

        let cancel = CancellationToken::new();
        let replies =
            try_join_all(requests.iter().map(|request| self.execute(request, &cancel))).await?;
        Ok(replies
            .into_iter()
            .map(Dispatched::into_translate_reply)
            .collect())
    }

    /// Run a request through the router (and backoff, when configured)
    pub async fn execute(
        &self,
        request: &GatewayRequest,
        cancel: &CancellationToken,
    ) -> GatewayResult<Dispatched> {
        let result = match &self.backoff {
            Some(policy) => {
                BackoffExecutor::new(policy.clone())
                    .execute_with_cancel(cancel, || self.router.route(request, cancel))
                    .await
            }
            None => self.router.route(request, cancel).await,
        };

        match &result {
            Ok(dispatched) if dispatched.used_fallback() => {
                self.notifier.notify(&Notice::FallbackUsed {
                    task: request.task(),
                    model: dispatched.model_used.clone(),
                })
            }
            Ok(_) => {}
            Err(error) => self.notifier.notify(&Notice::Failed {
                task: request.task(),
                error: error.clone(),
            }),
        }

        result
    }
}
