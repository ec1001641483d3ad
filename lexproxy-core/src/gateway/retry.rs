//! Identical-call retry with exponential backoff
//!
//! The wrapper repeats the *same* operation; it knows nothing about model
//! selection. Delay before retry `n` (0-based) is
//! `2^n * base_delay + uniform(0, max_jitter)`.

use crate::config::BackoffPolicy;
use crate::gateway::error::GatewayError;
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Errors the backoff wrapper knows how to treat
pub trait BackoffError: std::fmt::Display {
    /// Whether repeating the identical call could succeed
    fn is_transient(&self) -> bool;

    /// Error reported when the caller cancels during a retry delay
    fn cancelled() -> Self;
}

impl BackoffError for GatewayError {
    fn is_transient(&self) -> bool {
        GatewayError::is_transient(self)
    }

    fn cancelled() -> Self {
        GatewayError::Cancelled
    }
}

impl BackoffPolicy {
    /// Single attempt, no retries
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }

    /// Deterministic part of the delay before retry `attempt` (0-based)
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
        Duration::from_millis(self.base_delay_ms.saturating_mul(factor))
    }

    /// Delay before retry `attempt` (0-based), including random jitter
    pub fn calculate_delay(&self, attempt: u32) -> Duration {
        let jitter = if self.max_jitter_ms > 0 {
            rand::thread_rng().gen_range(0..=self.max_jitter_ms)
        } else {
            0
        };
        self.base_delay(attempt)
            .saturating_add(Duration::from_millis(jitter))
    }
}

/// Executor for retry operations
pub struct BackoffExecutor {
    policy: BackoffPolicy,
}

impl BackoffExecutor {
    /// Create a new executor with the given policy
    pub fn new(policy: BackoffPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &BackoffPolicy {
        &self.policy
    }

    /// Run `operation` until it succeeds, fails permanently, or the attempt
    /// budget is spent; the last error is returned unchanged
    pub async fn execute<F, Fut, T, E>(&self, operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: BackoffError,
    {
        self.execute_with_cancel(&CancellationToken::new(), operation)
            .await
    }

    /// Like `execute`, but a fired `cancel` skips any pending delay
    pub async fn execute_with_cancel<F, Fut, T, E>(
        &self,
        cancel: &CancellationToken,
        mut operation: F,
    ) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: BackoffError,
    {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            let error = match operation().await {
                Ok(result) => return Ok(result),
                Err(error) => error,
            };
            attempt += 1;

            if !error.is_transient() {
                debug!("Not retrying permanent error: {}", error);
                return Err(error);
            }

            if attempt >= max_attempts {
                warn!("Giving up after {} attempts: {}", attempt, error);
                return Err(error);
            }

            let delay = self.policy.calculate_delay(attempt - 1);
            warn!(
                "Attempt {}/{} failed ({}), retrying in {}ms",
                attempt,
                max_attempts,
                error,
                delay.as_millis()
            );

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = cancel.cancelled() => return Err(E::cancelled()),
            }
        }
    }
}

/// Retry `operation` under `policy`
pub async fn with_backoff<F, Fut, T, E>(policy: &BackoffPolicy, operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: BackoffError,
{
    BackoffExecutor::new(policy.clone()).execute(operation).await
}
