//! Gateway outcome and error types

use crate::protocol::InputError;
use thiserror::Error;

/// Prefix marking a failure that came from a fallback model
pub const FALLBACK_PREFIX: &str = "[Fallback] ";

/// Status reported for failures where no HTTP response was received
pub const TRANSPORT_STATUS: u16 = 0;

/// A classified failed call to one model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamFailure {
    /// Upstream HTTP status, or `TRANSPORT_STATUS` when nothing came back
    pub http_status: u16,
    /// Raw upstream body, or the transport error description
    pub message: String,
    /// Whether the dispatcher may move on to the next model
    pub retryable: bool,
}

impl UpstreamFailure {
    /// Failure for a non-2xx response
    pub fn status(http_status: u16, body: impl Into<String>, retryable: bool) -> Self {
        Self {
            http_status,
            message: body.into(),
            retryable,
        }
    }

    /// Failure for a call that produced no response
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            http_status: TRANSPORT_STATUS,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn is_transport(&self) -> bool {
        self.http_status == TRANSPORT_STATUS
    }

    /// Mark the failure as produced by a fallback attempt
    pub fn from_fallback(mut self) -> Self {
        if !self.message.starts_with(FALLBACK_PREFIX) {
            self.message = format!("{}{}", FALLBACK_PREFIX, self.message);
        }
        self
    }
}

/// Result of a single model call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpstreamOutcome {
    Success { text: String, model_used: String },
    Failure(UpstreamFailure),
}

impl UpstreamOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, UpstreamOutcome::Success { .. })
    }

    /// Split into the served `(text, model_used)` pair or the failure
    pub fn into_result(self) -> Result<(String, String), UpstreamFailure> {
        match self {
            UpstreamOutcome::Success { text, model_used } => Ok((text, model_used)),
            UpstreamOutcome::Failure(failure) => Err(failure),
        }
    }
}

/// Terminal error returned to callers of the gateway
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// Malformed or missing input; no upstream call was made
    #[error("Validation error: {0}")]
    Validation(#[from] InputError),

    /// Missing credential or unusable configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Upstream answered with an error status
    #[error("Upstream error ({http_status}) from {model}: {message}")]
    Upstream {
        http_status: u16,
        message: String,
        model: String,
        attempt: usize,
    },

    /// No response was received from the upstream
    #[error("Transport error from {model}: {message}")]
    Transport {
        message: String,
        model: String,
        attempt: usize,
    },

    /// Caller aborted the operation
    #[error("Request cancelled")]
    Cancelled,
}

impl GatewayError {
    /// Convert the terminal failure of a model attempt
    pub fn from_failure(failure: UpstreamFailure, model: &str, attempt: usize) -> Self {
        if failure.is_transport() {
            GatewayError::Transport {
                message: failure.message,
                model: model.to_string(),
                attempt,
            }
        } else {
            GatewayError::Upstream {
                http_status: failure.http_status,
                message: failure.message,
                model: model.to_string(),
                attempt,
            }
        }
    }

    /// Whether repeating the identical call could succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            GatewayError::Upstream { .. } | GatewayError::Transport { .. }
        )
    }

    /// Upstream HTTP status, if the upstream answered
    pub fn http_status(&self) -> Option<u16> {
        match self {
            GatewayError::Upstream { http_status, .. } => Some(*http_status),
            _ => None,
        }
    }
}

/// Result type for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;
