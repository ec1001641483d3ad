//! Mapping of gateway errors onto HTTP responses

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use lexproxy_core::protocol::Task;
use lexproxy_core::GatewayError;
use serde_json::json;
use tracing::error;

pub const MISSING_KEY_MESSAGE: &str = "API Key not configured on the server.";
pub const CHAT_INPUT_MESSAGE: &str = "Message is required";
pub const TRANSLATE_INPUT_MESSAGE: &str = "Text and targetLanguage are required";
pub const INTERNAL_MESSAGE: &str = "Internal server error";
pub const CANCELLED_MESSAGE: &str = "Request cancelled";

/// Error body returned to the browser as `{"error": message}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Request body was missing the fields `task` needs
    pub fn invalid_input(task: Task) -> Self {
        let message = match task {
            Task::Chat => CHAT_INPUT_MESSAGE,
            Task::Translate => TRANSLATE_INPUT_MESSAGE,
        };
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// Translate a gateway failure for `task`
    pub fn from_gateway(task: Task, err: GatewayError) -> Self {
        match err {
            GatewayError::Validation(_) => Self::invalid_input(task),
            GatewayError::Configuration(detail) => {
                error!("{} rejected, gateway misconfigured: {}", task, detail);
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, MISSING_KEY_MESSAGE)
            }
            GatewayError::Upstream {
                http_status,
                message,
                ..
            } => {
                let status = StatusCode::from_u16(http_status).unwrap_or(StatusCode::BAD_GATEWAY);
                Self::new(status, message)
            }
            GatewayError::Transport { message, model, .. } => {
                error!("{} via {} failed without a response: {}", task, model, message);
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE)
            }
            GatewayError::Cancelled => {
                Self::new(StatusCode::SERVICE_UNAVAILABLE, CANCELLED_MESSAGE)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}
