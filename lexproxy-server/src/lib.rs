//! HTTP surface of the legal assistant
//!
//! Exposes `POST /api/chat`, `POST /api/translate` and `GET /health` on top
//! of a [`LegalAssistant`]. The upstream key never leaves the server.

pub mod error;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use lexproxy_core::gateway::Dispatched;
use lexproxy_core::protocol::{ChatReply, GatewayRequest, Task, TranslateReply, Turn};
use lexproxy_core::LegalAssistant;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::debug;

pub use error::ApiError;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    assistant: LegalAssistant,
    shutdown: CancellationToken,
}

impl AppState {
    pub fn new(assistant: LegalAssistant, shutdown: CancellationToken) -> Self {
        Self {
            assistant,
            shutdown,
        }
    }

    async fn run(&self, request: GatewayRequest) -> Result<Dispatched, ApiError> {
        let task = request.task();
        // In-flight upstream calls end when the server shuts down
        let cancel = self.shutdown.child_token();
        self.assistant
            .execute(&request, &cancel)
            .await
            .map_err(|err| ApiError::from_gateway(task, err))
    }
}

#[derive(Debug, Deserialize)]
struct ChatBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    history: Vec<Turn>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TranslateBody {
    #[serde(default)]
    text: String,
    #[serde(default)]
    target_language: String,
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/chat", post(chat))
        .route("/api/translate", post(translate))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn chat(
    State(state): State<AppState>,
    body: Result<Json<ChatBody>, JsonRejection>,
) -> Result<Json<ChatReply>, ApiError> {
    let Json(body) = body.map_err(|rejection| {
        debug!("Unreadable chat body: {}", rejection);
        ApiError::invalid_input(Task::Chat)
    })?;

    let request = GatewayRequest::chat_with_history(body.message, body.history);
    let dispatched = state.run(request).await?;
    Ok(Json(dispatched.into_chat_reply()))
}

async fn translate(
    State(state): State<AppState>,
    body: Result<Json<TranslateBody>, JsonRejection>,
) -> Result<Json<TranslateReply>, ApiError> {
    let Json(body) = body.map_err(|rejection| {
        debug!("Unreadable translate body: {}", rejection);
        ApiError::invalid_input(Task::Translate)
    })?;

    let request = GatewayRequest::translate(body.text, body.target_language);
    let dispatched = state.run(request).await?;
    Ok(Json(dispatched.into_translate_reply()))
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": lexproxy_core::version(),
    }))
}
