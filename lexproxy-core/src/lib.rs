//! Lexproxy Core Library
//!
//! Gateway between the legal-education application and an upstream
//! generative-language API: a single-model client, a model-fallback
//! dispatcher, an identical-call backoff wrapper and the `chat` /
//! `translate` operations built on them.

pub mod config;
pub mod gateway;
pub mod http;
pub mod protocol;
pub mod service;

pub use config::GatewayConfig;
pub use gateway::{FallbackDispatcher, GatewayClient, GatewayError, GatewayResult};
pub use protocol::{ChatReply, GatewayRequest, TranslateReply};
pub use service::{LegalAssistant, Notice, Notifier, TracingNotifier};

/// Returns the version of the Lexproxy Core library.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
