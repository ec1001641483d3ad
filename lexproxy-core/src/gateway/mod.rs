//! Upstream gateway: single-model client, fallback dispatcher and backoff
//!
//! Control flow is caller → `FallbackDispatcher` → `GatewayClient` →
//! upstream. `BackoffExecutor` can wrap either the dispatcher or a single
//! client call.

pub mod client;
pub mod error;
pub mod prompt;
pub mod retry;
pub mod routing;

pub use client::GatewayClient;
pub use error::{
    GatewayError, GatewayResult, UpstreamFailure, UpstreamOutcome, FALLBACK_PREFIX,
    TRANSPORT_STATUS,
};
pub use retry::{with_backoff, BackoffError, BackoffExecutor};
pub use routing::{Dispatched, FallbackDispatcher, ModelAttempt, RoutingStrategy};
