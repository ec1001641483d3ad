//! Timing and attempt-count tests for identical-call backoff
//!
//! Uses a paused tokio clock so the exponential delays complete instantly
//! while `tokio::time::Instant` still observes them.

use async_trait::async_trait;
use lexproxy_core::config::{BackoffPolicy, GatewayConfig};
use lexproxy_core::gateway::{
    with_backoff, BackoffExecutor, GatewayClient, GatewayError, UpstreamOutcome,
};
use lexproxy_core::http::{HttpExecutor, RawResponse, RequestOptions, TransportError};
use lexproxy_core::protocol::GatewayRequest;
use serde_json::Value;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

fn upstream(status: u16) -> GatewayError {
    GatewayError::Upstream {
        http_status: status,
        message: format!("status {}", status),
        model: "gemini-pro".into(),
        attempt: 0,
    }
}

fn transport() -> GatewayError {
    GatewayError::Transport {
        message: "connection reset".into(),
        model: "gemini-pro".into(),
        attempt: 0,
    }
}

#[tokio::test(start_paused = true)]
async fn test_fails_twice_then_succeeds() {
    let stamps = Arc::new(Mutex::new(Vec::new()));
    let calls = Arc::new(AtomicU32::new(0));

    let result = with_backoff(&BackoffPolicy::default(), || {
        let stamps = stamps.clone();
        let calls = calls.clone();
        async move {
            stamps.lock().unwrap().push(Instant::now());
            match calls.fetch_add(1, Ordering::SeqCst) {
                0 => Err(upstream(503)),
                1 => Err(transport()),
                _ => Ok("served"),
            }
        }
    })
    .await;

    assert_eq!(result.unwrap(), "served");
    assert_eq!(calls.load(Ordering::SeqCst), 3);

    let stamps = stamps.lock().unwrap();
    let first_gap = stamps[1] - stamps[0];
    let second_gap = stamps[2] - stamps[1];
    assert!(first_gap >= Duration::from_millis(1000));
    assert!(first_gap <= Duration::from_millis(2000));
    assert!(second_gap >= Duration::from_millis(2000));
    assert!(second_gap <= Duration::from_millis(3000));
}

#[tokio::test(start_paused = true)]
async fn test_returns_last_error_after_budget() {
    let calls = Arc::new(AtomicU32::new(0));

    let result: Result<(), _> = with_backoff(&BackoffPolicy::default(), || {
        let calls = calls.clone();
        async move {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            Err(upstream(500 + n as u16))
        }
    })
    .await;

    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(result.unwrap_err().http_status(), Some(502));
}

#[tokio::test(start_paused = true)]
async fn test_permanent_errors_are_not_repeated() {
    for error in [
        GatewayError::Configuration("missing key".into()),
        GatewayError::Cancelled,
    ] {
        let calls = Arc::new(AtomicU32::new(0));
        let expected = error.clone();

        let result: Result<(), _> = with_backoff(&BackoffPolicy::default(), || {
            let calls = calls.clone();
            let error = error.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(error)
            }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(result.unwrap_err(), expected);
    }
}

#[tokio::test(start_paused = true)]
async fn test_single_attempt_policy() {
    let calls = Arc::new(AtomicU32::new(0));
    let started = Instant::now();

    let result: Result<(), _> = with_backoff(&BackoffPolicy::no_retry(), || {
        let calls = calls.clone();
        async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(transport())
        }
    })
    .await;

    assert!(result.is_err());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(started.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_during_delay() {
    let executor = BackoffExecutor::new(BackoffPolicy {
        max_attempts: 5,
        base_delay_ms: 60_000,
        max_jitter_ms: 0,
    });
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        trigger.cancel();
    });

    let calls = Arc::new(AtomicU32::new(0));
    let started = Instant::now();
    let result: Result<(), _> = executor
        .execute_with_cancel(&cancel, || {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(upstream(503))
            }
        })
        .await;

    assert_eq!(result.unwrap_err(), GatewayError::Cancelled);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(started.elapsed() < Duration::from_secs(60));
}

/// Transport that drops the first `failures` calls, then answers 200
struct RecoveringTransport {
    failures: u32,
    calls: AtomicU32,
}

impl RecoveringTransport {
    fn new(failures: u32) -> Arc<Self> {
        Arc::new(Self {
            failures,
            calls: AtomicU32::new(0),
        })
    }
}

#[async_trait]
impl HttpExecutor for RecoveringTransport {
    async fn post_json(
        &self,
        _url: &str,
        _body: &Value,
        _options: &RequestOptions,
    ) -> Result<RawResponse, TransportError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) < self.failures {
            return Err(TransportError::Connect("reset".into()));
        }
        Ok(RawResponse::new(
            200,
            r#"{"candidates":[{"content":{"parts":[{"text":"Bonjour"}]}}]}"#,
        ))
    }
}

fn client_over(transport: Arc<RecoveringTransport>) -> GatewayClient {
    GatewayClient::with_executor(&GatewayConfig::default().with_api_key("test-key"), transport)
}

#[tokio::test(start_paused = true)]
async fn test_single_call_retried_after_transport_failure() {
    let transport = RecoveringTransport::new(1);
    let client = client_over(transport.clone());
    let request = GatewayRequest::translate("Hello", "French");
    let started = Instant::now();

    let outcome = client
        .invoke_with_backoff(
            &request,
            "gemini-pro",
            &BackoffPolicy::default(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(
        outcome,
        UpstreamOutcome::Success {
            text: "Bonjour".into(),
            model_used: "gemini-pro".into(),
        }
    );
    assert_eq!(transport.calls.load(Ordering::SeqCst), 2);
    assert!(started.elapsed() >= Duration::from_millis(1000));
}

#[tokio::test(start_paused = true)]
async fn test_single_call_outcome_composes_with_backoff() {
    let transport = RecoveringTransport::new(1);
    let client = client_over(transport.clone());
    let request = GatewayRequest::chat("What is a tort?");

    let served = with_backoff(&BackoffPolicy::default(), || async {
        match client.invoke(&request, "gemini-pro").await?.into_result() {
            Ok(served) => Ok(served),
            Err(failure) => Err(GatewayError::from_failure(failure, "gemini-pro", 0)),
        }
    })
    .await
    .unwrap();

    assert_eq!(served, ("Bonjour".to_string(), "gemini-pro".to_string()));
    assert_eq!(transport.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn test_single_call_budget_returns_last_failure() {
    let transport = RecoveringTransport::new(u32::MAX);
    let client = client_over(transport.clone());

    let outcome = client
        .invoke_with_backoff(
            &GatewayRequest::chat("Q"),
            "gemini-pro",
            &BackoffPolicy::default(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    match outcome {
        UpstreamOutcome::Failure(failure) => {
            assert!(failure.is_transport());
            assert!(failure.message.contains("reset"));
        }
        other => panic!("expected failure, got {:?}", other),
    }
    assert_eq!(transport.calls.load(Ordering::SeqCst), 3);
}
