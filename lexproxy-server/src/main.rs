use anyhow::Context;
use lexproxy_core::config::{self, ConfigValidator, GatewayConfig, SafeLogging};
use lexproxy_core::LegalAssistant;
use lexproxy_server::{router, AppState};
use std::net::SocketAddr;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_PORT: u16 = 3000;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = load_config()?;
    if config.upstream.credential().is_none() {
        warn!("API_KEY is not set; every request will be rejected until it is configured");
    }

    let assistant = LegalAssistant::from_config(&config).context("building upstream client")?;
    let shutdown = CancellationToken::new();
    let app = router(AppState::new(assistant, shutdown.clone()));

    let port = match std::env::var("PORT") {
        Ok(value) => value
            .parse::<u16>()
            .with_context(|| format!("invalid PORT value '{}'", value))?,
        Err(_) => DEFAULT_PORT,
    };
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    info!("Server running on port {}", port);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(err) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for shutdown signal: {}", err);
                std::future::pending::<()>().await;
            }
            info!("Shutting down");
            shutdown.cancel();
        })
        .await
        .context("server error")?;

    Ok(())
}

/// Read `LEXPROXY_CONFIG` when set, otherwise build from the environment
fn load_config() -> anyhow::Result<GatewayConfig> {
    match std::env::var("LEXPROXY_CONFIG") {
        Ok(path) => config::load_from_path(&path)
            .with_context(|| format!("loading config from {}", path)),
        Err(_) => {
            let config = GatewayConfig::from_env();
            ConfigValidator::new()
                .validate(&config)
                .context("validating environment config")?;
            info!("Using environment config: {}", config.safe_for_logging());
            Ok(config)
        }
    }
}
