//! Configuration module for the gateway
//!
//! Configuration is loaded once at startup (from YAML, JSON or the process
//! environment) and is immutable afterwards: the upstream endpoint and key,
//! the ordered model list per task, the fallback trigger statuses and the
//! backoff settings.

mod env;
mod error;
mod schema;
mod secrets;
mod validator;

pub use error::{ConfigError, ConfigResult, ValidationError, ValidationErrorKind};
pub use schema::{
    BackoffPolicy, FallbackPolicy, GatewayConfig, TaskProfile, TaskProfiles, UpstreamConfig,
    API_KEY_ENV, BASE_URL_ENV, CONFIG_VERSION, DEFAULT_BASE_URL, DEFAULT_FALLBACK_MODEL,
    DEFAULT_PRIMARY_MODEL,
};
pub use secrets::{redact_url_key, SafeLogging, SecretString, REDACTED};
pub use validator::ConfigValidator;

use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Load a configuration from a YAML file
pub fn load_from_yaml<P: AsRef<Path>>(path: P) -> ConfigResult<GatewayConfig> {
    let path = path.as_ref();
    let content = read_source(path)?;
    let interpolated = env::interpolate_env_vars(&content)?;

    let config: GatewayConfig =
        serde_yaml::from_str(&interpolated).map_err(|e| ConfigError::Parse {
            path: path.to_string_lossy().to_string(),
            location: e.location().map(|l| (l.line(), l.column())),
            message: e.to_string(),
        })?;

    finish(config, path)
}

/// Load a configuration from a JSON file
pub fn load_from_json<P: AsRef<Path>>(path: P) -> ConfigResult<GatewayConfig> {
    let path = path.as_ref();
    let content = read_source(path)?;
    let interpolated = env::interpolate_env_vars(&content)?;

    let config: GatewayConfig =
        serde_json::from_str(&interpolated).map_err(|e| ConfigError::Parse {
            path: path.to_string_lossy().to_string(),
            location: Some((e.line(), e.column())),
            message: e.to_string(),
        })?;

    finish(config, path)
}

/// Load a configuration file, picking the format from its extension
pub fn load_from_path<P: AsRef<Path>>(path: P) -> ConfigResult<GatewayConfig> {
    let path = path.as_ref();
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => load_from_json(path),
        Some("yaml") | Some("yml") => load_from_yaml(path),
        other => Err(ConfigError::UnsupportedFormat {
            path: path.to_string_lossy().to_string(),
            extension: other.unwrap_or_default().to_string(),
        }),
    }
}

fn read_source(path: &Path) -> ConfigResult<String> {
    let content = fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: path.to_string_lossy().to_string(),
        source: e,
    })?;

    for finding in ConfigValidator::new().inspect_source(&content) {
        warn!("{}: {}", path.display(), finding);
    }

    Ok(content)
}

fn finish(mut config: GatewayConfig, path: &Path) -> ConfigResult<GatewayConfig> {
    env::interpolate_config_env_vars(&mut config)?;

    ConfigValidator::new().validate(&config)?;
    info!(
        "Loaded gateway config from {}: {}",
        path.display(),
        config.safe_for_logging()
    );
    Ok(config)
}
