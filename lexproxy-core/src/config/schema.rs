//! Configuration schema structures with serde support

use super::error::{ValidationError, ValidationErrorKind};
use super::secrets::{SafeLogging, SecretString};
use crate::protocol::types::Task;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

/// Supported schema version
pub const CONFIG_VERSION: &str = "0.1";

/// Default upstream endpoint for the generative-language API
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// General-purpose model tried first
pub const DEFAULT_PRIMARY_MODEL: &str = "gemini-pro";

/// Lightweight model used when the primary is unavailable
pub const DEFAULT_FALLBACK_MODEL: &str = "gemini-2.5-flash";

/// Environment variable holding the upstream API key
pub const API_KEY_ENV: &str = "API_KEY";

/// Environment variable overriding the upstream base URL
pub const BASE_URL_ENV: &str = "LEXPROXY_BASE_URL";

/// Root configuration structure for the gateway
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Schema version (required - no default)
    pub version: String,

    /// Upstream endpoint and credential
    #[serde(default)]
    pub upstream: UpstreamConfig,

    /// Per-task model lists and generation parameters
    #[serde(default)]
    pub tasks: TaskProfiles,

    /// Which upstream statuses move the dispatcher to the next model
    #[serde(default)]
    pub fallback: FallbackPolicy,

    /// Identical-call retry around each dispatch; absent means a single try
    #[serde(default)]
    pub backoff: Option<BackoffPolicy>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION.to_string(),
            upstream: UpstreamConfig::default(),
            tasks: TaskProfiles::default(),
            fallback: FallbackPolicy::default(),
            backoff: None,
        }
    }
}

/// Upstream generative-model endpoint configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct UpstreamConfig {
    /// Base URL; calls go to `{base_url}/models/{model}:generateContent`
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// API key (supports environment variable interpolation). Absence is
    /// reported when a request is dispatched, not at load time.
    #[serde(default)]
    pub api_key: Option<SecretString>,

    /// Connection timeout in milliseconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_ms: u64,

    /// Request timeout in milliseconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            connect_timeout_ms: default_connect_timeout(),
            request_timeout_ms: default_request_timeout(),
        }
    }
}

impl UpstreamConfig {
    /// Returns the configured key if it is present and non-blank
    pub fn credential(&self) -> Option<&SecretString> {
        self.api_key.as_ref().filter(|key| !key.is_blank())
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Model list and generation parameters for every task type
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TaskProfiles {
    #[serde(default = "TaskProfile::chat")]
    pub chat: TaskProfile,

    #[serde(default = "TaskProfile::translate")]
    pub translate: TaskProfile,
}

impl Default for TaskProfiles {
    fn default() -> Self {
        Self {
            chat: TaskProfile::chat(),
            translate: TaskProfile::translate(),
        }
    }
}

impl TaskProfiles {
    /// Profile for the given task
    pub fn profile(&self, task: Task) -> &TaskProfile {
        match task {
            Task::Chat => &self.chat,
            Task::Translate => &self.translate,
        }
    }
}

/// Ordered models and fixed generation parameters for one task
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TaskProfile {
    /// Models tried in order; the first is the primary
    #[serde(default = "default_models")]
    pub models: Vec<String>,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Output length cap
    pub max_output_tokens: u32,
}

impl TaskProfile {
    /// Defaults for the legal-assistant chat
    pub fn chat() -> Self {
        Self {
            models: default_models(),
            temperature: default_temperature(),
            max_output_tokens: 500,
        }
    }

    /// Defaults for short UI string translation
    pub fn translate() -> Self {
        Self {
            models: default_models(),
            temperature: default_temperature(),
            max_output_tokens: 250,
        }
    }

    /// Validate a task profile
    pub fn validate(&self, path: &str) -> Result<(), ValidationError> {
        if self.models.is_empty() {
            return Err(ValidationError::required(format!("{}.models", path))
                .with_context("At least one model must be configured"));
        }

        let mut seen = HashSet::new();
        for (i, model) in self.models.iter().enumerate() {
            let model_path = format!("{}.models[{}]", path, i);
            if model.trim().is_empty() {
                return Err(ValidationError::required(model_path));
            }
            if !seen.insert(model.as_str()) {
                return Err(ValidationError::duplicate(model_path, model.as_str())
                    .with_context("A model may appear only once per task"));
            }
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ValidationError::out_of_range(
                format!("{}.temperature", path),
                "Must be between 0.0 and 2.0",
            ));
        }

        if self.max_output_tokens == 0 {
            return Err(ValidationError::out_of_range(
                format!("{}.max_output_tokens", path),
                "Must be greater than 0",
            ));
        }

        Ok(())
    }
}

/// Fallback trigger configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FallbackPolicy {
    /// Upstream HTTP statuses that move on to the next model
    #[serde(default = "default_fallback_statuses")]
    pub on_status: Vec<u16>,
}

impl Default for FallbackPolicy {
    fn default() -> Self {
        Self {
            on_status: default_fallback_statuses(),
        }
    }
}

impl FallbackPolicy {
    /// Whether a failed call with this status may be retried on another model
    pub fn triggers_on(&self, status: u16) -> bool {
        self.on_status.contains(&status)
    }
}

/// Identical-call retry configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BackoffPolicy {
    /// Total attempts including the first one
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the second attempt; doubles for every further attempt
    #[serde(default = "default_base_delay")]
    pub base_delay_ms: u64,

    /// Upper bound of the uniform random jitter added to each delay
    #[serde(default = "default_max_jitter")]
    pub max_jitter_ms: u64,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay(),
            max_jitter_ms: default_max_jitter(),
        }
    }
}

// Default value functions for serde
fn default_base_url() -> String { DEFAULT_BASE_URL.to_string() }
fn default_connect_timeout() -> u64 { 10_000 }
fn default_request_timeout() -> u64 { 60_000 }
fn default_models() -> Vec<String> {
    vec![
        DEFAULT_PRIMARY_MODEL.to_string(),
        DEFAULT_FALLBACK_MODEL.to_string(),
    ]
}
fn default_temperature() -> f32 { 0.2 }
fn default_fallback_statuses() -> Vec<u16> { vec![400, 404] }
fn default_max_attempts() -> u32 { 3 }
fn default_base_delay() -> u64 { 1000 }
fn default_max_jitter() -> u64 { 1000 }

impl GatewayConfig {
    /// Build the default configuration, taking the key and base URL from the
    /// process environment
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.upstream.api_key = std::env::var(API_KEY_ENV).ok().map(SecretString::new);
        if let Ok(base_url) = std::env::var(BASE_URL_ENV) {
            config.upstream.base_url = base_url;
        }
        config
    }

    /// Set the upstream API key
    pub fn with_api_key(mut self, api_key: impl Into<SecretString>) -> Self {
        self.upstream.api_key = Some(api_key.into());
        self
    }

    /// Set the upstream base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.upstream.base_url = base_url.into();
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.version.is_empty() {
            return Err(ValidationError::required("version"));
        }

        if self.version != CONFIG_VERSION {
            return Err(ValidationError::new(
                "version",
                ValidationErrorKind::UnsupportedVersion {
                    expected: CONFIG_VERSION.to_string(),
                    found: self.version.clone(),
                },
            ));
        }

        self.upstream.validate("upstream")?;
        self.tasks.chat.validate("tasks.chat")?;
        self.tasks.translate.validate("tasks.translate")?;

        for (i, status) in self.fallback.on_status.iter().enumerate() {
            if !(400..=599).contains(status) {
                return Err(ValidationError::out_of_range(
                    format!("fallback.on_status[{}]", i),
                    format!("{} is not an HTTP error status", status),
                ));
            }
        }

        if let Some(backoff) = &self.backoff {
            if backoff.max_attempts == 0 {
                return Err(ValidationError::out_of_range(
                    "backoff.max_attempts",
                    "Must be at least 1",
                ));
            }
        }

        Ok(())
    }
}

impl UpstreamConfig {
    /// Validate upstream configuration
    pub fn validate(&self, path: &str) -> Result<(), ValidationError> {
        if self.base_url.is_empty() {
            return Err(ValidationError::required(format!("{}.base_url", path)));
        }

        match url::Url::parse(&self.base_url) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    return Err(ValidationError::invalid_url(
                        format!("{}.base_url", path),
                        format!("scheme must be http or https, got {}", url.scheme()),
                    ));
                }
            }
            Err(e) => {
                return Err(ValidationError::invalid_url(
                    format!("{}.base_url", path),
                    e.to_string(),
                ));
            }
        }

        if self.request_timeout_ms == 0 {
            return Err(ValidationError::out_of_range(
                format!("{}.request_timeout_ms", path),
                "Must be greater than 0",
            ));
        }

        Ok(())
    }
}

impl SafeLogging for GatewayConfig {
    fn safe_for_logging(&self) -> String {
        let key = self
            .upstream
            .credential()
            .map(|k| k.hint())
            .unwrap_or_else(|| "[MISSING]".to_string());

        format!(
            "base_url={} api_key={} chat_models={:?} translate_models={:?} fallback_on={:?} backoff_attempts={}",
            self.upstream.base_url,
            key,
            self.tasks.chat.models,
            self.tasks.translate.models,
            self.fallback.on_status,
            self.backoff.as_ref().map_or(1, |b| b.max_attempts),
        )
    }
}
