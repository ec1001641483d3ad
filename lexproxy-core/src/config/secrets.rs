//! Keeping the upstream API key out of logs
//!
//! The key is sent as the `key` query parameter on every call, so both the
//! configured value and any URL built from it must be masked before they are
//! formatted.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholder written wherever a secret would otherwise appear
pub const REDACTED: &str = "[REDACTED]";

/// Prefix shared by Google API keys; safe to show in hints
const GOOGLE_KEY_PREFIX: &str = "AIza";

/// API key that never prints its value
#[derive(Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct SecretString(String);

impl SecretString {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The raw key, for building the request URL only
    pub fn expose_secret(&self) -> &str {
        &self.0
    }

    /// True when nothing but whitespace was configured
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Short recognisable form for config summaries, e.g. `AIza...x9Qk`
    pub fn hint(&self) -> String {
        let key = self.0.as_str();
        if key.is_empty() {
            return "[EMPTY]".to_string();
        }
        if key.len() <= 8 || !key.is_ascii() {
            return REDACTED.to_string();
        }

        let (head, tail) = if key.starts_with(GOOGLE_KEY_PREFIX) {
            (GOOGLE_KEY_PREFIX.len(), 4)
        } else {
            (2, 2)
        };
        format!("{}...{}", &key[..head], &key[key.len() - tail..])
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl From<String> for SecretString {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for SecretString {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Types that can describe themselves without leaking credentials
pub trait SafeLogging {
    fn safe_for_logging(&self) -> String;
}

/// Mask the `key` query parameter of an upstream URL
pub fn redact_url_key(url: &str) -> String {
    let Some((base, query)) = url.split_once('?') else {
        return url.to_string();
    };

    let masked: Vec<String> = query
        .split('&')
        .map(|pair| match pair.split_once('=') {
            Some(("key", _)) => format!("key={}", REDACTED),
            _ => pair.to_string(),
        })
        .collect();

    format!("{}?{}", base, masked.join("&"))
}
