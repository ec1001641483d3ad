//! Errors raised while loading or checking a gateway configuration

use std::fmt;
use thiserror::Error;

/// Failure to produce a usable `GatewayConfig`
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse config '{path}'{}: {message}",
            .location.map(|(line, column)| format!(" at {}:{}", line, column)).unwrap_or_default())]
    Parse {
        path: String,
        /// 1-based (line, column) when the parser reports one
        location: Option<(usize, usize)>,
        message: String,
    },

    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("environment variable '{var}' referenced by the config is not set")]
    MissingEnvVar { var: String },

    #[error("config '{path}' has unsupported extension '{extension}' (expected .yaml, .yml or .json)")]
    UnsupportedFormat { path: String, extension: String },
}

/// A rule violated by one field of an otherwise parseable config
#[derive(Debug, Error)]
pub struct ValidationError {
    /// Dotted path of the offending field, e.g. `tasks.chat.models[1]`
    pub field_path: String,
    pub kind: ValidationErrorKind,
    /// Hint shown after the message
    pub context: Option<String>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid config field '{}': {}", self.field_path, self.kind)?;
        match &self.context {
            Some(hint) => write!(f, " ({})", hint),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationErrorKind {
    #[error("value is required")]
    Missing,

    #[error("{reason}")]
    OutOfRange { reason: String },

    #[error("'{value}' is listed more than once")]
    Duplicate { value: String },

    #[error("not a usable URL: {reason}")]
    InvalidUrl { reason: String },

    #[error("schema version '{found}' is not supported (expected '{expected}')")]
    UnsupportedVersion { expected: String, found: String },
}

impl ValidationError {
    pub fn new(field_path: impl Into<String>, kind: ValidationErrorKind) -> Self {
        Self {
            field_path: field_path.into(),
            kind,
            context: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn required(field_path: impl Into<String>) -> Self {
        Self::new(field_path, ValidationErrorKind::Missing)
    }

    pub fn out_of_range(field_path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(
            field_path,
            ValidationErrorKind::OutOfRange {
                reason: reason.into(),
            },
        )
    }

    pub fn duplicate(field_path: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(
            field_path,
            ValidationErrorKind::Duplicate {
                value: value.into(),
            },
        )
    }

    pub fn invalid_url(field_path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(
            field_path,
            ValidationErrorKind::InvalidUrl {
                reason: reason.into(),
            },
        )
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_location() {
        let located = ConfigError::Parse {
            path: "gateway.yaml".into(),
            location: Some((3, 7)),
            message: "bad indent".into(),
        };
        assert_eq!(
            located.to_string(),
            "cannot parse config 'gateway.yaml' at 3:7: bad indent"
        );

        let unlocated = ConfigError::Parse {
            path: "gateway.yaml".into(),
            location: None,
            message: "empty".into(),
        };
        assert_eq!(unlocated.to_string(), "cannot parse config 'gateway.yaml': empty");
    }

    #[test]
    fn test_validation_message() {
        let err = ValidationError::duplicate("tasks.chat.models[1]", "gemini-pro")
            .with_context("A model may appear only once per task");
        assert_eq!(
            err.to_string(),
            "invalid config field 'tasks.chat.models[1]': 'gemini-pro' is listed more than once (A model may appear only once per task)"
        );

        let wrapped: ConfigError = ValidationError::required("version").into();
        assert_eq!(wrapped.to_string(), "invalid config field 'version': value is required");
    }
}
