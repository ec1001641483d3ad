//! Configuration validation utilities

use super::env::referenced_vars;
use super::error::ValidationError;
use super::schema::GatewayConfig;
use regex::Regex;
use tracing::warn;

/// Configuration validator with additional validation rules
pub struct ConfigValidator {
    /// Pattern for sensitive variable names
    sensitive_pattern: Regex,
    /// Pattern matching an `api_key:` entry in a raw config file
    api_key_line: Regex,
}

impl Default for ConfigValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigValidator {
    /// Create a new validator
    pub fn new() -> Self {
        Self {
            sensitive_pattern: Regex::new(r"(?i)(api_key|key|secret|token|credential)")
                .expect("sensitive pattern is a valid regex"),
            api_key_line: Regex::new(r#"(?m)^\s*"?api_key"?\s*:\s*"?([^"\s,]+)"?"#)
                .expect("api_key pattern is a valid regex"),
        }
    }

    /// Validate a configuration with extended rules
    pub fn validate(&self, config: &GatewayConfig) -> Result<(), ValidationError> {
        config.validate()?;

        for warning in self.advisories(config) {
            warn!("{}", warning);
        }

        Ok(())
    }

    /// Non-fatal findings about a valid configuration
    pub fn advisories(&self, config: &GatewayConfig) -> Vec<String> {
        let mut findings = Vec::new();

        for (name, profile) in [
            ("chat", &config.tasks.chat),
            ("translate", &config.tasks.translate),
        ] {
            if profile.models.len() == 1 {
                findings.push(format!(
                    "tasks.{} has a single model; fallback is disabled for this task",
                    name
                ));
            }
        }

        if config.fallback.on_status.is_empty() {
            findings.push("fallback.on_status is empty; only transport failures fall back".into());
        }

        findings
    }

    /// Findings about the raw file text, before interpolation
    pub fn inspect_source(&self, content: &str) -> Vec<String> {
        let mut findings = Vec::new();

        for cap in self.api_key_line.captures_iter(content) {
            let value = &cap[1];
            let vars = referenced_vars(value);
            if vars.is_empty() {
                findings.push(
                    "api_key is written literally in the configuration file; reference an environment variable instead".into(),
                );
            } else {
                for var in vars {
                    if !self.looks_like_credential(&var) {
                        findings.push(format!(
                            "api_key references '{}', which does not look like a credential variable",
                            var
                        ));
                    }
                }
            }
        }

        findings
    }

    fn looks_like_credential(&self, name: &str) -> bool {
        self.sensitive_pattern.is_match(name)
    }
}
