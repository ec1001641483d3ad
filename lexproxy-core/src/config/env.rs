//! `${VAR}` expansion in configuration sources

use super::error::ConfigError;
use super::schema::GatewayConfig;
use super::secrets::SecretString;
use regex::{Captures, Regex};
use std::env;
use std::sync::OnceLock;

fn env_var_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").expect("env var pattern is a valid regex")
    })
}

/// Names of all `${VAR}` references in a string, in order of appearance
pub fn referenced_vars(text: &str) -> Vec<String> {
    env_var_pattern()
        .captures_iter(text)
        .map(|cap| cap[1].to_string())
        .collect()
}

/// Replace every `${VAR}` with the value of `VAR`; the first unset
/// variable aborts with `MissingEnvVar`
pub fn interpolate_env_vars(content: &str) -> Result<String, ConfigError> {
    if let Some(var) = referenced_vars(content)
        .into_iter()
        .find(|name| env::var(name).is_err())
    {
        return Err(ConfigError::MissingEnvVar { var });
    }

    let expanded = env_var_pattern().replace_all(content, |cap: &Captures<'_>| {
        env::var(&cap[1]).unwrap_or_default()
    });
    Ok(expanded.into_owned())
}

/// Interpolate the fields that may still hold placeholders after parsing
/// (values written as plain YAML scalars are interpolated before parsing,
/// this covers configs built programmatically)
pub fn interpolate_config_env_vars(config: &mut GatewayConfig) -> Result<(), ConfigError> {
    if let Some(api_key) = &config.upstream.api_key {
        if env_var_pattern().is_match(api_key.expose_secret()) {
            let interpolated = interpolate_env_vars(api_key.expose_secret())?;
            config.upstream.api_key = Some(SecretString::new(interpolated));
        }
    }

    if env_var_pattern().is_match(&config.upstream.base_url) {
        config.upstream.base_url = interpolate_env_vars(&config.upstream.base_url)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interpolate_env_vars() {
        env::set_var("LEXPROXY_TEST_VAR", "test_value");

        let content = "api_key: ${LEXPROXY_TEST_VAR}\nbase_url: http://${LEXPROXY_TEST_VAR}/v1";
        let result = interpolate_env_vars(content).unwrap();
        assert_eq!(result, "api_key: test_value\nbase_url: http://test_value/v1");

        env::remove_var("LEXPROXY_TEST_VAR");
    }

    #[test]
    fn test_missing_env_var() {
        let content = "api_key: ${LEXPROXY_MISSING_VAR}";
        let result = interpolate_env_vars(content);

        match result {
            Err(ConfigError::MissingEnvVar { var }) => assert_eq!(var, "LEXPROXY_MISSING_VAR"),
            other => panic!("Expected MissingEnvVar error, got {:?}", other),
        }
    }

    #[test]
    fn test_config_fields_interpolated() {
        env::set_var("LEXPROXY_TEST_KEY", "AIzaInterpolated");

        let mut config = GatewayConfig::default().with_api_key("${LEXPROXY_TEST_KEY}");
        interpolate_config_env_vars(&mut config).unwrap();
        assert_eq!(
            config.upstream.api_key.unwrap().expose_secret(),
            "AIzaInterpolated"
        );

        env::remove_var("LEXPROXY_TEST_KEY");
    }

    #[test]
    fn test_referenced_vars() {
        let vars = referenced_vars("key: ${API_KEY}, url: ${LEXPROXY_BASE_URL}");
        assert_eq!(vars, vec!["API_KEY", "LEXPROXY_BASE_URL"]);
    }
}
