//! Integration tests for configuration loading and validation

use lexproxy_core::config::{
    load_from_json, load_from_path, load_from_yaml, ConfigError, GatewayConfig,
    ValidationErrorKind, API_KEY_ENV, DEFAULT_FALLBACK_MODEL, DEFAULT_PRIMARY_MODEL,
};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Helper to create a test config file
fn create_test_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_load_valid_yaml_config() {
    std::env::set_var("LEXPROXY_YAML_TEST_KEY", "AIzaYamlKey");

    let yaml = r#"
version: "0.1"
upstream:
  base_url: https://generativelanguage.googleapis.com/v1beta
  api_key: ${LEXPROXY_YAML_TEST_KEY}
tasks:
  chat:
    models: [gemini-pro, gemini-2.5-flash]
    temperature: 0.2
    max_output_tokens: 500
  translate:
    models: [gemini-2.5-flash]
    max_output_tokens: 250
fallback:
  on_status: [400, 404, 503]
backoff:
  max_attempts: 4
"#;

    let dir = TempDir::new().unwrap();
    let path = create_test_file(&dir, "gateway.yaml", yaml);

    let config = load_from_yaml(path).unwrap();
    assert_eq!(config.version, "0.1");
    assert_eq!(
        config.upstream.credential().unwrap().expose_secret(),
        "AIzaYamlKey"
    );
    assert_eq!(config.tasks.chat.models, vec!["gemini-pro", "gemini-2.5-flash"]);
    assert_eq!(config.tasks.translate.models, vec!["gemini-2.5-flash"]);
    assert!(config.fallback.triggers_on(503));
    let backoff = config.backoff.expect("backoff section");
    assert_eq!(backoff.max_attempts, 4);
    assert_eq!(backoff.base_delay_ms, 1000);

    std::env::remove_var("LEXPROXY_YAML_TEST_KEY");
}

#[test]
fn test_load_valid_json_config() {
    let json = r#"{
  "version": "0.1",
  "upstream": { "api_key": "AIzaJsonKey", "request_timeout_ms": 5000 },
  "tasks": {
    "chat": { "models": ["primary-model", "fallback-model"], "max_output_tokens": 300 }
  }
}"#;

    let dir = TempDir::new().unwrap();
    let path = create_test_file(&dir, "gateway.json", json);

    let config = load_from_json(path).unwrap();
    assert_eq!(config.upstream.request_timeout().as_millis(), 5000);
    assert_eq!(config.tasks.chat.max_output_tokens, 300);
    assert_eq!(
        config.tasks.translate.models,
        vec![DEFAULT_PRIMARY_MODEL, DEFAULT_FALLBACK_MODEL]
    );
    assert_eq!(config.tasks.translate.max_output_tokens, 250);
    assert_eq!(config.fallback.on_status, vec![400, 404]);
}

#[test]
fn test_minimal_config_uses_defaults() {
    let dir = TempDir::new().unwrap();
    let path = create_test_file(&dir, "minimal.yml", "version: \"0.1\"\n");

    let config = load_from_path(path).unwrap();
    assert!(config.upstream.credential().is_none());
    assert_eq!(config.tasks.chat.max_output_tokens, 500);
    assert!(config.backoff.is_none());
}

#[test]
fn test_missing_env_var_is_reported() {
    let yaml = r#"
version: "0.1"
upstream:
  api_key: ${LEXPROXY_DEFINITELY_UNSET_VAR}
"#;
    let dir = TempDir::new().unwrap();
    let path = create_test_file(&dir, "gateway.yaml", yaml);

    match load_from_yaml(path) {
        Err(ConfigError::MissingEnvVar { var }) => {
            assert_eq!(var, "LEXPROXY_DEFINITELY_UNSET_VAR")
        }
        other => panic!("expected MissingEnvVar, got {:?}", other),
    }
}

#[test]
fn test_unknown_field_is_parse_error() {
    let yaml = r#"
version: "0.1"
upstream:
  base_url: https://example.com
  region: us-east-1
"#;
    let dir = TempDir::new().unwrap();
    let path = create_test_file(&dir, "gateway.yaml", yaml);

    match load_from_yaml(&path) {
        Err(ConfigError::Parse { path: reported, message, .. }) => {
            assert_eq!(reported, path.to_string_lossy());
            assert!(message.contains("region"));
        }
        other => panic!("expected Parse, got {:?}", other),
    }
}

#[test]
fn test_duplicate_models_rejected() {
    let json = r#"{
  "version": "0.1",
  "tasks": { "chat": { "models": ["gemini-pro", "gemini-pro"], "max_output_tokens": 500 } }
}"#;
    let dir = TempDir::new().unwrap();
    let path = create_test_file(&dir, "gateway.json", json);

    match load_from_json(path) {
        Err(ConfigError::Invalid(err)) => {
            assert!(matches!(err.kind, ValidationErrorKind::Duplicate { .. }));
            assert!(err.field_path.starts_with("tasks.chat.models"));
        }
        other => panic!("expected ValidationError, got {:?}", other),
    }
}

#[test]
fn test_invalid_base_url_rejected() {
    let yaml = r#"
version: "0.1"
upstream:
  base_url: ftp://example.com/v1
"#;
    let dir = TempDir::new().unwrap();
    let path = create_test_file(&dir, "gateway.yaml", yaml);

    match load_from_yaml(path) {
        Err(ConfigError::Invalid(err)) => {
            assert_eq!(err.field_path, "upstream.base_url");
            assert!(matches!(err.kind, ValidationErrorKind::InvalidUrl { .. }));
        }
        other => panic!("expected ValidationError, got {:?}", other),
    }
}

#[test]
fn test_unsupported_extension() {
    let dir = TempDir::new().unwrap();
    let path = create_test_file(&dir, "gateway.toml", "version = \"0.1\"");

    assert!(matches!(
        load_from_path(path),
        Err(ConfigError::UnsupportedFormat { .. })
    ));
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = TempDir::new().unwrap();
    let result = load_from_yaml(dir.path().join("absent.yaml"));
    assert!(matches!(result, Err(ConfigError::Read { .. })));
}

#[test]
fn test_from_env_reads_key() {
    std::env::set_var(API_KEY_ENV, "AIzaFromEnv");
    let config = GatewayConfig::from_env();
    std::env::remove_var(API_KEY_ENV);

    assert_eq!(
        config.upstream.credential().unwrap().expose_secret(),
        "AIzaFromEnv"
    );
    assert!(config.validate().is_ok());
}

#[test]
fn test_debug_output_never_shows_key() {
    let config = GatewayConfig::default().with_api_key("AIzaSuperSecretValue");
    let rendered = format!("{:?}", config);
    assert!(!rendered.contains("AIzaSuperSecretValue"));
}
