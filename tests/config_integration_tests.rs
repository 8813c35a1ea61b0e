// Configuration system integration tests

use content_store::config::{load_config, load_config_with_env, BackendSpec, ConfigLoader};
use content_store::BackendFactory;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn write_config(dir: &TempDir, content: &str) -> PathBuf {
    let path = dir.path().join("config.yaml");
    fs::write(&path, content).expect("Failed to write temp config");
    path
}

#[test]
fn test_load_default_config() {
    let config_path = PathBuf::from("config/default.yaml");

    if config_path.exists() {
        let result = load_config(&config_path);
        assert!(result.is_ok(), "Failed to load default config: {:?}", result.err());

        let config = result.unwrap();

        let kinds: Vec<&str> = config.backends.iter().map(|b| b.kind()).collect();
        assert_eq!(kinds, vec!["filesystem", "memory", "http"]);
        assert!(!config.security.enabled);
        assert_eq!(config.security.exempt_paths, vec!["/ping".to_string()]);
        assert_eq!(config.logging.level, "info");

        let http = config.backends[2].as_http().unwrap();
        assert_eq!(http.key_pattern, r"^DM-(\d+)$");
        assert!(http.resource_url.ends_with("/{id}.json"));
    }
}

#[test]
fn test_config_with_env_vars() {
    let temp_config = r#"
backends:
  - type: filesystem
    base_path: ${CS_TEST_RECORDS_DIR:-/tmp/default-records}
  - type: http
    resource_url: ${CS_TEST_API_URL:-http://default:8080}/items/{id}
    key_pattern: "^DM-(\\d+)$"
    api_token: ${CS_TEST_API_TOKEN}

logging:
  level: debug
"#;

    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, temp_config);

    std::env::set_var("CS_TEST_API_URL", "http://testhost:9000");
    std::env::remove_var("CS_TEST_RECORDS_DIR");

    let result = load_config(&path);
    assert!(result.is_ok(), "Failed to load config with env vars: {:?}", result.err());

    let config = result.unwrap();

    let fs_config = config.backends[0].as_filesystem().expect("Expected filesystem config");
    assert_eq!(fs_config.base_path, "/tmp/default-records"); // Uses default

    let http = config.backends[1].as_http().expect("Expected HTTP config");
    assert_eq!(http.resource_url, "http://testhost:9000/items/{id}");
    assert_eq!(http.timeout_seconds, 30);
    assert_eq!(http.max_retries, 2);
    assert_eq!(config.logging.level, "debug");

    std::env::remove_var("CS_TEST_API_URL");
}

#[test]
fn test_memory_only_config() {
    let config = ConfigLoader::parse("backends:\n  - type: memory\n").unwrap();
    assert!(matches!(config.backends[0], BackendSpec::Memory));
    assert_eq!(config.logging.level, "info");
    assert!(!config.security.enabled);
}

#[test]
fn test_unknown_backend_type_rejected() {
    let result = ConfigLoader::parse("backends:\n  - type: dynamo\n");
    assert!(result.is_err());
}

#[test]
fn test_empty_backend_list_rejected() {
    let result = ConfigLoader::parse("backends: []\n");
    assert!(result.is_err());
    let message = format!("{:#}", result.unwrap_err());
    assert!(message.contains("at least one backend"));
}

#[test]
fn test_missing_file() {
    let result = load_config("/nonexistent/content-store.yaml");
    assert!(result.is_err());
}

#[test]
fn test_token_override_from_environment() {
    let temp_config = r#"
backends:
  - type: memory
security:
  enabled: true
"#;
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, temp_config);

    // Without an override the enabled-but-tokenless config is invalid
    std::env::remove_var("CONTENT_STORE_TOKEN");
    assert!(load_config_with_env(&path).is_err());

    std::env::set_var("CONTENT_STORE_TOKEN", "from-env");
    let config = load_config_with_env(&path).unwrap();
    assert_eq!(config.security.token.as_deref(), Some("from-env"));
    std::env::remove_var("CONTENT_STORE_TOKEN");
}

#[test]
fn test_config_builds_orchestrator() {
    let dir = TempDir::new().unwrap();
    let temp_config = format!(
        "backends:\n  - type: memory\n  - type: filesystem\n    base_path: {}\n",
        dir.path().display()
    );
    let config = ConfigLoader::parse(&temp_config).unwrap();
    let orchestrator = BackendFactory::build_orchestrator(&config).unwrap();
    assert_eq!(orchestrator.backends().len(), 2);
    assert_eq!(orchestrator.primary().backend_type(), "memory");
}
