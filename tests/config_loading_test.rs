mod common;

use std::io::Write;
use std::time::Duration;
use storage_resilience::config::{CircuitBreakerConfig, ConfigLoader, ConfigurationError};

fn toml_file(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("Failed to create temp config file");
    file.write_all(contents.as_bytes())
        .expect("Failed to write temp config file");
    file
}

#[test]
fn test_file_values_with_per_field_fallback() {
    common::init_test_logging();
    let file = toml_file(
        r#"
name = "s3-primary"
failure_threshold = 7
timeout_ms = "soon"
half_open_max_calls = 500
success_threshold = 2
enabled = "off"
metrics_enabled = true
health_check_interval_ms = 60000
"#,
    );

    let loaded = ConfigLoader::new()
        .with_prefix("SR_CFG_FILE_ONLY_TEST")
        .with_file(file.path())
        .load()
        .expect("File load should succeed");

    let breaker = &loaded.breaker;
    assert_eq!(breaker.name, "s3-primary");
    assert_eq!(breaker.failure_threshold, 7);
    assert_eq!(breaker.timeout, Duration::from_millis(30_000));
    assert_eq!(breaker.half_open_max_calls, 3);
    assert_eq!(breaker.success_threshold, 2);
    assert!(!breaker.enabled);
    assert!(breaker.metrics_enabled);
    assert_eq!(loaded.factory.health_check_interval, Duration::from_secs(60));

    let fields: Vec<_> = loaded.warnings.iter().filter_map(|w| w.field()).collect();
    assert_eq!(fields.len(), 2);
    assert!(fields.contains(&"TIMEOUT_MS"));
    assert!(fields.contains(&"HALF_OPEN_MAX_CALLS"));
}

#[test]
fn test_environment_overrides_file() {
    let file = toml_file("failure_threshold = 7\nmax_history_size = 50\n");
    std::env::set_var("SR_CFG_OVERRIDE_TEST_FAILURE_THRESHOLD", "9");

    let loaded = ConfigLoader::new()
        .with_prefix("SR_CFG_OVERRIDE_TEST")
        .with_file(file.path())
        .load()
        .expect("Load should succeed");

    std::env::remove_var("SR_CFG_OVERRIDE_TEST_FAILURE_THRESHOLD");

    assert_eq!(loaded.breaker.failure_threshold, 9);
    assert_eq!(loaded.breaker.max_history_size, 50);
    assert!(!loaded.has_warnings());
}

#[test]
fn test_unparseable_file_is_a_hard_error() {
    let file = toml_file("failure_threshold = = 3\n");

    let result = ConfigLoader::new()
        .with_prefix("SR_CFG_BROKEN_TEST")
        .with_file(file.path())
        .load();

    assert!(matches!(result, Err(ConfigurationError::ParseError { .. })));
}

#[test]
fn test_oversized_file_is_rejected() {
    let padding = format!("# {}\n", "x".repeat(2 * 1024 * 1024));
    let file = toml_file(&padding);

    let result = ConfigLoader::new()
        .with_prefix("SR_CFG_OVERSIZED_TEST")
        .with_file(file.path())
        .load();

    assert!(matches!(result, Err(ConfigurationError::FileReadError { .. })));
}

#[test]
fn test_map_loading_never_fails() {
    let loaded = ConfigLoader::load_from_map([
        ("failure_threshold", "0"),
        ("TIMEOUT_MS", "999999999"),
        ("half_open_max_calls", "-4"),
        ("SUCCESS_THRESHOLD", ""),
        ("max_history_size", "9"),
        ("enabled", "maybe"),
        ("name", "   "),
        ("reopen_on_half_open_failure", "no"),
    ]);

    let defaults = CircuitBreakerConfig::default();
    assert_eq!(loaded.breaker.failure_threshold, defaults.failure_threshold);
    assert_eq!(loaded.breaker.timeout, defaults.timeout);
    assert_eq!(loaded.breaker.half_open_max_calls, defaults.half_open_max_calls);
    assert_eq!(loaded.breaker.success_threshold, defaults.success_threshold);
    assert_eq!(loaded.breaker.max_history_size, defaults.max_history_size);
    assert!(loaded.breaker.enabled);
    assert_eq!(loaded.breaker.name, "default");
    assert!(!loaded.breaker.reopen_on_half_open_failure);

    // Blank SUCCESS_THRESHOLD counts as unset; every other bad value is reported
    assert_eq!(loaded.warnings.len(), 6);
}
