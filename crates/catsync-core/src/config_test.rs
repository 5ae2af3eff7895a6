use std::collections::HashMap;
use std::env::VarError;

use super::*;

fn lookup_from_map<'a>(
    map: &'a HashMap<&'a str, &'a str>,
) -> impl Fn(&str) -> Result<String, VarError> + 'a {
    move |key| {
        map.get(key)
            .map(|v| (*v).to_string())
            .ok_or(VarError::NotPresent)
    }
}

/// Returns a map with all required env vars populated with valid defaults.
fn full_env<'a>() -> HashMap<&'a str, &'a str> {
    let mut m = HashMap::new();
    m.insert("CATSYNC_STORE_URL", "https://store.example.com/v1/");
    m
}

#[test]
fn parse_environment_development() {
    assert_eq!(
        parse_environment("development").unwrap(),
        Environment::Development
    );
}

#[test]
fn parse_environment_test() {
    assert_eq!(parse_environment("test").unwrap(), Environment::Test);
}

#[test]
fn parse_environment_production() {
    assert_eq!(
        parse_environment("production").unwrap(),
        Environment::Production
    );
}

#[test]
fn parse_environment_unknown_fails() {
    let err = parse_environment("staging").unwrap_err();
    assert!(matches!(err, ConfigError::InvalidEnvVar { ref var, .. } if var == "CATSYNC_ENV"));
}

#[test]
fn parse_store_target_memory_is_case_insensitive() {
    assert_eq!(parse_store_target("MEMORY").unwrap(), StoreTarget::Memory);
}

#[test]
fn parse_store_target_strips_trailing_slash() {
    assert_eq!(
        parse_store_target("http://localhost:8080/").unwrap(),
        StoreTarget::Http("http://localhost:8080".to_string())
    );
}

#[test]
fn parse_store_target_rejects_other_schemes() {
    let err = parse_store_target("ftp://store.example.com").unwrap_err();
    assert!(
        matches!(err, ConfigError::InvalidEnvVar { ref var, .. } if var == "CATSYNC_STORE_URL")
    );
}

#[test]
fn build_app_config_fails_without_store_url() {
    let map: HashMap<&str, &str> = HashMap::new();
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::MissingEnvVar(ref v)) if v == "CATSYNC_STORE_URL"),
        "expected MissingEnvVar(CATSYNC_STORE_URL), got: {result:?}"
    );
}

#[test]
fn build_app_config_fails_with_invalid_bind_addr() {
    let mut map = full_env();
    map.insert("CATSYNC_BIND_ADDR", "not-a-socket-addr");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "CATSYNC_BIND_ADDR"),
        "expected InvalidEnvVar(CATSYNC_BIND_ADDR), got: {result:?}"
    );
}

#[test]
fn build_app_config_succeeds_with_all_required_vars() {
    let map = full_env();
    let result = build_app_config(lookup_from_map(&map));
    assert!(result.is_ok(), "expected Ok, got: {result:?}");
    let cfg = result.unwrap();
    assert_eq!(
        cfg.store,
        StoreTarget::Http("https://store.example.com/v1".to_string())
    );
    assert!(cfg.store_token.is_none());
    assert!(cfg.seed_path.is_none());
    assert_eq!(cfg.env, Environment::Development);
    assert_eq!(cfg.collection, "products");
    assert_eq!(cfg.bind_addr.to_string(), "0.0.0.0:3000");
    assert_eq!(cfg.log_level, "info");
    assert_eq!(cfg.store_request_timeout_secs, 30);
    assert_eq!(cfg.store_user_agent, "catsync/0.1 (catalog-sync)");
    assert_eq!(cfg.store_max_retries, 3);
    assert_eq!(cfg.store_retry_backoff_base_ms, 500);
    assert_eq!(cfg.poll_interval_ms, 5000);
    assert_eq!(cfg.refresh_cron, "0 */5 * * * *");
}

#[test]
fn build_app_config_memory_store_with_seed_path() {
    let mut map = full_env();
    map.insert("CATSYNC_STORE_URL", "memory");
    map.insert("CATSYNC_SEED_PATH", "./config/seed.yaml");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.store, StoreTarget::Memory);
    assert_eq!(
        cfg.seed_path.as_deref(),
        Some(std::path::Path::new("./config/seed.yaml"))
    );
}

#[test]
fn build_app_config_blank_token_is_treated_as_absent() {
    let mut map = full_env();
    map.insert("CATSYNC_STORE_TOKEN", "   ");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert!(cfg.store_token.is_none());
}

#[test]
fn debug_output_redacts_store_token() {
    let mut map = full_env();
    map.insert("CATSYNC_STORE_TOKEN", "super-secret");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    let debug = format!("{cfg:?}");
    assert!(!debug.contains("super-secret"));
    assert!(debug.contains("[redacted]"));
}

#[test]
fn build_app_config_rejects_empty_collection() {
    let mut map = full_env();
    map.insert("CATSYNC_COLLECTION", " ");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "CATSYNC_COLLECTION"),
        "expected InvalidEnvVar(CATSYNC_COLLECTION), got: {result:?}"
    );
}

#[test]
fn store_max_retries_override() {
    let mut map = full_env();
    map.insert("CATSYNC_STORE_MAX_RETRIES", "0");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.store_max_retries, 0);
}

#[test]
fn store_max_retries_invalid() {
    let mut map = full_env();
    map.insert("CATSYNC_STORE_MAX_RETRIES", "many");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "CATSYNC_STORE_MAX_RETRIES"),
        "expected InvalidEnvVar(CATSYNC_STORE_MAX_RETRIES), got: {result:?}"
    );
}

#[test]
fn poll_interval_override() {
    let mut map = full_env();
    map.insert("CATSYNC_POLL_INTERVAL_MS", "250");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.poll_interval_ms, 250);
}

#[test]
fn poll_interval_zero_is_rejected() {
    let mut map = full_env();
    map.insert("CATSYNC_POLL_INTERVAL_MS", "0");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "CATSYNC_POLL_INTERVAL_MS"),
        "expected InvalidEnvVar(CATSYNC_POLL_INTERVAL_MS), got: {result:?}"
    );
}

#[test]
fn request_timeout_invalid() {
    let mut map = full_env();
    map.insert("CATSYNC_STORE_REQUEST_TIMEOUT_SECS", "-5");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "CATSYNC_STORE_REQUEST_TIMEOUT_SECS"),
        "expected InvalidEnvVar(CATSYNC_STORE_REQUEST_TIMEOUT_SECS), got: {result:?}"
    );
}
