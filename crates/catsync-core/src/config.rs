use crate::app_config::{AppConfig, Environment, StoreTarget};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so tests can drive it with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let store = parse_store_target(&require("CATSYNC_STORE_URL")?)?;
    let store_token = lookup("CATSYNC_STORE_TOKEN")
        .ok()
        .filter(|t| !t.trim().is_empty());
    let seed_path = lookup("CATSYNC_SEED_PATH").ok().map(PathBuf::from);

    let env = parse_environment(&or_default("CATSYNC_ENV", "development"))?;

    let collection = or_default("CATSYNC_COLLECTION", "products");
    if collection.trim().is_empty() {
        return Err(invalid(
            "CATSYNC_COLLECTION",
            "collection name must be non-empty".to_string(),
        ));
    }

    let bind_addr = or_default("CATSYNC_BIND_ADDR", "0.0.0.0:3000")
        .parse::<SocketAddr>()
        .map_err(|e| invalid("CATSYNC_BIND_ADDR", e.to_string()))?;
    let log_level = or_default("CATSYNC_LOG_LEVEL", "info");

    let store_request_timeout_secs = parse_u64("CATSYNC_STORE_REQUEST_TIMEOUT_SECS", "30")?;
    let store_user_agent = or_default("CATSYNC_STORE_USER_AGENT", "catsync/0.1 (catalog-sync)");
    let store_max_retries = parse_u32("CATSYNC_STORE_MAX_RETRIES", "3")?;
    let store_retry_backoff_base_ms = parse_u64("CATSYNC_STORE_RETRY_BACKOFF_BASE_MS", "500")?;

    let poll_interval_ms = parse_u64("CATSYNC_POLL_INTERVAL_MS", "5000")?;
    if poll_interval_ms == 0 {
        return Err(invalid(
            "CATSYNC_POLL_INTERVAL_MS",
            "poll interval must be greater than zero".to_string(),
        ));
    }

    let refresh_cron = or_default("CATSYNC_REFRESH_CRON", "0 */5 * * * *");

    Ok(AppConfig {
        store,
        store_token,
        seed_path,
        env,
        collection,
        bind_addr,
        log_level,
        store_request_timeout_secs,
        store_user_agent,
        store_max_retries,
        store_retry_backoff_base_ms,
        poll_interval_ms,
        refresh_cron,
    })
}

/// Parse `CATSYNC_STORE_URL` into a [`StoreTarget`].
///
/// `memory` selects the in-process store; anything else must be an
/// `http://` or `https://` base URL.
fn parse_store_target(raw: &str) -> Result<StoreTarget, ConfigError> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("memory") {
        return Ok(StoreTarget::Memory);
    }
    if raw.starts_with("http://") || raw.starts_with("https://") {
        return Ok(StoreTarget::Http(raw.trim_end_matches('/').to_string()));
    }
    Err(ConfigError::InvalidEnvVar {
        var: "CATSYNC_STORE_URL".to_string(),
        reason: format!("expected an http(s) URL or \"memory\", got \"{raw}\""),
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "production" => Ok(Environment::Production),
        "test" => Ok(Environment::Test),
        other => Err(ConfigError::InvalidEnvVar {
            var: "CATSYNC_ENV".to_string(),
            reason: format!("unknown environment \"{other}\""),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
