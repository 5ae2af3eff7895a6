use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Which document store backend the catalog syncs against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreTarget {
    /// REST document store rooted at this base URL.
    Http(String),
    /// In-process store, optionally seeded from a YAML file.
    Memory,
}

impl std::fmt::Display for StoreTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreTarget::Http(url) => write!(f, "{url}"),
            StoreTarget::Memory => write!(f, "memory"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub store: StoreTarget,
    pub store_token: Option<String>,
    pub seed_path: Option<PathBuf>,
    pub env: Environment,
    pub collection: String,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub store_request_timeout_secs: u64,
    pub store_user_agent: String,
    pub store_max_retries: u32,
    pub store_retry_backoff_base_ms: u64,
    pub poll_interval_ms: u64,
    pub refresh_cron: String,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("store", &self.store)
            .field(
                "store_token",
                &self.store_token.as_ref().map(|_| "[redacted]"),
            )
            .field("seed_path", &self.seed_path)
            .field("env", &self.env)
            .field("collection", &self.collection)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field(
                "store_request_timeout_secs",
                &self.store_request_timeout_secs,
            )
            .field("store_user_agent", &self.store_user_agent)
            .field("store_max_retries", &self.store_max_retries)
            .field(
                "store_retry_backoff_base_ms",
                &self.store_retry_backoff_base_ms,
            )
            .field("poll_interval_ms", &self.poll_interval_ms)
            .field("refresh_cron", &self.refresh_cron)
            .finish()
    }
}
