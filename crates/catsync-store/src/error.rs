use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("rate limited by document store (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("document {id} not found in collection {collection}")]
    NotFound { collection: String, id: String },

    #[error("permission denied for {operation} on collection {collection}")]
    PermissionDenied {
        operation: &'static str,
        collection: String,
    },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("invalid document in collection {collection}: {reason}")]
    InvalidDocument { collection: String, reason: String },

    #[error("invalid store URL \"{url}\": {reason}")]
    InvalidStoreUrl { url: String, reason: String },

    #[error("document store unavailable: {0}")]
    Unavailable(String),

    #[error("failed to load seed data: {0}")]
    Seed(#[from] catsync_core::ConfigError),
}

impl StoreError {
    /// Returns `true` for conditions that may succeed if the same call is
    /// issued again later.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            StoreError::Http(e) => {
                e.is_timeout()
                    || e.is_connect()
                    || e.is_request()
                    || e.status().is_some_and(|s| s.is_server_error())
            }
            StoreError::RateLimited { .. } | StoreError::Unavailable(_) => true,
            StoreError::UnexpectedStatus { status, .. } => *status >= 500,
            StoreError::Deserialize { .. }
            | StoreError::NotFound { .. }
            | StoreError::PermissionDenied { .. }
            | StoreError::InvalidDocument { .. }
            | StoreError::InvalidStoreUrl { .. }
            | StoreError::Seed(_) => false,
        }
    }
}
