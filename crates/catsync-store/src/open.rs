//! Builds the configured [`DocumentStore`] backend.

use std::sync::Arc;
use std::time::Duration;

use catsync_core::{AppConfig, StoreTarget};

use crate::document::DocumentStore;
use crate::error::StoreError;
use crate::http::{HttpStore, HttpStoreOptions};
use crate::memory::MemoryStore;

/// Opens the store selected by `config.store`.
///
/// The in-memory backend is seeded from `config.seed_path` when set.
///
/// # Errors
///
/// - [`StoreError::InvalidStoreUrl`] / [`StoreError::Http`] if the HTTP client
///   cannot be built.
/// - [`StoreError::Seed`] if the seed file cannot be loaded.
pub fn open_store(config: &AppConfig) -> Result<Arc<dyn DocumentStore>, StoreError> {
    match &config.store {
        StoreTarget::Http(base_url) => {
            let options = HttpStoreOptions {
                request_timeout_secs: config.store_request_timeout_secs,
                user_agent: config.store_user_agent.clone(),
                token: config.store_token.clone(),
                max_retries: config.store_max_retries,
                backoff_base_ms: config.store_retry_backoff_base_ms,
                poll_interval: Duration::from_millis(config.poll_interval_ms),
            };
            tracing::info!(base_url = %base_url, "using HTTP document store");
            Ok(Arc::new(HttpStore::new(base_url, options)?))
        }
        StoreTarget::Memory => {
            let store = match &config.seed_path {
                Some(path) => MemoryStore::from_seed_file(path, &config.collection)?,
                None => {
                    tracing::warn!("using empty in-memory document store; set CATSYNC_SEED_PATH to seed it");
                    MemoryStore::new()
                }
            };
            Ok(Arc::new(store))
        }
    }
}
