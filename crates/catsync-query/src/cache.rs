use std::sync::Arc;

use catsync_core::{CatalogSnapshot, Product};

use crate::engine::apply;
use crate::query::QueryState;

struct CacheEntry {
    catalog: CatalogSnapshot,
    query: QueryState,
    result: Arc<[Product]>,
}

/// Single-entry memo for [`apply`].
///
/// The key is the snapshot's identity plus the full query state: snapshots
/// are replaced wholesale on every sync, so pointer equality is exactly
/// "same catalog".
#[derive(Default)]
pub struct QueryCache {
    entry: Option<CacheEntry>,
    hits: u64,
    misses: u64,
}

impl QueryCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached result if neither input changed, otherwise
    /// recomputes and stores it.
    pub fn get_or_compute(
        &mut self,
        catalog: &CatalogSnapshot,
        query: &QueryState,
    ) -> Arc<[Product]> {
        if let Some(entry) = &self.entry {
            if Arc::ptr_eq(&entry.catalog, catalog) && entry.query == *query {
                self.hits += 1;
                return Arc::clone(&entry.result);
            }
        }
        self.misses += 1;
        let result: Arc<[Product]> = apply(catalog, query).into();
        tracing::debug!(
            catalog_len = catalog.len(),
            result_len = result.len(),
            "recomputed catalog query"
        );
        self.entry = Some(CacheEntry {
            catalog: Arc::clone(catalog),
            query: query.clone(),
            result: Arc::clone(&result),
        });
        result
    }

    pub fn invalidate(&mut self) {
        self.entry = None;
    }

    #[must_use]
    pub fn hits(&self) -> u64 {
        self.hits
    }

    #[must_use]
    pub fn misses(&self) -> u64 {
        self.misses
    }
}

impl std::fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryCache")
            .field("cached", &self.entry.is_some())
            .field("hits", &self.hits)
            .field("misses", &self.misses)
            .finish()
    }
}
