use std::fmt;

use catsync_core::{CatalogSnapshot, Product};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Lifecycle of a [`crate::SyncManager`].
///
/// ```text
/// Initializing -> Subscribed <-> Reloading -> Degraded
///        \______________________________________/
///                        |
///                    Disposed (terminal, from any state)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncPhase {
    Initializing,
    /// Live subscription held and the last listing published cleanly.
    Subscribed,
    /// Recovering from a stream error, or serving a listing without a live
    /// subscription.
    Reloading,
    /// The last fetch failed; the catalog is empty.
    Degraded,
    Disposed,
}

impl SyncPhase {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Initializing => "initializing",
            Self::Subscribed => "subscribed",
            Self::Reloading => "reloading",
            Self::Degraded => "degraded",
            Self::Disposed => "disposed",
        }
    }
}

impl fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Observable catalog state published by the sync manager.
///
/// `products` is replaced wholesale on every publish; holders of an older
/// snapshot keep a consistent view.
#[derive(Debug, Clone)]
pub struct CatalogState {
    pub products: CatalogSnapshot,
    /// `true` until the first listing lands and while a fallback reload runs.
    pub loading: bool,
    /// User-visible description of the most recent sync failure.
    pub error: Option<String>,
    /// Incremented on every publish.
    pub revision: u64,
    pub updated_at: Option<DateTime<Utc>>,
}

impl CatalogState {
    pub(crate) fn initial() -> Self {
        Self {
            products: CatalogSnapshot::from(Vec::new()),
            loading: true,
            error: None,
            revision: 0,
            updated_at: None,
        }
    }

    /// Looks up a product by id.
    #[must_use]
    pub fn product(&self, id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}
