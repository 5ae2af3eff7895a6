use catsync_store::StoreError;
use thiserror::Error;

/// Why a single raw document was kept out of the catalog.
///
/// Rejections are per-record and never abort a sync.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecordRejected {
    #[error("document {id} is not an object (found {found})")]
    NotAnObject { id: String, found: &'static str },

    #[error("document {id} has an empty name")]
    EmptyName { id: String },

    #[error("document {id} has non-positive price {price}")]
    NonPositivePrice { id: String, price: f64 },

    #[error("document {id} has no primary image")]
    MissingImage { id: String },
}

impl RecordRejected {
    /// Id of the offending document.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            RecordRejected::NotAnObject { id, .. }
            | RecordRejected::EmptyName { id }
            | RecordRejected::NonPositivePrice { id, .. }
            | RecordRejected::MissingImage { id } => id,
        }
    }
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("failed to load products from {collection}: {source}")]
    FetchFailed {
        collection: String,
        #[source]
        source: StoreError,
    },

    #[error("live updates for {collection} interrupted: {source}")]
    SubscriptionFailed {
        collection: String,
        #[source]
        source: StoreError,
    },

    #[error("sync manager for {collection} has been disposed")]
    Disposed { collection: String },
}

#[derive(Debug, Error)]
pub enum MutationError {
    #[error("invalid product: {0}")]
    InvalidProduct(#[from] RecordRejected),

    #[error("product id must not be empty")]
    MissingId,

    #[error("update for {id} contains no recognised product fields")]
    EmptyUpdate { id: String },

    #[error("{operation} failed on {collection}: {source}")]
    Store {
        operation: &'static str,
        collection: String,
        #[source]
        source: StoreError,
    },
}

impl MutationError {
    /// Returns `true` if the store reported the target document as missing.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            MutationError::Store {
                source: StoreError::NotFound { .. },
                ..
            }
        )
    }
}
