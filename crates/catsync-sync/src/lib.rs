//! Catalog synchronization: raw document normalization, the live sync
//! manager, and validated mutations.

mod coerce;
pub mod error;
pub mod manager;
pub mod mutator;
pub mod normalize;
pub mod state;

pub use error::{MutationError, RecordRejected, SyncError};
pub use manager::SyncManager;
pub use mutator::{CatalogMutator, PRODUCT_FIELDS};
pub use normalize::{normalize_batch, normalize_document, NormalizedBatch};
pub use state::{CatalogState, SyncPhase};
