pub mod document;
pub mod error;
pub mod http;
pub mod memory;
pub mod open;
mod retry;

pub use document::{DocumentStore, RawDocument, SnapshotListener, Subscription};
pub use error::StoreError;
pub use http::{HttpStore, HttpStoreOptions};
pub use memory::MemoryStore;
pub use open::open_store;
