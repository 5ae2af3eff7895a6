//! The remote document store capability the catalog is synchronized from.
//!
//! Stores hold untyped documents grouped into named collections. The sync
//! layer only needs a full listing, a live subscription that re-delivers the
//! full listing on every change, and thin create/update/delete calls.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// One untyped document as held by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDocument {
    pub id: String,
    /// Document body. Normally a JSON object, but stores make no promise.
    pub fields: serde_json::Value,
}

impl RawDocument {
    #[must_use]
    pub fn new(id: impl Into<String>, fields: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }
}

/// Callback pair receiving events from a live subscription.
///
/// `on_snapshot` always receives the complete current listing of the
/// collection, never a diff. `on_error` reports a subscription-level failure;
/// it is never called after the owning [`Subscription`] is released.
pub trait SnapshotListener: Send + Sync {
    fn on_snapshot(&self, documents: Vec<RawDocument>);
    fn on_error(&self, error: StoreError);
}

/// Handle to an active live subscription.
///
/// The underlying resource is released exactly once: on [`Subscription::unsubscribe`]
/// or when the handle is dropped, whichever happens first.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Stops event delivery and releases the subscription resource.
    pub fn unsubscribe(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

/// Abstract remote document store.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Lists every document currently in `collection`.
    async fn list_all(&self, collection: &str) -> Result<Vec<RawDocument>, StoreError>;

    /// Registers `listener` for full-collection snapshots of `collection`.
    ///
    /// Returns an error if the subscription cannot be established at all;
    /// failures after setup are reported through [`SnapshotListener::on_error`].
    fn subscribe(
        &self,
        collection: &str,
        listener: Arc<dyn SnapshotListener>,
    ) -> Result<Subscription, StoreError>;

    /// Creates a document and returns its store-assigned id.
    async fn create(
        &self,
        collection: &str,
        fields: serde_json::Map<String, serde_json::Value>,
    ) -> Result<String, StoreError>;

    /// Merges `fields` into an existing document.
    async fn update(
        &self,
        collection: &str,
        id: &str,
        fields: serde_json::Map<String, serde_json::Value>,
    ) -> Result<(), StoreError>;

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError>;
}
