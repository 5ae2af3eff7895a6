//! In-process [`DocumentStore`] used for local runs, demos, and tests.
//!
//! Every write re-delivers the full collection listing to that collection's
//! subscribers, mirroring the contract of a hosted document store. Faults
//! can be injected to exercise the sync layer's failure paths.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use catsync_core::{ConfigError, SeedDocument};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::document::{DocumentStore, RawDocument, SnapshotListener, Subscription};
use crate::error::StoreError;

#[derive(Default)]
struct Faults {
    list: Option<String>,
    subscribe: Option<String>,
    write: Option<String>,
}

#[derive(Default)]
struct MemoryState {
    collections: HashMap<String, BTreeMap<String, Value>>,
    listeners: BTreeMap<u64, (String, Arc<dyn SnapshotListener>)>,
    next_listener_id: u64,
    faults: Faults,
}

impl MemoryState {
    fn listing(&self, collection: &str) -> Vec<RawDocument> {
        self.collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, fields)| RawDocument::new(id.clone(), fields.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn listeners_for(&self, collection: &str) -> Vec<Arc<dyn SnapshotListener>> {
        self.listeners
            .values()
            .filter(|(c, _)| c == collection)
            .map(|(_, listener)| Arc::clone(listener))
            .collect()
    }
}

/// Thread-safe in-memory document store. Cloning shares the same data.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store whose `collection` holds the documents of a seed file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the seed file cannot be read or is invalid.
    pub fn from_seed_file(path: &Path, collection: &str) -> Result<Self, ConfigError> {
        let seed = catsync_core::load_seed_file(path)?;
        let store = Self::new();
        store.seed(collection, seed.products);
        tracing::info!(
            path = %path.display(),
            collection,
            count = store.len(collection),
            "seeded in-memory document store"
        );
        Ok(store)
    }

    /// Inserts seed documents, assigning ids to those without one.
    /// Subscribers are notified once, after all documents are in place.
    pub fn seed(&self, collection: &str, documents: Vec<SeedDocument>) {
        let mut state = self.lock();
        let docs = state.collections.entry(collection.to_owned()).or_default();
        for doc in documents {
            let id = doc.id.unwrap_or_else(|| Uuid::new_v4().to_string());
            docs.insert(id, Value::Object(doc.fields));
        }
        Self::notify(state, collection);
    }

    /// Stores `fields` verbatim under `id`, replacing any existing document.
    ///
    /// Unlike [`DocumentStore::create`], the body need not be an object,
    /// which lets callers model malformed remote data.
    pub fn put_document(&self, collection: &str, id: &str, fields: Value) {
        let mut state = self.lock();
        state
            .collections
            .entry(collection.to_owned())
            .or_default()
            .insert(id.to_owned(), fields);
        Self::notify(state, collection);
    }

    /// Number of documents in `collection`.
    #[must_use]
    pub fn len(&self, collection: &str) -> usize {
        self.lock().collections.get(collection).map_or(0, BTreeMap::len)
    }

    #[must_use]
    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }

    /// Number of live subscriptions across all collections.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.lock().listeners.len()
    }

    /// Makes every subsequent `list_all` fail with `message` until cleared.
    pub fn fail_lists(&self, message: impl Into<String>) {
        self.lock().faults.list = Some(message.into());
    }

    /// Makes every subsequent `subscribe` fail with `message` until cleared.
    pub fn fail_subscribes(&self, message: impl Into<String>) {
        self.lock().faults.subscribe = Some(message.into());
    }

    /// Makes every subsequent create/update/delete fail with `message` until cleared.
    pub fn fail_writes(&self, message: impl Into<String>) {
        self.lock().faults.write = Some(message.into());
    }

    pub fn clear_faults(&self) {
        self.lock().faults = Faults::default();
    }

    /// Delivers a subscription-level error to every subscriber of `collection`.
    pub fn emit_error(&self, collection: &str, message: &str) {
        let listeners = self.lock().listeners_for(collection);
        for listener in listeners {
            listener.on_error(StoreError::Unavailable(message.to_owned()));
        }
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Releases `state` and then pushes the current listing to subscribers,
    /// so listeners never run while the store lock is held.
    fn notify(state: MutexGuard<'_, MemoryState>, collection: &str) {
        let listeners = state.listeners_for(collection);
        if listeners.is_empty() {
            return;
        }
        let listing = state.listing(collection);
        drop(state);
        for listener in listeners {
            listener.on_snapshot(listing.clone());
        }
    }

    fn check_write_fault(state: &MemoryState) -> Result<(), StoreError> {
        match &state.faults.write {
            Some(message) => Err(StoreError::Unavailable(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn list_all(&self, collection: &str) -> Result<Vec<RawDocument>, StoreError> {
        let state = self.lock();
        if let Some(message) = &state.faults.list {
            return Err(StoreError::Unavailable(message.clone()));
        }
        Ok(state.listing(collection))
    }

    fn subscribe(
        &self,
        collection: &str,
        listener: Arc<dyn SnapshotListener>,
    ) -> Result<Subscription, StoreError> {
        let mut state = self.lock();
        if let Some(message) = &state.faults.subscribe {
            return Err(StoreError::Unavailable(message.clone()));
        }

        let id = state.next_listener_id;
        state.next_listener_id += 1;
        state
            .listeners
            .insert(id, (collection.to_owned(), Arc::clone(&listener)));
        let listing = state.listing(collection);
        drop(state);

        tracing::debug!(collection, listener_id = id, "memory store subscription opened");

        let inner = Arc::clone(&self.inner);
        let subscription = Subscription::new(move || {
            inner
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .listeners
                .remove(&id);
            tracing::debug!(listener_id = id, "memory store subscription released");
        });

        listener.on_snapshot(listing);
        Ok(subscription)
    }

    async fn create(
        &self,
        collection: &str,
        fields: Map<String, Value>,
    ) -> Result<String, StoreError> {
        let mut state = self.lock();
        Self::check_write_fault(&state)?;
        let id = Uuid::new_v4().to_string();
        state
            .collections
            .entry(collection.to_owned())
            .or_default()
            .insert(id.clone(), Value::Object(fields));
        Self::notify(state, collection);
        Ok(id)
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<(), StoreError> {
        let mut state = self.lock();
        Self::check_write_fault(&state)?;
        let existing = state
            .collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.to_owned(),
                id: id.to_owned(),
            })?;

        match existing {
            Value::Object(current) => current.extend(fields),
            other => *other = Value::Object(fields),
        }
        Self::notify(state, collection);
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let mut state = self.lock();
        Self::check_write_fault(&state)?;
        let removed = state
            .collections
            .get_mut(collection)
            .and_then(|docs| docs.remove(id));
        if removed.is_none() {
            return Err(StoreError::NotFound {
                collection: collection.to_owned(),
                id: id.to_owned(),
            });
        }
        Self::notify(state, collection);
        Ok(())
    }
}
