//! Keeps a live, normalized copy of one store collection.
//!
//! The manager owns one subscription and, at most, one outstanding fallback
//! fetch. Every publish happens under the lifecycle lock and is discarded
//! once the manager is disposed, so late callbacks and in-flight fetches can
//! never resurrect a torn-down catalog.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use catsync_core::CatalogSnapshot;
use catsync_store::{DocumentStore, RawDocument, SnapshotListener, StoreError, Subscription};
use chrono::Utc;
use tokio::runtime::Handle;
use tokio::sync::watch;

use crate::error::SyncError;
use crate::normalize::normalize_batch;
use crate::state::{CatalogState, SyncPhase};

struct Lifecycle {
    phase: SyncPhase,
    subscription: Option<Subscription>,
}

struct SyncInner {
    store: Arc<dyn DocumentStore>,
    collection: String,
    runtime: Handle,
    lifecycle: Mutex<Lifecycle>,
    state_tx: watch::Sender<CatalogState>,
    fetch_in_flight: AtomicBool,
}

impl SyncInner {
    fn lock(&self) -> MutexGuard<'_, Lifecycle> {
        self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Applies `update` to the observable state and moves to the phase
    /// chosen by `phase`, which sees the lifecycle under the lock.
    ///
    /// Returns `false` without touching anything once disposed.
    fn publish(
        &self,
        phase: impl FnOnce(&Lifecycle) -> SyncPhase,
        update: impl FnOnce(&mut CatalogState),
    ) -> bool {
        let mut lifecycle = self.lock();
        if lifecycle.phase == SyncPhase::Disposed {
            tracing::debug!(collection = %self.collection, "sync disposed, discarding update");
            return false;
        }
        lifecycle.phase = phase(&lifecycle);
        self.state_tx.send_modify(|state| {
            update(state);
            state.revision += 1;
            state.updated_at = Some(Utc::now());
        });
        true
    }

    /// Normalizes and publishes a full listing. Returns the admitted count,
    /// or `None` if the manager was disposed.
    ///
    /// Without a live subscription the catalog can go stale, so the phase
    /// stays `Reloading` until one is established.
    fn publish_listing(&self, docs: &[RawDocument], source: &'static str) -> Option<usize> {
        let batch = normalize_batch(docs);
        let admitted = batch.products.len();
        let products = CatalogSnapshot::from(batch.products);
        let published = self.publish(listing_phase, |state| {
            state.products = products;
            state.loading = false;
            state.error = None;
        });
        if !published {
            return None;
        }
        tracing::info!(
            collection = %self.collection,
            source,
            admitted,
            rejected = batch.rejected,
            "published catalog snapshot"
        );
        Some(admitted)
    }

    fn publish_failure(&self, err: &SyncError) {
        tracing::error!(collection = %self.collection, error = %err, "catalog fetch failed");
        let message = err.to_string();
        self.publish(|_| SyncPhase::Degraded, |state| {
            state.products = CatalogSnapshot::from(Vec::new());
            state.loading = false;
            state.error = Some(message);
        });
    }

    /// Surfaces a subscription failure and falls back to a one-shot fetch.
    fn handle_subscription_failure(self: &Arc<Self>, err: &SyncError) {
        tracing::warn!(collection = %self.collection, error = %err, "live updates interrupted");
        let message = err.to_string();
        let published = self.publish(|_| SyncPhase::Reloading, |state| {
            state.loading = true;
            state.error = Some(message);
        });
        if published {
            self.spawn_fetch("fallback");
        }
    }

    /// Spawns a full fetch unless one is already outstanding.
    fn spawn_fetch(self: &Arc<Self>, source: &'static str) {
        if self.fetch_in_flight.swap(true, Ordering::SeqCst) {
            tracing::debug!(collection = %self.collection, source, "fetch already in flight");
            return;
        }
        let inner = Arc::clone(self);
        self.runtime.spawn(async move {
            let result = inner.store.list_all(&inner.collection).await;
            inner.fetch_in_flight.store(false, Ordering::SeqCst);
            match result {
                Ok(docs) => {
                    inner.publish_listing(&docs, source);
                }
                Err(err) => inner.publish_failure(&SyncError::FetchFailed {
                    collection: inner.collection.clone(),
                    source: err,
                }),
            }
        });
    }

    /// Registers a listener unless a subscription already exists.
    fn establish_subscription(self: &Arc<Self>) -> Result<(), SyncError> {
        {
            let lifecycle = self.lock();
            if lifecycle.phase == SyncPhase::Disposed || lifecycle.subscription.is_some() {
                return Ok(());
            }
        }
        let listener: Arc<dyn SnapshotListener> = Arc::new(CatalogListener {
            inner: Arc::downgrade(self),
        });
        // Stores may deliver the first snapshot synchronously, so the
        // lifecycle lock must not be held here.
        let subscription = self
            .store
            .subscribe(&self.collection, listener)
            .map_err(|source| SyncError::SubscriptionFailed {
                collection: self.collection.clone(),
                source,
            })?;

        let mut lifecycle = self.lock();
        if lifecycle.phase == SyncPhase::Disposed {
            drop(lifecycle);
            subscription.unsubscribe();
            return Ok(());
        }
        let previous = lifecycle.subscription.replace(subscription);
        // A listing published before the handle was stored left the phase
        // at `Reloading`; a clean catalog is now live.
        let settled = {
            let state = self.state_tx.borrow();
            !state.loading && state.error.is_none()
        };
        if lifecycle.phase == SyncPhase::Reloading && settled {
            lifecycle.phase = SyncPhase::Subscribed;
        }
        drop(lifecycle);
        drop(previous);
        tracing::debug!(collection = %self.collection, "subscribed to live updates");
        Ok(())
    }
}

fn listing_phase(lifecycle: &Lifecycle) -> SyncPhase {
    if lifecycle.subscription.is_some() {
        SyncPhase::Subscribed
    } else {
        SyncPhase::Reloading
    }
}

struct CatalogListener {
    inner: Weak<SyncInner>,
}

impl SnapshotListener for CatalogListener {
    fn on_snapshot(&self, documents: Vec<RawDocument>) {
        if let Some(inner) = self.inner.upgrade() {
            inner.publish_listing(&documents, "subscription");
        }
    }

    fn on_error(&self, error: StoreError) {
        if let Some(inner) = self.inner.upgrade() {
            let err = SyncError::SubscriptionFailed {
                collection: inner.collection.clone(),
                source: error,
            };
            inner.handle_subscription_failure(&err);
        }
    }
}

/// Synchronizes one collection into an observable [`CatalogState`].
///
/// Dropping the manager disposes it.
pub struct SyncManager {
    inner: Arc<SyncInner>,
}

impl SyncManager {
    /// Subscribes to `collection` and kicks off the initial fetch.
    ///
    /// A subscription that cannot be established is reported through the
    /// published state and handled like any later subscription failure.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn start(store: Arc<dyn DocumentStore>, collection: impl Into<String>) -> Self {
        let (state_tx, _) = watch::channel(CatalogState::initial());
        let inner = Arc::new(SyncInner {
            store,
            collection: collection.into(),
            runtime: Handle::current(),
            lifecycle: Mutex::new(Lifecycle {
                phase: SyncPhase::Initializing,
                subscription: None,
            }),
            state_tx,
            fetch_in_flight: AtomicBool::new(false),
        });
        tracing::info!(collection = %inner.collection, "starting catalog sync");

        inner.spawn_fetch("initial");
        if let Err(err) = inner.establish_subscription() {
            inner.handle_subscription_failure(&err);
        }
        Self { inner }
    }

    /// Runs a full fetch now, re-subscribing first if no subscription is live.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Disposed`] after [`SyncManager::dispose`], or
    /// [`SyncError::FetchFailed`] if the listing could not be loaded (the
    /// failure is also published).
    pub async fn refresh(&self) -> Result<usize, SyncError> {
        if self.is_disposed() {
            return Err(self.disposed_error());
        }
        if let Err(err) = self.inner.establish_subscription() {
            tracing::warn!(collection = %self.inner.collection, error = %err, "re-subscribe failed");
        }
        match self.inner.store.list_all(&self.inner.collection).await {
            Ok(docs) => self
                .inner
                .publish_listing(&docs, "refresh")
                .ok_or_else(|| self.disposed_error()),
            Err(source) => {
                let err = SyncError::FetchFailed {
                    collection: self.inner.collection.clone(),
                    source,
                };
                self.inner.publish_failure(&err);
                Err(err)
            }
        }
    }

    /// Releases the subscription and stops all further publishes. Idempotent.
    pub fn dispose(&self) {
        let subscription = {
            let mut lifecycle = self.inner.lock();
            if lifecycle.phase == SyncPhase::Disposed {
                return;
            }
            lifecycle.phase = SyncPhase::Disposed;
            lifecycle.subscription.take()
        };
        if let Some(subscription) = subscription {
            subscription.unsubscribe();
        }
        tracing::info!(collection = %self.inner.collection, "catalog sync disposed");
    }

    /// Current catalog state.
    #[must_use]
    pub fn state(&self) -> CatalogState {
        self.inner.state_tx.borrow().clone()
    }

    /// Receiver notified on every publish.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<CatalogState> {
        self.inner.state_tx.subscribe()
    }

    /// Waits until no load is in progress and returns that state.
    pub async fn wait_until_loaded(&self) -> CatalogState {
        let mut rx = self.watch();
        let loaded = rx
            .wait_for(|state| !state.loading)
            .await
            .map(|state| CatalogState::clone(&state))
            .ok();
        loaded.unwrap_or_else(|| self.state())
    }

    #[must_use]
    pub fn phase(&self) -> SyncPhase {
        self.inner.lock().phase
    }

    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.phase() == SyncPhase::Disposed
    }

    /// Returns `true` while a subscription handle is held.
    #[must_use]
    pub fn is_subscribed(&self) -> bool {
        self.inner.lock().subscription.is_some()
    }

    #[must_use]
    pub fn collection(&self) -> &str {
        &self.inner.collection
    }

    fn disposed_error(&self) -> SyncError {
        SyncError::Disposed {
            collection: self.inner.collection.clone(),
        }
    }
}

impl Drop for SyncManager {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl fmt::Debug for SyncManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncManager")
            .field("collection", &self.inner.collection)
            .field("phase", &self.phase())
            .finish_non_exhaustive()
    }
}
