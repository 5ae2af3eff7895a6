//! `watch` command: follows the live catalog and prints one line per
//! published snapshot.

use std::sync::Arc;

use catsync_store::DocumentStore;
use catsync_sync::{CatalogState, SyncManager, SyncPhase};

/// Runs until ctrl-c, then disposes the sync manager.
///
/// # Errors
///
/// Returns an error if the ctrl-c handler cannot be installed.
pub(crate) async fn run_watch(store: Arc<dyn DocumentStore>, collection: &str) -> anyhow::Result<()> {
    let sync = SyncManager::start(store, collection);
    let mut rx = sync.watch();
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        let line = {
            let state = rx.borrow_and_update();
            snapshot_line(&state, sync.phase())
        };
        println!("{line}");

        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            signal = &mut shutdown => {
                signal?;
                break;
            }
        }
    }

    sync.dispose();
    tracing::info!(collection, "stopped watching catalog");
    Ok(())
}

pub(crate) fn snapshot_line(state: &CatalogState, phase: SyncPhase) -> String {
    let updated = state
        .updated_at
        .map_or_else(|| "\u{2014}".to_string(), |t| t.format("%H:%M:%S").to_string());
    let mut line = format!(
        "rev {:<5}{:<13}{:>6} products  updated {updated}",
        state.revision,
        phase.as_str(),
        state.len()
    );
    if state.loading {
        line.push_str("  (loading)");
    }
    if let Some(error) = &state.error {
        line.push_str("  error: ");
        line.push_str(error);
    }
    line
}
