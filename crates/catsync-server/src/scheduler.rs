//! Background job scheduler.
//!
//! Registers the catalog retry trigger: on every tick of
//! `CATSYNC_REFRESH_CRON`, a sync manager whose observable state carries an
//! error gets a full refresh. Healthy managers are left alone.

use std::sync::Arc;

use catsync_sync::SyncManager;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

/// Builds and starts the background job scheduler.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive
/// for the lifetime of the process. Dropping it shuts down all jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// the cron expression is invalid, or the scheduler fails to start.
pub async fn build_scheduler(
    sync: Arc<SyncManager>,
    refresh_cron: &str,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;
    register_refresh_job(&scheduler, sync, refresh_cron).await?;
    scheduler.start().await?;
    Ok(scheduler)
}

async fn register_refresh_job(
    scheduler: &JobScheduler,
    sync: Arc<SyncManager>,
    refresh_cron: &str,
) -> Result<(), JobSchedulerError> {
    let job = Job::new_async(refresh_cron, move |_uuid, _lock| {
        let sync = Arc::clone(&sync);
        Box::pin(async move {
            run_refresh_job(&sync).await;
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(cron = refresh_cron, "scheduler: registered catalog refresh job");
    Ok(())
}

/// Refreshes the catalog if the last sync left an error behind or no live
/// subscription is held.
///
/// Returns `true` if a refresh was attempted.
pub(crate) async fn run_refresh_job(sync: &SyncManager) -> bool {
    if sync.is_disposed() {
        return false;
    }
    let state = sync.state();
    let subscribed = sync.is_subscribed();
    if state.error.is_none() && subscribed {
        tracing::debug!(phase = %sync.phase(), "scheduler: catalog healthy, skipping refresh");
        return false;
    }

    tracing::info!(
        phase = %sync.phase(),
        subscribed,
        last_error = state.error.as_deref().unwrap_or("none"),
        "scheduler: refreshing catalog"
    );
    match sync.refresh().await {
        Ok(admitted) => {
            tracing::info!(admitted, "scheduler: catalog refresh succeeded");
        }
        Err(e) => {
            tracing::warn!(error = %e, "scheduler: catalog refresh failed");
        }
    }
    true
}
