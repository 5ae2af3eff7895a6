mod api;
mod middleware;
mod scheduler;

use std::sync::Arc;

use catsync_sync::{CatalogMutator, SyncManager};
use tracing_subscriber::EnvFilter;

use crate::api::{build_app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = catsync_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    tracing::info!(
        env = %config.env,
        store = %config.store,
        collection = %config.collection,
        "starting catalog server"
    );

    let store = catsync_store::open_store(&config)?;
    let sync = Arc::new(SyncManager::start(Arc::clone(&store), &config.collection));
    let mutator = CatalogMutator::new(store, &config.collection);

    let mut scheduler = scheduler::build_scheduler(Arc::clone(&sync), &config.refresh_cron).await?;

    let app = build_app(AppState::new(Arc::clone(&sync), mutator));

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.shutdown().await?;
    sync.dispose();
    tracing::info!("catalog sync disposed, shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
