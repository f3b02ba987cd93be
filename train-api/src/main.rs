use std::sync::Arc;

use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use train_api::cache::MemoryCache;
use train_api::config::{AppConfig, SourceConfig};
use train_api::ingest::{DEFAULT_NAMESPACE, SnapshotSelector, Synchronizer};
use train_api::published::PublishedTimeTable;
use train_api::refresh::{DirectoryDump, Refresher};
use train_api::store::{LocalDirStore, ObjectStore, S3Store};
use train_api::web::{AppState, api_base_path, create_router};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env().expect("Invalid configuration");

    let store: Arc<dyn ObjectStore> = match &config.source {
        SourceConfig::S3(s3) => {
            info!(bucket = %s3.bucket, region = %s3.region, "reading snapshots from S3");
            Arc::new(S3Store::new(s3).expect("Failed to create S3 client"))
        }
        SourceConfig::Local { dir } => {
            info!(dir = %dir.display(), "reading snapshots from local directory");
            Arc::new(LocalDirStore::new(dir))
        }
    };

    let cache = Arc::new(MemoryCache::new(config.cache_max_entries));
    let keys = config.cache_keys();
    let synchronizer = Synchronizer::new(store, cache.clone(), keys.clone(), config.sync_config());
    let selector = SnapshotSelector::new(cache, keys, DEFAULT_NAMESPACE);

    let mut refresher = Refresher::new(synchronizer, selector, PublishedTimeTable::new())
        .with_timeout(config.refresh_timeout);
    if let Some(dir) = &config.snapshot_dump_dir {
        refresher = refresher.with_dump(Arc::new(DirectoryDump::new(dir)));
    }
    let refresher = Arc::new(refresher);

    // Refresh immediately, then on every interval
    let scheduled = refresher.clone();
    let refresh_interval = config.refresh_interval;
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(refresh_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            match scheduled.refresh().await {
                Ok(outcome) => info!(?outcome, "refresh finished"),
                Err(e) => warn!(error = %e, "refresh failed"),
            }
        }
    });

    let state = AppState::new(refresher, &config.server.authorization_token);
    let app = create_router(state);

    let addr = config.server.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listen address");
    info!(%addr, base = %api_base_path(), "Train API listening");

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!(error = %e, "server error");
    }
    info!("shut down");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
