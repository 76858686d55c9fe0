//! nskv-server — HTTP adapter binary for the namespaced key-value store.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use nskv_common::StoreConfig;
use nskv_core::{BackgroundTasks, Store};
use nskv_server::metrics::Metrics;
use nskv_server::{build_router, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// nskv-server — a namespaced, TTL-aware, LRU-bounded key-value store.
#[derive(Parser, Debug)]
#[command(name = "nskv-server")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Maximum number of live entries the store holds.
    #[arg(long, default_value_t = nskv_common::config::DEFAULT_CAPACITY, env = "NSKV_STORE_CAPACITY")]
    capacity: usize,

    /// Path to the write-ahead log file.
    #[arg(long, default_value = nskv_common::config::DEFAULT_LOG_FILE, env = "NSKV_LOG_FILE")]
    log_file: PathBuf,

    /// Seconds between compactor wakeups.
    #[arg(long, default_value_t = nskv_common::config::DEFAULT_COMPACTION_INTERVAL_SECS, env = "NSKV_COMPACTION_INTERVAL_SECS")]
    compaction_interval: u64,

    /// WAL record count that triggers a compaction.
    #[arg(long, default_value_t = nskv_common::config::DEFAULT_MAX_LOG_SIZE, env = "NSKV_MAX_LOG_SIZE")]
    max_log_size: u64,

    /// Seconds between TTL sweeper wakeups.
    #[arg(long, default_value_t = nskv_common::config::DEFAULT_CLEANUP_INTERVAL_SECS, env = "NSKV_CLEANUP_INTERVAL_SECS")]
    cleanup_interval: u64,

    /// Address to bind the HTTP server to.
    #[arg(long, default_value = "0.0.0.0:8080", env = "NSKV_BIND_ADDR")]
    bind: String,
}

impl From<Args> for StoreConfig {
    fn from(args: Args) -> Self {
        StoreConfig {
            capacity: args.capacity,
            log_file: args.log_file,
            compaction_interval: Duration::from_secs(args.compaction_interval),
            max_log_size: args.max_log_size,
            cleanup_interval: Duration::from_secs(args.cleanup_interval),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let bind = args.bind.clone();
    let config: StoreConfig = args.into();

    tracing::info!(
        capacity = config.capacity,
        log_file = %config.log_file.display(),
        "starting nskv-server"
    );

    let store = Store::open(config).await?;
    let background = BackgroundTasks::spawn(Arc::clone(&store));

    let state = AppState {
        store,
        metrics: Arc::new(Metrics::new()),
    };
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind).await?;
    tracing::info!("nskv-server listening on http://{bind}");

    let result = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    background.shutdown().await;
    result?;
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
