//! # Background tasks (C4)
//!
//! Two long-running tasks run alongside the store: a TTL sweeper and a
//! size-triggered compactor (spec §4.4). Both are cancellable via a
//! shared `watch` channel so `nskv-server` can shut them down cleanly.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::store::Store;

/// Handle to the spawned background tasks. Dropping it does not stop
/// the tasks — call [`BackgroundTasks::shutdown`] explicitly.
pub struct BackgroundTasks {
    shutdown_tx: watch::Sender<bool>,
    sweeper: tokio::task::JoinHandle<()>,
    compactor: tokio::task::JoinHandle<()>,
}

impl BackgroundTasks {
    /// Spawns the sweeper and compactor loops against `store`, using
    /// `store.config()`'s intervals.
    pub fn spawn(store: Arc<Store>) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let sweeper = tokio::spawn(run_sweeper(
            Arc::clone(&store),
            store.config().cleanup_interval,
            shutdown_rx.clone(),
        ));
        let compactor = tokio::spawn(run_compactor(
            store.clone(),
            store.config().compaction_interval,
            shutdown_rx,
        ));

        BackgroundTasks {
            shutdown_tx,
            sweeper,
            compactor,
        }
    }

    /// Signals both loops to stop and waits for them to exit.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        let _ = self.sweeper.await;
        let _ = self.compactor.await;
    }
}

async fn run_sweeper(store: Arc<Store>, interval: Duration, mut shutdown: watch::Receiver<bool>) {
    loop {
        tokio::select! {
            _ = tokio::time::sleep(interval) => {
                match store.sweep_expired().await {
                    Ok(removed) if removed > 0 => {
                        tracing::info!(removed, "sweeper removed expired entries");
                    }
                    Ok(_) => {}
                    Err(err) => tracing::warn!(%err, "sweeper pass failed"),
                }
            }
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    break;
                }
            }
        }
    }
}

async fn run_compactor(store: Arc<Store>, interval: Duration, mut shutdown: watch::Receiver<bool>) {
    loop {
        tokio::select! {
            _ = tokio::time::sleep(interval) => {
                if let Err(err) = store.maybe_compact().await {
                    tracing::warn!(%err, "compaction pass failed");
                }
            }
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    break;
                }
            }
        }
    }
}
