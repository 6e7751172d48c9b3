//! Snapshot writer: periodically replaces the durable snapshot.

use super::SharedStore;
use crate::domain::StoreError;
use crate::ports::outbound::SnapshotStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info};

/// Copies the store under a read guard and writes it on the blocking pool.
///
/// Returns the number of records written.
pub async fn persist(
    store: &SharedStore,
    snapshots: &Arc<dyn SnapshotStore>,
) -> Result<usize, StoreError> {
    let records = store.read().dump();
    let count = records.len();
    let snapshots = Arc::clone(snapshots);

    tokio::task::spawn_blocking(move || snapshots.replace_all(&records))
        .await
        .map_err(|e| StoreError::internal(format!("snapshot task failed: {}", e)))??;
    Ok(count)
}

/// Writes a full snapshot every `interval`.
pub struct SnapshotWriter {
    store: SharedStore,
    snapshots: Arc<dyn SnapshotStore>,
    interval: Duration,
}

impl SnapshotWriter {
    pub fn new(store: SharedStore, snapshots: Arc<dyn SnapshotStore>, interval: Duration) -> Self {
        Self {
            store,
            snapshots,
            interval,
        }
    }

    pub async fn write_once(&self) -> Result<usize, StoreError> {
        persist(&self.store, &self.snapshots).await
    }

    /// Writes until shutdown is signalled. The first write happens one
    /// interval after start, since the snapshot was just loaded.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.write_once().await {
                        Ok(count) => debug!(count = count, "Snapshot written"),
                        Err(e) => error!(error = %e, "Snapshot write failed"),
                    }
                }
                _ = shutdown.changed() => {
                    info!("Snapshot writer shutting down");
                    break;
                }
            }
        }
    }
}
