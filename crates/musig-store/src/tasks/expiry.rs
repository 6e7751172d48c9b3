//! Expiry reaper: evicts records past the retention window.

use super::SharedStore;
use crate::domain::StoreId;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

/// Periodically removes records whose age exceeds the store's retention.
pub struct ExpiryReaper {
    store: SharedStore,
    interval: Duration,
}

impl ExpiryReaper {
    pub fn new(store: SharedStore, interval: Duration) -> Self {
        Self { store, interval }
    }

    /// Runs one sweep under a single write guard.
    pub fn sweep_once(&self) -> Vec<StoreId> {
        let mut store = self.store.write();
        let now = store.now();
        let removed = store.sweep_expired(now);
        for id in &removed {
            info!(id = %id, "Removed expired transaction");
        }
        removed
    }

    /// Sweeps every `interval` until shutdown is signalled.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let removed = self.sweep_once();
                    if !removed.is_empty() {
                        debug!(removed = removed.len(), "Expiry sweep finished");
                    }
                }
                _ = shutdown.changed() => {
                    info!("Expiry reaper shutting down");
                    break;
                }
            }
        }
    }
}
