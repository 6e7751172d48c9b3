//! # Background Tasks
//!
//! Periodic work that runs beside request handling:
//!
//! | Task | Default interval | Effect |
//! |------|------------------|--------|
//! | `ExpiryReaper` | 15 min | Evicts records older than the retention window |
//! | `ConfirmationReaper` | 8 s | Evicts records the ledger already includes |
//! | `SnapshotWriter` | 60 s | Replaces the snapshot with the in-memory set |
//!
//! Every task owns a `watch::Receiver<bool>` and stops when it flips to
//! `true`. `BackgroundTasks::shutdown` signals and then joins them all, so
//! the final snapshot is taken only once nothing else touches the store.

pub mod confirmation;
pub mod expiry;
pub mod snapshot;

pub use confirmation::ConfirmationReaper;
pub use expiry::ExpiryReaper;
pub use snapshot::{persist, SnapshotWriter};

use crate::domain::PendingStore;
use crate::ports::outbound::{LedgerLookup, SnapshotStore};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// The store shared between request handlers and background tasks.
pub type SharedStore = Arc<RwLock<PendingStore>>;

/// Wraps a store for sharing.
pub fn shared(store: PendingStore) -> SharedStore {
    Arc::new(RwLock::new(store))
}

/// Background task timing.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskConfig {
    pub expiry_interval: Duration,
    pub confirmation_interval: Duration,
    /// Upper bound on one ledger lookup.
    pub ledger_timeout: Duration,
    pub snapshot_interval: Duration,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            expiry_interval: Duration::from_secs(15 * 60),
            confirmation_interval: Duration::from_secs(8),
            ledger_timeout: Duration::from_secs(5),
            snapshot_interval: Duration::from_secs(60),
        }
    }
}

/// Handles to the running background tasks.
pub struct BackgroundTasks {
    shutdown_tx: watch::Sender<bool>,
    handles: Vec<(&'static str, JoinHandle<()>)>,
}

impl BackgroundTasks {
    /// Spawns the expiry reaper, confirmation reaper and snapshot writer.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(
        store: SharedStore,
        ledger: Arc<dyn LedgerLookup>,
        snapshots: Arc<dyn SnapshotStore>,
        config: &TaskConfig,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let expiry = ExpiryReaper::new(Arc::clone(&store), config.expiry_interval);
        let confirmation = ConfirmationReaper::new(
            Arc::clone(&store),
            ledger,
            config.confirmation_interval,
            config.ledger_timeout,
        );
        let writer = SnapshotWriter::new(store, snapshots, config.snapshot_interval);

        let handles = vec![
            ("expiry", tokio::spawn(expiry.run(shutdown_rx.clone()))),
            ("confirmation", tokio::spawn(confirmation.run(shutdown_rx.clone()))),
            ("snapshot", tokio::spawn(writer.run(shutdown_rx))),
        ];
        info!(tasks = handles.len(), "Background tasks started");

        Self {
            shutdown_tx,
            handles,
        }
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Signals every task to stop and waits for all of them.
    pub async fn shutdown(self) {
        if let Err(e) = self.shutdown_tx.send(true) {
            error!("Failed to send shutdown signal: {}", e);
        }

        for (name, handle) in self.handles {
            match handle.await {
                Ok(()) => debug!(task = name, "Background task stopped"),
                Err(e) => error!(task = name, error = %e, "Background task failed"),
            }
        }
        info!("Background tasks stopped");
    }
}
