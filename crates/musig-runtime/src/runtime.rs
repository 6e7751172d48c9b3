//! Coordinator lifecycle.
//!
//! ## Startup Sequence
//!
//! 1. Open the snapshot for the configured mode (creates `{}` if missing)
//! 2. Replay it into a fresh store; any bad record aborts startup
//! 3. Verify index consistency
//! 4. Spawn expiry, confirmation and snapshot tasks
//!
//! ## Shutdown Sequence
//!
//! 1. Signal every background task and wait for it to stop
//! 2. Replace the snapshot with the final in-memory set

use crate::adapters::{HttpLedgerLookup, SchnorrVerifier, Sha256IdentityResolver};
use crate::api::ApiHandler;
use crate::config::NodeConfig;
use anyhow::{Context, Result};
use musig_store::tasks::persist;
use musig_store::{
    shared, BackgroundTasks, IdentityResolver, JsonFileSnapshotStore, LedgerLookup, PendingStore,
    SharedStore, SignatureVerifier, SnapshotStore, SystemTimeSource, TimeSource,
};
use std::sync::Arc;
use tracing::{info, warn};

/// Outbound collaborators the runtime wires into the store.
pub struct Collaborators {
    pub identity: Arc<dyn IdentityResolver>,
    pub verifier: Arc<dyn SignatureVerifier>,
    pub ledger: Arc<dyn LedgerLookup>,
    pub snapshots: Arc<dyn SnapshotStore>,
    pub clock: Arc<dyn TimeSource>,
}

impl Collaborators {
    /// SHA-256 ids, Schnorr verification, HTTP ledger and the JSON snapshot file.
    pub fn from_config(config: &NodeConfig) -> Result<Self> {
        let snapshots = JsonFileSnapshotStore::open(&config.storage.data_dir, &config.network.mode)
            .with_context(|| {
                format!(
                    "Failed to open snapshot in {}",
                    config.storage.data_dir.display()
                )
            })?;
        let ledger = HttpLedgerLookup::new(&config.network.ledger_host, config.tasks.ledger_timeout)
            .context("Failed to build ledger client")?;

        Ok(Self {
            identity: Arc::new(Sha256IdentityResolver::new()),
            verifier: Arc::new(SchnorrVerifier::new()),
            ledger: Arc::new(ledger),
            snapshots: Arc::new(snapshots),
            clock: Arc::new(SystemTimeSource),
        })
    }
}

/// The running coordinator: store, request handler and background tasks.
pub struct CoordinatorRuntime {
    config: NodeConfig,
    store: SharedStore,
    handler: Arc<ApiHandler>,
    ledger: Arc<dyn LedgerLookup>,
    snapshots: Arc<dyn SnapshotStore>,
    tasks: Option<BackgroundTasks>,
}

impl CoordinatorRuntime {
    /// Builds the runtime with the default adapters and loads the snapshot.
    pub fn new(config: NodeConfig) -> Result<Self> {
        let collaborators = Collaborators::from_config(&config)?;
        Self::with_collaborators(config, collaborators)
    }

    /// Builds the runtime over the given collaborators and loads the snapshot.
    ///
    /// # Errors
    /// Fails if the snapshot cannot be read, holds a record whose id does
    /// not re-derive, or leaves the indexes inconsistent.
    pub fn with_collaborators(config: NodeConfig, collaborators: Collaborators) -> Result<Self> {
        let mut store = PendingStore::new(
            config.store.clone(),
            collaborators.identity,
            collaborators.clock,
        );

        let records = collaborators
            .snapshots
            .load()
            .context("Failed to read snapshot")?;
        let loaded = store.load(records).context("Failed to load snapshot")?;
        store
            .check_consistency()
            .context("Store inconsistent after load")?;
        info!(mode = %config.network.mode, loaded = loaded, "Loaded pending transactions");

        let store = shared(store);
        let handler = Arc::new(ApiHandler::new(Arc::clone(&store), collaborators.verifier));

        Ok(Self {
            config,
            store,
            handler,
            ledger: collaborators.ledger,
            snapshots: collaborators.snapshots,
            tasks: None,
        })
    }

    /// Spawns the background tasks. Calling it twice has no effect.
    pub fn start(&mut self) {
        if self.tasks.is_some() {
            warn!("Background tasks already running");
            return;
        }
        self.tasks = Some(BackgroundTasks::spawn(
            Arc::clone(&self.store),
            Arc::clone(&self.ledger),
            Arc::clone(&self.snapshots),
            &self.config.tasks,
        ));
    }

    /// Stops the background tasks, then writes the final snapshot.
    ///
    /// Returns the number of records persisted.
    pub async fn shutdown(mut self) -> Result<usize> {
        info!("Initiating graceful shutdown...");

        if let Some(tasks) = self.tasks.take() {
            tasks.shutdown().await;
        }

        let persisted = persist(&self.store, &self.snapshots)
            .await
            .context("Failed to write final snapshot")?;
        info!(persisted = persisted, "Shutdown complete");
        Ok(persisted)
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    /// Request handler sharing this runtime's store.
    pub fn handler(&self) -> Arc<ApiHandler> {
        Arc::clone(&self.handler)
    }

    pub fn store(&self) -> SharedStore {
        Arc::clone(&self.store)
    }

    pub fn is_running(&self) -> bool {
        self.tasks.is_some()
    }
}
