//! Confirmation reaper: evicts records the ledger already includes.
//!
//! ```text
//! read guard ──copy (id, transaction_id)──→ release
//!     for each candidate:
//!         shutdown? ──yes──→ stop
//!         is_included(transaction_id) with timeout
//!             Ok(true)      → write guard, remove_by_id
//!             Ok(false)     → keep
//!             Err / timeout → keep, retried next cycle
//! ```

use super::SharedStore;
use crate::domain::SweepReport;
use crate::ports::outbound::{LedgerError, LedgerLookup};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Periodically asks the ledger about every live record.
pub struct ConfirmationReaper {
    store: SharedStore,
    ledger: Arc<dyn LedgerLookup>,
    interval: Duration,
    timeout: Duration,
}

impl ConfirmationReaper {
    pub fn new(
        store: SharedStore,
        ledger: Arc<dyn LedgerLookup>,
        interval: Duration,
        timeout: Duration,
    ) -> Self {
        Self {
            store,
            ledger,
            interval,
            timeout,
        }
    }

    /// Runs one sweep.
    ///
    /// No store lock is held while a lookup is in flight. Stops early,
    /// between lookups, once shutdown has been signalled.
    pub async fn sweep_once(&self, shutdown: &watch::Receiver<bool>) -> SweepReport {
        let candidates = self.store.read().confirmation_candidates();
        let mut report = SweepReport::default();

        for candidate in candidates {
            if *shutdown.borrow() {
                debug!(checked = report.checked, "Confirmation sweep interrupted by shutdown");
                break;
            }
            report.checked += 1;

            let lookup = self.ledger.is_included(&candidate.transaction_id);
            let outcome = match tokio::time::timeout(self.timeout, lookup).await {
                Ok(result) => result,
                Err(_) => Err(LedgerError::Timeout),
            };

            match outcome {
                Ok(true) => {
                    let removed = self.store.write().remove_by_id(&candidate.id).is_some();
                    if removed {
                        info!(
                            id = %candidate.id,
                            transaction_id = %candidate.transaction_id,
                            "Removed confirmed transaction"
                        );
                        report.removed.push(candidate.id);
                    }
                }
                Ok(false) => {}
                Err(e) => {
                    report.failed += 1;
                    warn!(
                        id = %candidate.id,
                        transaction_id = %candidate.transaction_id,
                        error = %e,
                        "Ledger lookup failed"
                    );
                }
            }
        }
        report
    }

    /// Sweeps every `interval` until shutdown is signalled.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.changed() => {
                    info!("Confirmation reaper shutting down");
                    break;
                }
            }

            let report = self.sweep_once(&shutdown).await;
            if report.checked > 0 {
                debug!(
                    checked = report.checked,
                    removed = report.removed.len(),
                    failed = report.failed,
                    "Confirmation sweep finished"
                );
            }
            if *shutdown.borrow() {
                info!("Confirmation reaper shutting down");
                break;
            }
        }
    }
}
