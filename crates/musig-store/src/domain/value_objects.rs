//! Value objects for the pending store.
//!
//! Small immutable results and snapshots returned by store operations.

use super::entities::{StoreId, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Whether a record has collected enough signatures to broadcast.
///
/// Never stored; derived from the populated slot count on every read.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Readiness {
    Pending,
    Ready,
}

impl Readiness {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Ready => "ready",
        }
    }
}

impl fmt::Display for Readiness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Readiness {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "ready" => Ok(Self::Ready),
            other => Err(format!("unknown state '{}'", other)),
        }
    }
}

/// Outcome of a successful submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Admission {
    /// A new record was created.
    Created(StoreId),
    /// The submission matched a live record and its signatures were merged.
    Merged(StoreId),
}

impl Admission {
    pub fn id(&self) -> &StoreId {
        match self {
            Self::Created(id) | Self::Merged(id) => id,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}

/// Pending store status snapshot.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct StoreStatus {
    /// Number of live records.
    pub total: usize,
    /// Records with enough signatures.
    pub ready: usize,
    /// Records still collecting signatures.
    pub pending: usize,
    /// Distinct senders with at least one live record.
    pub senders: usize,
    /// Age of oldest record in milliseconds.
    pub oldest_age_ms: u64,
}

/// Result of one confirmation sweep.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Lookups attempted.
    pub checked: usize,
    /// Records evicted because the ledger already has them.
    pub removed: Vec<StoreId>,
    /// Lookups that failed or timed out.
    pub failed: usize,
}

/// A live record's ledger-facing id, copied out for the confirmation sweep.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfirmationCandidate {
    pub id: StoreId,
    pub transaction_id: String,
    pub received_at: Timestamp,
}
