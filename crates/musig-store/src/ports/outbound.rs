//! Outbound (Driven) ports for the pending store.
//!
//! Collaborators the store and its background tasks depend on. Canonical
//! ids, signature checks and ledger queries are supplied from outside; the
//! store only orchestrates calls to them.

use crate::domain::{
    PublicKey, SignatureSlots, StoreError, StoreId, StoreTransaction, Timestamp,
    TransactionFields,
};
use async_trait::async_trait;
use thiserror::Error;

/// Derives identifiers from transaction fields.
pub trait IdentityResolver: Send + Sync {
    /// Canonical id over the non-signature fields.
    ///
    /// Must be a pure function of `fields`: signatures never change it.
    fn canonical_id(&self, fields: &TransactionFields) -> Result<StoreId, StoreError>;

    /// Id the ledger will know the signed transaction by.
    ///
    /// Depends on the populated slots and recomputed after every merge.
    fn transaction_id(
        &self,
        fields: &TransactionFields,
        signatures: &SignatureSlots,
        sender_signature: Option<&str>,
    ) -> Result<String, StoreError>;
}

/// Verifies a single signature over transaction fields.
pub trait SignatureVerifier: Send + Sync {
    /// Returns true if `signature_hex` is a valid signature by `public_key`.
    fn verify(&self, fields: &TransactionFields, signature_hex: &str, public_key: &PublicKey) -> bool;
}

/// Ledger lookup failure. Never causes an eviction.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("ledger transport error: {0}")]
    Transport(String),

    #[error("ledger lookup timed out")]
    Timeout,

    #[error("ledger returned unexpected status {0}")]
    UnexpectedStatus(u16),
}

/// Asks the ledger whether a transaction has already been included.
#[async_trait]
pub trait LedgerLookup: Send + Sync {
    /// `Ok(true)` if the ledger has the transaction, `Ok(false)` if it does not.
    async fn is_included(&self, transaction_id: &str) -> Result<bool, LedgerError>;
}

/// Durable home of the full record set.
pub trait SnapshotStore: Send + Sync {
    /// Reads every persisted record.
    fn load(&self) -> Result<Vec<StoreTransaction>, StoreError>;

    /// Atomically replaces the persisted set with `records`.
    fn replace_all(&self, records: &[StoreTransaction]) -> Result<(), StoreError>;
}

/// Time source for consistent timestamp handling.
///
/// Abstracted to allow testing with deterministic time.
pub trait TimeSource: Send + Sync {
    /// Returns the current timestamp in milliseconds.
    fn now(&self) -> Timestamp;
}

/// Default system time source.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> Timestamp {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as Timestamp
    }
}

/// Mock identity resolver for testing.
///
/// Hashes the JSON form of the fields with the std hasher. Not stable
/// across Rust versions, which is fine inside one test run.
#[cfg(test)]
#[derive(Default)]
pub struct MockIdentityResolver;

#[cfg(test)]
impl MockIdentityResolver {
    fn digest(input: &str) -> String {
        use std::hash::{Hash, Hasher};
        (0u8..4)
            .map(|round| {
                let mut hasher = std::collections::hash_map::DefaultHasher::new();
                round.hash(&mut hasher);
                input.hash(&mut hasher);
                format!("{:016x}", hasher.finish())
            })
            .collect()
    }
}

#[cfg(test)]
impl IdentityResolver for MockIdentityResolver {
    fn canonical_id(&self, fields: &TransactionFields) -> Result<StoreId, StoreError> {
        let encoded = serde_json::to_string(fields)?;
        StoreId::parse(&Self::digest(&encoded))
    }

    fn transaction_id(
        &self,
        fields: &TransactionFields,
        signatures: &SignatureSlots,
        sender_signature: Option<&str>,
    ) -> Result<String, StoreError> {
        let encoded = serde_json::to_string(&(fields, signatures, sender_signature))?;
        Ok(Self::digest(&encoded))
    }
}

/// Scripted ledger for testing.
///
/// Unknown ids report "not included".
#[cfg(test)]
#[derive(Default)]
pub struct MockLedgerLookup {
    responses: parking_lot::Mutex<std::collections::HashMap<String, Result<bool, LedgerError>>>,
    calls: std::sync::atomic::AtomicUsize,
    delay: Option<std::time::Duration>,
}

#[cfg(test)]
impl MockLedgerLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(self, transaction_id: &str, response: Result<bool, LedgerError>) -> Self {
        self.responses
            .lock()
            .insert(transaction_id.to_string(), response);
        self
    }

    pub fn with_delay(mut self, delay: std::time::Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(test)]
#[async_trait]
impl LedgerLookup for MockLedgerLookup {
    async fn is_included(&self, transaction_id: &str) -> Result<bool, LedgerError> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.responses
            .lock()
            .get(transaction_id)
            .cloned()
            .unwrap_or(Ok(false))
    }
}

/// In-memory snapshot store for testing.
#[cfg(test)]
#[derive(Default)]
pub struct MockSnapshotStore {
    records: parking_lot::Mutex<Vec<StoreTransaction>>,
    writes: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl MockSnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<StoreTransaction>) -> Self {
        Self {
            records: parking_lot::Mutex::new(records),
            writes: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    pub fn writes(&self) -> usize {
        self.writes.load(std::sync::atomic::Ordering::SeqCst)
    }

    pub fn records(&self) -> Vec<StoreTransaction> {
        self.records.lock().clone()
    }
}

#[cfg(test)]
impl SnapshotStore for MockSnapshotStore {
    fn load(&self) -> Result<Vec<StoreTransaction>, StoreError> {
        Ok(self.records.lock().clone())
    }

    fn replace_all(&self, records: &[StoreTransaction]) -> Result<(), StoreError> {
        *self.records.lock() = records.to_vec();
        self.writes.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Ok(())
    }
}

/// Mock time source for testing.
#[cfg(test)]
pub struct MockTimeSource {
    time: std::sync::atomic::AtomicU64,
}

#[cfg(test)]
impl MockTimeSource {
    pub fn new(initial: Timestamp) -> Self {
        Self {
            time: std::sync::atomic::AtomicU64::new(initial),
        }
    }

    pub fn advance(&self, ms: u64) {
        self.time.fetch_add(ms, std::sync::atomic::Ordering::SeqCst);
    }

    pub fn set(&self, time: Timestamp) {
        self.time.store(time, std::sync::atomic::Ordering::SeqCst);
    }
}

#[cfg(test)]
impl TimeSource for MockTimeSource {
    fn now(&self) -> Timestamp {
        self.time.load(std::sync::atomic::Ordering::SeqCst)
    }
}
