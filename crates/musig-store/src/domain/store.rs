//! # Pending Store
//!
//! In-memory map of canonical id to coordination record, with two secondary
//! indexes.
//!
//! ```text
//! by_id          : StoreId   -> StoreTransaction
//! by_sender      : PublicKey -> {StoreId}   (admission counter)
//! by_participant : PublicKey -> {StoreId}
//! ```
//!
//! Every mutation updates the primary map and both indexes before it
//! returns, and empty index entries are dropped.

use super::entities::{
    ParticipantSignature, PublicKey, SignatureSlots, StoreConfig, StoreId, StoreTransaction,
    Submission, Timestamp, TransactionFields,
};
use super::errors::StoreError;
use super::services::{validate_asset, validate_signatures};
use super::value_objects::{Admission, ConfirmationCandidate, Readiness, StoreStatus};
use crate::ports::outbound::{IdentityResolver, TimeSource};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

/// The pending multi-signature transaction store.
pub struct PendingStore {
    config: StoreConfig,
    identity: Arc<dyn IdentityResolver>,
    clock: Arc<dyn TimeSource>,
    /// Primary storage.
    by_id: HashMap<StoreId, StoreTransaction>,
    /// Records owned by each sender.
    by_sender: HashMap<PublicKey, BTreeSet<StoreId>>,
    /// Records each participant may sign.
    by_participant: HashMap<PublicKey, BTreeSet<StoreId>>,
}

impl PendingStore {
    /// Creates an empty store.
    pub fn new(
        config: StoreConfig,
        identity: Arc<dyn IdentityResolver>,
        clock: Arc<dyn TimeSource>,
    ) -> Self {
        Self {
            config,
            identity,
            clock,
            by_id: HashMap::new(),
            by_sender: HashMap::new(),
            by_participant: HashMap::new(),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Current time from the store's clock.
    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    pub fn contains(&self, id: &StoreId) -> bool {
        self.by_id.contains_key(id)
    }

    /// Canonical id a submission with these fields maps to.
    pub fn resolve_id(&self, fields: &TransactionFields) -> Result<StoreId, StoreError> {
        self.identity.canonical_id(fields)
    }

    /// Admits a submission, or merges it into the live record with the same id.
    ///
    /// # Errors
    /// - `Validation` if the participant set or signature indices are malformed
    /// - `Admission` if the sender already has `pending_limit` live records
    pub fn admit(&mut self, submission: Submission) -> Result<Admission, StoreError> {
        let id = self.identity.canonical_id(&submission.fields)?;

        // Resubmission: the stored participant set wins.
        if self.by_id.contains_key(&id) {
            self.merge(
                &id,
                &submission.signatures,
                submission.sender_signature.as_deref(),
            )?;
            return Ok(Admission::Merged(id));
        }

        validate_asset(&submission.multisig_asset, self.config.max_participants)?;
        let participants = submission.multisig_asset.public_keys.len();
        validate_signatures(&submission.signatures, participants)?;

        let sender = &submission.fields.sender_public_key;
        if self.sender_count(sender) >= self.config.pending_limit {
            return Err(StoreError::Admission {
                sender: sender.clone(),
                limit: self.config.pending_limit,
            });
        }

        let mut signatures = SignatureSlots::new(participants);
        signatures.merge(&submission.signatures)?;
        let transaction_id = self.identity.transaction_id(
            &submission.fields,
            &signatures,
            submission.sender_signature.as_deref(),
        )?;

        let now = self.clock.now();
        let record = StoreTransaction {
            id: id.clone(),
            fields: submission.fields,
            multisig_asset: submission.multisig_asset,
            signatures,
            sender_signature: submission.sender_signature,
            transaction_id,
            received_at: now,
            last_updated_at: now,
        };
        self.insert_internal(record);

        Ok(Admission::Created(id))
    }

    /// Writes signatures into an existing record's slots.
    ///
    /// Slots not mentioned keep their value. A supplied sender signature
    /// replaces the stored one. Signatures are not re-verified here.
    pub fn merge(
        &mut self,
        id: &StoreId,
        incoming: &[ParticipantSignature],
        sender_signature: Option<&str>,
    ) -> Result<(), StoreError> {
        let record = self
            .by_id
            .get(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;

        validate_signatures(incoming, record.participants().len())?;
        let mut signatures = record.signatures.clone();
        signatures.merge(incoming)?;
        let sender_signature = sender_signature
            .map(str::to_string)
            .or_else(|| record.sender_signature.clone());
        let transaction_id = self.identity.transaction_id(
            &record.fields,
            &signatures,
            sender_signature.as_deref(),
        )?;
        let now = self.clock.now();

        if let Some(record) = self.by_id.get_mut(id) {
            record.signatures = signatures;
            record.sender_signature = sender_signature;
            record.transaction_id = transaction_id;
            record.last_updated_at = now;
        }
        Ok(())
    }

    pub fn get(&self, id: &StoreId) -> Option<&StoreTransaction> {
        self.by_id.get(id)
    }

    /// Records where `key` is the sender or a participant, in ascending id order.
    pub fn get_by_public_key(&self, key: &PublicKey) -> Vec<&StoreTransaction> {
        let mut ids: BTreeSet<&StoreId> = BTreeSet::new();
        if let Some(owned) = self.by_sender.get(key) {
            ids.extend(owned.iter());
        }
        if let Some(signable) = self.by_participant.get(key) {
            ids.extend(signable.iter());
        }
        ids.into_iter().filter_map(|id| self.by_id.get(id)).collect()
    }

    /// Every live record, in ascending id order.
    pub fn all(&self) -> Vec<&StoreTransaction> {
        let mut records: Vec<_> = self.by_id.values().collect();
        records.sort_by(|a, b| a.id.cmp(&b.id));
        records
    }

    /// Readiness of a live record.
    pub fn readiness(&self, id: &StoreId) -> Option<Readiness> {
        self.by_id.get(id).map(StoreTransaction::readiness)
    }

    /// Removes a record and all of its index entries. Idempotent.
    pub fn remove_by_id(&mut self, id: &StoreId) -> Option<StoreTransaction> {
        self.remove_internal(id)
    }

    /// Removes every record, returning how many were removed.
    pub fn clear(&mut self) -> usize {
        let removed = self.by_id.len();
        self.by_id.clear();
        self.by_sender.clear();
        self.by_participant.clear();
        removed
    }

    /// Number of live records owned by `sender`.
    pub fn sender_count(&self, sender: &PublicKey) -> usize {
        self.by_sender.get(sender).map(|ids| ids.len()).unwrap_or(0)
    }

    /// Ids of records past the retention window.
    pub fn expired(&self, now: Timestamp) -> Vec<StoreId> {
        let mut ids: Vec<StoreId> = self
            .by_id
            .values()
            .filter(|record| record.is_expired(now, self.config.retention))
            .map(|record| record.id.clone())
            .collect();
        ids.sort();
        ids
    }

    /// Removes every record past the retention window.
    pub fn sweep_expired(&mut self, now: Timestamp) -> Vec<StoreId> {
        let expired = self.expired(now);
        for id in &expired {
            self.remove_internal(id);
        }
        expired
    }

    /// Ledger-facing ids of every live record, oldest first.
    pub fn confirmation_candidates(&self) -> Vec<ConfirmationCandidate> {
        let mut candidates: Vec<_> = self
            .by_id
            .values()
            .map(|record| ConfirmationCandidate {
                id: record.id.clone(),
                transaction_id: record.transaction_id.clone(),
                received_at: record.received_at,
            })
            .collect();
        candidates.sort_by(|a, b| a.received_at.cmp(&b.received_at).then_with(|| a.id.cmp(&b.id)));
        candidates
    }

    /// Replays persisted records into the store.
    ///
    /// Ids and timestamps are kept and the admission limit is not applied.
    /// Participant sets are validated as on admission. The whole batch is checked before anything is inserted, so a bad
    /// record leaves the store untouched.
    pub fn load(&mut self, records: Vec<StoreTransaction>) -> Result<usize, StoreError> {
        let mut seen = HashSet::with_capacity(records.len());
        for record in &records {
            validate_asset(&record.multisig_asset, self.config.max_participants).map_err(|e| {
                StoreError::internal(format!("record {} has an invalid participant set: {}", record.id, e))
            })?;
            let derived = self.identity.canonical_id(&record.fields)?;
            if derived != record.id {
                return Err(StoreError::internal(format!(
                    "stored id {} does not match derived id {}",
                    record.id, derived
                )));
            }
            if record.signatures.len() != record.participants().len() {
                return Err(StoreError::internal(format!(
                    "record {} has {} signature slots for {} participants",
                    record.id,
                    record.signatures.len(),
                    record.participants().len()
                )));
            }
            if self.by_id.contains_key(&record.id) || !seen.insert(&record.id) {
                return Err(StoreError::internal(format!(
                    "record {} loaded twice",
                    record.id
                )));
            }
        }

        let count = records.len();
        for record in records {
            self.insert_internal(record);
        }
        Ok(count)
    }

    /// Copies every record out, in ascending id order.
    pub fn dump(&self) -> Vec<StoreTransaction> {
        self.all().into_iter().cloned().collect()
    }

    /// Gets the store status.
    pub fn status(&self, now: Timestamp) -> StoreStatus {
        let ready = self
            .by_id
            .values()
            .filter(|record| record.readiness() == Readiness::Ready)
            .count();
        let oldest_age_ms = self
            .by_id
            .values()
            .map(|record| now.saturating_sub(record.received_at))
            .max()
            .unwrap_or(0);

        StoreStatus {
            total: self.by_id.len(),
            ready,
            pending: self.by_id.len() - ready,
            senders: self.by_sender.len(),
            oldest_age_ms,
        }
    }

    /// Verifies that the indexes and the primary map agree both ways.
    pub fn check_consistency(&self) -> Result<(), StoreError> {
        for (id, record) in &self.by_id {
            if &record.id != id {
                return Err(StoreError::internal(format!("record {} stored under {}", record.id, id)));
            }
            let owned = self.by_sender.get(record.sender());
            if !owned.map(|ids| ids.contains(id)).unwrap_or(false) {
                return Err(StoreError::internal(format!("record {} missing from sender index", id)));
            }
            for key in record.participants() {
                let signable = self.by_participant.get(key);
                if !signable.map(|ids| ids.contains(id)).unwrap_or(false) {
                    return Err(StoreError::internal(format!(
                        "record {} missing from participant index of {}",
                        id, key
                    )));
                }
            }
        }

        for (key, ids) in &self.by_sender {
            if ids.is_empty() {
                return Err(StoreError::internal(format!("empty sender entry for {}", key)));
            }
            for id in ids {
                match self.by_id.get(id) {
                    Some(record) if record.sender() == key => {}
                    _ => {
                        return Err(StoreError::internal(format!(
                            "sender index of {} points at {}",
                            key, id
                        )))
                    }
                }
            }
        }

        for (key, ids) in &self.by_participant {
            if ids.is_empty() {
                return Err(StoreError::internal(format!("empty participant entry for {}", key)));
            }
            for id in ids {
                match self.by_id.get(id) {
                    Some(record) if record.participants().contains(key) => {}
                    _ => {
                        return Err(StoreError::internal(format!(
                            "participant index of {} points at {}",
                            key, id
                        )))
                    }
                }
            }
        }
        Ok(())
    }

    fn insert_internal(&mut self, record: StoreTransaction) {
        let id = record.id.clone();
        self.by_sender
            .entry(record.sender().clone())
            .or_default()
            .insert(id.clone());
        for key in record.participants() {
            self.by_participant
                .entry(key.clone())
                .or_default()
                .insert(id.clone());
        }
        self.by_id.insert(id, record);
    }

    fn remove_internal(&mut self, id: &StoreId) -> Option<StoreTransaction> {
        let record = self.by_id.remove(id)?;

        if let Some(owned) = self.by_sender.get_mut(record.sender()) {
            owned.remove(id);
            if owned.is_empty() {
                self.by_sender.remove(record.sender());
            }
        }
        for key in record.participants() {
            if let Some(signable) = self.by_participant.get_mut(key) {
                signable.remove(id);
                if signable.is_empty() {
                    self.by_participant.remove(key);
                }
            }
        }

        Some(record)
    }
}

impl std::fmt::Debug for PendingStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingStore")
            .field("config", &self.config)
            .field("records", &self.by_id.len())
            .field("senders", &self.by_sender.len())
            .field("participants", &self.by_participant.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{MultiSignatureAsset, TransactionKind};
    use crate::ports::outbound::{
        MockIdentityResolver, MockSnapshotStore, MockTimeSource, SnapshotStore,
    };
    use std::time::Duration;

    fn key(byte: u8) -> PublicKey {
        PublicKey::parse(&format!("02{}", hex::encode([byte; 32]))).unwrap()
    }

    fn sig(index: u8) -> ParticipantSignature {
        ParticipantSignature::new(index, hex::encode([index + 0x10; 64]))
    }

    fn create_fields(sender: u8, nonce: u64) -> TransactionFields {
        TransactionFields {
            kind: TransactionKind::Other {
                type_group: 1,
                type_id: 0,
            },
            sender_public_key: key(sender),
            payload: serde_json::json!({ "amount": "1000", "nonce": nonce.to_string() }),
        }
    }

    fn create_submission(sender: u8, nonce: u64, signatures: Vec<ParticipantSignature>) -> Submission {
        Submission {
            fields: create_fields(sender, nonce),
            multisig_asset: MultiSignatureAsset {
                min: 2,
                public_keys: vec![key(0xA1), key(0xA2), key(0xA3)],
            },
            signatures,
            sender_signature: None,
        }
    }

    fn create_store() -> (PendingStore, Arc<MockTimeSource>) {
        let clock = Arc::new(MockTimeSource::new(1_000));
        let store = PendingStore::new(
            StoreConfig::for_testing(),
            Arc::new(MockIdentityResolver),
            clock.clone(),
        );
        (store, clock)
    }

    // =========================================================================
    // ADMISSION TESTS
    // =========================================================================

    #[test]
    fn test_admit_creates_record() {
        let (mut store, _) = create_store();

        let admission = store.admit(create_submission(0x01, 1, vec![sig(0)])).unwrap();
        assert!(admission.is_created());

        let record = store.get(admission.id()).unwrap();
        assert_eq!(record.signatures.len(), 3);
        assert_eq!(record.signatures.populated(), 1);
        assert_eq!(record.received_at, 1_000);
        assert_eq!(record.last_updated_at, 1_000);
        assert_eq!(store.sender_count(&key(0x01)), 1);
        store.check_consistency().unwrap();
    }

    #[test]
    fn test_identity_ignores_signatures() {
        let (mut store, _) = create_store();

        let first = store.admit(create_submission(0x01, 1, vec![sig(0)])).unwrap();
        let second = store
            .admit(create_submission(0x01, 1, vec![sig(0), sig(1)]))
            .unwrap();

        assert_eq!(first.id(), second.id());
        assert!(matches!(second, Admission::Merged(_)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_admission_limit() {
        let (mut store, _) = create_store();
        let limit = store.config().pending_limit;

        for nonce in 0..limit as u64 {
            store.admit(create_submission(0x01, nonce, vec![])).unwrap();
        }

        let result = store.admit(create_submission(0x01, 99, vec![]));
        assert!(matches!(
            result,
            Err(StoreError::Admission { limit: l, .. }) if l == limit
        ));
        assert_eq!(store.sender_count(&key(0x01)), limit);
        assert_eq!(store.len(), limit);
    }

    #[test]
    fn test_admission_limit_is_per_sender() {
        let (mut store, _) = create_store();
        for nonce in 0..3 {
            store.admit(create_submission(0x01, nonce, vec![])).unwrap();
        }
        assert!(store.admit(create_submission(0x02, 0, vec![])).is_ok());
    }

    #[test]
    fn test_resubmission_at_limit_still_merges() {
        let (mut store, _) = create_store();
        for nonce in 0..3 {
            store.admit(create_submission(0x01, nonce, vec![])).unwrap();
        }

        let merged = store.admit(create_submission(0x01, 0, vec![sig(1)])).unwrap();
        assert!(!merged.is_created());
        assert_eq!(store.get(merged.id()).unwrap().signatures.populated(), 1);
    }

    #[test]
    fn test_admit_rejects_malformed_submissions() {
        let (mut store, _) = create_store();

        let mut bad_min = create_submission(0x01, 1, vec![]);
        bad_min.multisig_asset.min = 4;
        assert!(matches!(store.admit(bad_min), Err(StoreError::Validation(_))));

        let out_of_range = create_submission(0x01, 2, vec![sig(3)]);
        assert!(matches!(store.admit(out_of_range), Err(StoreError::Validation(_))));

        let mut empty = create_submission(0x01, 3, vec![]);
        empty.multisig_asset.public_keys.clear();
        assert!(matches!(store.admit(empty), Err(StoreError::Validation(_))));

        assert!(store.is_empty());
        assert_eq!(store.sender_count(&key(0x01)), 0);
    }

    // =========================================================================
    // MERGE TESTS
    // =========================================================================

    #[test]
    fn test_merge_is_monotonic() {
        let (mut store, clock) = create_store();
        let id = store
            .admit(create_submission(0x01, 1, vec![sig(0), sig(1)]))
            .unwrap()
            .id()
            .clone();

        clock.advance(500);
        store.merge(&id, &[sig(2)], None).unwrap();

        let record = store.get(&id).unwrap();
        assert_eq!(record.signatures.populated(), 3);
        assert_eq!(record.signatures.get(0), Some(sig(0).signature.as_str()));
        assert_eq!(record.signatures.get(2), Some(sig(2).signature.as_str()));
        assert_eq!(record.received_at, 1_000);
        assert_eq!(record.last_updated_at, 1_500);
    }

    #[test]
    fn test_merge_recomputes_transaction_id() {
        let (mut store, _) = create_store();
        let id = store
            .admit(create_submission(0x01, 1, vec![sig(0)]))
            .unwrap()
            .id()
            .clone();
        let before = store.get(&id).unwrap().transaction_id.clone();

        store.merge(&id, &[sig(1)], Some("ab")).unwrap();

        let record = store.get(&id).unwrap();
        assert_ne!(record.transaction_id, before);
        assert_eq!(record.sender_signature.as_deref(), Some("ab"));
    }

    #[test]
    fn test_merge_same_slot_last_write_wins() {
        let (mut store, _) = create_store();
        let id = store
            .admit(create_submission(0x01, 1, vec![sig(0)]))
            .unwrap()
            .id()
            .clone();

        store
            .merge(&id, &[ParticipantSignature::new(0, "11".repeat(64))], None)
            .unwrap();
        assert_eq!(
            store.get(&id).unwrap().signatures.get(0),
            Some("11".repeat(64).as_str())
        );
    }

    #[test]
    fn test_merge_unknown_id() {
        let (mut store, _) = create_store();
        let id = StoreId::from_digest([9; 32]);
        assert_eq!(store.merge(&id, &[sig(0)], None), Err(StoreError::NotFound(id)));
    }

    #[test]
    fn test_merge_invalid_index_leaves_record_untouched() {
        let (mut store, _) = create_store();
        let id = store
            .admit(create_submission(0x01, 1, vec![sig(0)]))
            .unwrap()
            .id()
            .clone();
        let before = store.get(&id).unwrap().clone();

        assert!(store.merge(&id, &[sig(1), sig(7)], None).is_err());
        assert_eq!(store.get(&id).unwrap(), &before);
    }

    // =========================================================================
    // READINESS TESTS
    // =========================================================================

    #[test]
    fn test_readiness_threshold() {
        let (mut store, _) = create_store();
        let id = store
            .admit(create_submission(0x01, 1, vec![sig(0)]))
            .unwrap()
            .id()
            .clone();
        assert_eq!(store.readiness(&id), Some(Readiness::Pending));

        store.merge(&id, &[sig(1)], None).unwrap();
        assert_eq!(store.readiness(&id), Some(Readiness::Ready));
    }

    #[test]
    fn test_registration_needs_every_participant() {
        let (mut store, _) = create_store();
        let mut submission = create_submission(0x01, 1, vec![sig(0), sig(1)]);
        submission.fields.kind = TransactionKind::MultiSignatureRegistration;
        let id = store.admit(submission).unwrap().id().clone();

        assert_eq!(store.readiness(&id), Some(Readiness::Pending));
        store.merge(&id, &[sig(2)], None).unwrap();
        assert_eq!(store.readiness(&id), Some(Readiness::Ready));
    }

    // =========================================================================
    // INDEX TESTS
    // =========================================================================

    #[test]
    fn test_lookup_by_sender_and_participant() {
        let (mut store, _) = create_store();
        let a = store.admit(create_submission(0x01, 1, vec![])).unwrap();
        let b = store.admit(create_submission(0x02, 1, vec![])).unwrap();

        let by_sender = store.get_by_public_key(&key(0x01));
        assert_eq!(by_sender.len(), 1);
        assert_eq!(&by_sender[0].id, a.id());

        let by_participant = store.get_by_public_key(&key(0xA2));
        assert_eq!(by_participant.len(), 2);
        assert!(by_participant[0].id < by_participant[1].id);
        assert!(by_participant.iter().any(|r| &r.id == b.id()));

        assert!(store.get_by_public_key(&key(0xFF)).is_empty());
    }

    #[test]
    fn test_lookup_matches_involvement() {
        let (mut store, _) = create_store();
        store.admit(create_submission(0x01, 1, vec![])).unwrap();
        store.admit(create_submission(0x02, 1, vec![sig(0)])).unwrap();
        let mut shared = create_submission(0xA1, 2, vec![]);
        shared.multisig_asset.public_keys = vec![key(0xA1), key(0xC1)];
        store.admit(shared).unwrap();

        for lookup_key in [key(0x01), key(0x02), key(0xA1), key(0xA2), key(0xC1), key(0xFF)] {
            let found = store.get_by_public_key(&lookup_key);
            assert!(found.iter().all(|r| r.involves(&lookup_key)));

            let involved = store.all().into_iter().filter(|r| r.involves(&lookup_key)).count();
            assert_eq!(found.len(), involved);
        }
    }

    #[test]
    fn test_lookup_deduplicates_sender_who_is_participant() {
        let (mut store, _) = create_store();
        let mut submission = create_submission(0xA1, 1, vec![]);
        submission.fields.sender_public_key = key(0xA1);
        store.admit(submission).unwrap();

        assert_eq!(store.get_by_public_key(&key(0xA1)).len(), 1);
    }

    #[test]
    fn test_remove_prunes_every_index() {
        let (mut store, _) = create_store();
        let id = store
            .admit(create_submission(0x01, 1, vec![]))
            .unwrap()
            .id()
            .clone();

        assert!(store.remove_by_id(&id).is_some());
        assert!(store.remove_by_id(&id).is_none());

        assert!(store.get(&id).is_none());
        assert!(store.get_by_public_key(&key(0x01)).is_empty());
        assert!(store.get_by_public_key(&key(0xA1)).is_empty());
        assert_eq!(store.sender_count(&key(0x01)), 0);
        store.check_consistency().unwrap();
    }

    #[test]
    fn test_clear_removes_everything() {
        let (mut store, _) = create_store();
        store.admit(create_submission(0x01, 1, vec![])).unwrap();
        store.admit(create_submission(0x02, 1, vec![])).unwrap();

        assert_eq!(store.clear(), 2);
        assert!(store.is_empty());
        assert_eq!(store.status(0).senders, 0);
        store.check_consistency().unwrap();
    }

    // =========================================================================
    // EXPIRY TESTS
    // =========================================================================

    #[test]
    fn test_sweep_expired() {
        let (mut store, clock) = create_store();
        let old = store
            .admit(create_submission(0x01, 1, vec![]))
            .unwrap()
            .id()
            .clone();
        clock.advance(30_000);
        let young = store
            .admit(create_submission(0x01, 2, vec![]))
            .unwrap()
            .id()
            .clone();

        let retention = store.config().retention.as_millis() as u64;
        let now = 1_000 + retention + 1;
        assert_eq!(store.expired(now), vec![old.clone()]);

        let removed = store.sweep_expired(now);
        assert_eq!(removed, vec![old]);
        assert!(store.contains(&young));
        assert_eq!(store.sender_count(&key(0x01)), 1);
    }

    #[test]
    fn test_expiry_uses_received_at_not_last_update() {
        let (mut store, clock) = create_store();
        let id = store
            .admit(create_submission(0x01, 1, vec![]))
            .unwrap()
            .id()
            .clone();

        clock.advance(59_000);
        store.merge(&id, &[sig(0)], None).unwrap();

        assert_eq!(store.sweep_expired(1_000 + 60_001), vec![id]);
    }

    #[test]
    fn test_expired_record_frees_admission_slot() {
        let (mut store, clock) = create_store();
        for nonce in 0..3 {
            store.admit(create_submission(0x01, nonce, vec![])).unwrap();
        }
        clock.advance(Duration::from_secs(61).as_millis() as u64);
        let now = clock.now();
        store.sweep_expired(now);

        assert!(store.admit(create_submission(0x01, 10, vec![])).is_ok());
    }

    // =========================================================================
    // LOAD / DUMP TESTS
    // =========================================================================

    #[test]
    fn test_dump_and_load_round_trip() {
        let (mut store, clock) = create_store();
        store.admit(create_submission(0x01, 1, vec![sig(0)])).unwrap();
        store
            .admit(create_submission(0x02, 1, vec![sig(1), sig(2)]))
            .unwrap();
        let dumped = store.dump();
        let snapshots = MockSnapshotStore::with_records(dumped.clone());

        let mut restored = PendingStore::new(
            StoreConfig::for_testing(),
            Arc::new(MockIdentityResolver),
            clock,
        );
        assert_eq!(restored.load(snapshots.load().unwrap()).unwrap(), 2);
        assert_eq!(snapshots.writes(), 0);

        assert_eq!(restored.dump(), dumped);
        restored.check_consistency().unwrap();
    }

    #[test]
    fn test_load_bypasses_admission_limit() {
        let (mut store, _) = create_store();
        let mut config = StoreConfig::for_testing();
        config.pending_limit = 10;
        let mut roomy = PendingStore::new(config, Arc::new(MockIdentityResolver), Arc::new(MockTimeSource::new(0)));
        for nonce in 0..5 {
            roomy.admit(create_submission(0x01, nonce, vec![])).unwrap();
        }

        assert_eq!(store.load(roomy.dump()).unwrap(), 5);
        assert_eq!(store.sender_count(&key(0x01)), 5);
    }

    #[test]
    fn test_load_rejects_id_mismatch() {
        let (mut store, _) = create_store();
        store.admit(create_submission(0x01, 1, vec![])).unwrap();
        let mut records = store.dump();
        records[0].id = StoreId::from_digest([0xEE; 32]);

        let (mut fresh, _) = create_store();
        assert!(matches!(fresh.load(records), Err(StoreError::Internal(_))));
        assert!(fresh.is_empty());
    }

    #[test]
    fn test_load_rejects_slot_count_mismatch() {
        let (mut store, _) = create_store();
        store.admit(create_submission(0x01, 1, vec![])).unwrap();
        store.admit(create_submission(0x02, 1, vec![])).unwrap();
        let mut records = store.dump();
        records[1].signatures = SignatureSlots::new(2);

        let (mut fresh, _) = create_store();
        assert!(matches!(fresh.load(records), Err(StoreError::Internal(_))));
        assert!(fresh.is_empty());
    }

    #[test]
    fn test_load_rejects_invalid_asset() {
        let (mut store, _) = create_store();
        store.admit(create_submission(0x01, 1, vec![])).unwrap();
        let valid = store.dump();

        let mut zero_min = valid.clone();
        zero_min[0].multisig_asset.min = 0;

        let mut duplicate_key = valid.clone();
        duplicate_key[0].multisig_asset.public_keys[2] = key(0xA2);

        let mut min_above_count = valid.clone();
        min_above_count[0].multisig_asset.min = 4;

        let mut too_many = valid.clone();
        too_many[0].multisig_asset.public_keys = (0..17).map(|i| key(0xB0 + i)).collect();
        too_many[0].signatures = SignatureSlots::new(17);

        for records in [zero_min, duplicate_key, min_above_count, too_many] {
            let (mut fresh, _) = create_store();
            assert!(matches!(fresh.load(records), Err(StoreError::Internal(_))));
            assert!(fresh.is_empty());
            assert!(fresh.get_by_public_key(&key(0xA2)).is_empty());
        }

        let (mut fresh, _) = create_store();
        assert_eq!(fresh.load(valid).unwrap(), 1);
    }

    // =========================================================================
    // STATUS TESTS
    // =========================================================================

    #[test]
    fn test_status() {
        let (mut store, _) = create_store();
        store.admit(create_submission(0x01, 1, vec![sig(0), sig(1)])).unwrap();
        store.admit(create_submission(0x01, 2, vec![])).unwrap();
        store.admit(create_submission(0x02, 1, vec![])).unwrap();

        let status = store.status(4_000);
        assert_eq!(status.total, 3);
        assert_eq!(status.ready, 1);
        assert_eq!(status.pending, 2);
        assert_eq!(status.senders, 2);
        assert_eq!(status.oldest_age_ms, 3_000);
    }

    #[test]
    fn test_confirmation_candidates_oldest_first() {
        let (mut store, clock) = create_store();
        let first = store.admit(create_submission(0x01, 1, vec![])).unwrap();
        clock.advance(10);
        let second = store.admit(create_submission(0x02, 1, vec![])).unwrap();

        let candidates = store.confirmation_candidates();
        assert_eq!(candidates.len(), 2);
        assert_eq!(&candidates[0].id, first.id());
        assert_eq!(&candidates[1].id, second.id());
        assert_eq!(
            candidates[0].transaction_id,
            store.get(first.id()).unwrap().transaction_id
        );
    }
}
