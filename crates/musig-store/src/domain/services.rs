//! Domain services for the pending store.
//!
//! Pure functions over entities: quorum rules and submission validation.

use super::entities::{
    MultiSignatureAsset, ParticipantSignature, StoreTransaction, TransactionKind,
};
use super::errors::StoreError;
use super::value_objects::Readiness;
use std::collections::HashSet;

/// Upper bound imposed by the one-byte index prefix.
pub const MAX_INDEXABLE_PARTICIPANTS: usize = 256;

/// Number of signatures a transaction needs before broadcast.
///
/// Registration of the wallet itself needs every participant; everything
/// else needs the stated minimum.
pub fn effective_quorum(kind: &TransactionKind, asset: &MultiSignatureAsset) -> usize {
    if kind.is_registration() {
        asset.public_keys.len()
    } else {
        asset.min as usize
    }
}

/// Derives readiness from the populated slot count.
pub fn readiness(record: &StoreTransaction) -> Readiness {
    if record.signatures.populated() >= record.effective_quorum() {
        Readiness::Ready
    } else {
        Readiness::Pending
    }
}

/// Validates a participant set against the configured bound.
pub fn validate_asset(asset: &MultiSignatureAsset, max_participants: usize) -> Result<(), StoreError> {
    let count = asset.public_keys.len();
    if count == 0 {
        return Err(StoreError::validation("participant list is empty"));
    }
    let bound = max_participants.min(MAX_INDEXABLE_PARTICIPANTS);
    if count > bound {
        return Err(StoreError::validation(format!(
            "{} participants exceeds maximum of {}",
            count, bound
        )));
    }

    let mut seen = HashSet::with_capacity(count);
    for key in &asset.public_keys {
        if !seen.insert(key) {
            return Err(StoreError::validation(format!(
                "duplicate participant key {}",
                key
            )));
        }
    }

    if asset.min == 0 || asset.min as usize > count {
        return Err(StoreError::validation(format!(
            "min {} must be between 1 and {}",
            asset.min, count
        )));
    }
    Ok(())
}

/// Validates incoming signature indices against the participant count.
pub fn validate_signatures(
    signatures: &[ParticipantSignature],
    participants: usize,
) -> Result<(), StoreError> {
    let mut seen = HashSet::with_capacity(signatures.len());
    for signature in signatures {
        if signature.index as usize >= participants {
            return Err(StoreError::validation(format!(
                "signature index {} out of range for {} participants",
                signature.index, participants
            )));
        }
        if !seen.insert(signature.index) {
            return Err(StoreError::validation(format!(
                "signature index {} repeated",
                signature.index
            )));
        }
    }
    Ok(())
}
