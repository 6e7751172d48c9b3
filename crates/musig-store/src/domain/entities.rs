//! Core domain entities for the pending store.
//!
//! Defines the coordination record, its transaction envelope, and the
//! strongly-typed keys and identifiers the store indexes by.

use super::errors::StoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Timestamp in milliseconds since UNIX epoch.
pub type Timestamp = u64;

/// Length of a compressed secp256k1 public key in bytes.
pub const PUBLIC_KEY_LEN: usize = 33;

/// Length of a partial signature in bytes (without the index prefix).
pub const SIGNATURE_LEN: usize = 64;

/// Length of a canonical id in bytes (hex encoded to 64 chars).
pub const STORE_ID_LEN: usize = 32;

/// Compressed secp256k1 public key, stored as lowercase hex.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PublicKey(String);

impl PublicKey {
    /// Parses a hex encoded compressed public key.
    pub fn parse(value: &str) -> Result<Self, StoreError> {
        let bytes = hex::decode(value)
            .map_err(|e| StoreError::validation(format!("public key is not hex: {}", e)))?;
        if bytes.len() != PUBLIC_KEY_LEN {
            return Err(StoreError::validation(format!(
                "public key must be {} bytes, got {}",
                PUBLIC_KEY_LEN,
                bytes.len()
            )));
        }
        if bytes[0] != 0x02 && bytes[0] != 0x03 {
            return Err(StoreError::validation("public key is not compressed"));
        }
        Ok(Self(value.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the raw 33 key bytes.
    pub fn to_bytes(&self) -> [u8; PUBLIC_KEY_LEN] {
        let mut out = [0u8; PUBLIC_KEY_LEN];
        // Validated on construction.
        if let Ok(bytes) = hex::decode(&self.0) {
            out.copy_from_slice(&bytes);
        }
        out
    }
}

impl TryFrom<String> for PublicKey {
    type Error = StoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PublicKey> for String {
    fn from(key: PublicKey) -> Self {
        key.0
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Canonical identifier of a coordination record.
///
/// Derived only from the non-signature fields of a transaction, so every
/// co-signer's submission of the same transaction maps to the same id.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StoreId(String);

impl StoreId {
    /// Parses a 64 character hex id.
    pub fn parse(value: &str) -> Result<Self, StoreError> {
        if value.len() != STORE_ID_LEN * 2 || !value.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(StoreError::validation(format!(
                "id must be {} hex characters",
                STORE_ID_LEN * 2
            )));
        }
        Ok(Self(value.to_ascii_lowercase()))
    }

    /// Builds an id from a 32-byte digest.
    pub fn from_digest(digest: [u8; STORE_ID_LEN]) -> Self {
        Self(hex::encode(digest))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for StoreId {
    type Error = StoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<StoreId> for String {
    fn from(id: StoreId) -> Self {
        id.0
    }
}

impl fmt::Display for StoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Transaction kind.
///
/// Only the registration of the multi-signature account itself changes how
/// the store behaves: it needs every participant to sign.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// Registration of the multi-signature wallet; quorum is all participants.
    MultiSignatureRegistration,
    /// Any other transaction, identified by its type group and type.
    Other { type_group: u32, type_id: u16 },
}

impl TransactionKind {
    pub fn is_registration(&self) -> bool {
        matches!(self, Self::MultiSignatureRegistration)
    }
}

/// The non-signature fields of a transaction.
///
/// `payload` carries the kind-specific fields. The store never looks inside
/// it; only the identity resolver and signature verifier do.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransactionFields {
    pub kind: TransactionKind,
    pub sender_public_key: PublicKey,
    #[serde(default)]
    pub payload: serde_json::Value,
}

/// Participant set and stated threshold of a multi-signature wallet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiSignatureAsset {
    /// Stated minimum number of signatures.
    pub min: u8,
    /// Keys eligible to sign, in slot order.
    pub public_keys: Vec<PublicKey>,
}

/// A partial signature bound to a participant slot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParticipantSignature {
    pub index: u8,
    /// 64-byte signature, hex encoded.
    pub signature: String,
}

impl ParticipantSignature {
    pub fn new(index: u8, signature: impl Into<String>) -> Self {
        Self {
            index,
            signature: signature.into(),
        }
    }

    /// Parses the index-prefixed wire form: one index byte followed by the
    /// 64-byte signature, all hex.
    pub fn parse_prefixed(value: &str) -> Result<Self, StoreError> {
        let expected = (1 + SIGNATURE_LEN) * 2;
        if value.len() != expected || !value.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(StoreError::validation(format!(
                "signature must be {} hex characters",
                expected
            )));
        }
        let index = u8::from_str_radix(&value[..2], 16)
            .map_err(|e| StoreError::validation(format!("bad signature index: {}", e)))?;
        Ok(Self::new(index, value[2..].to_ascii_lowercase()))
    }

    /// Renders the index-prefixed wire form.
    pub fn to_prefixed(&self) -> String {
        format!("{:02x}{}", self.index, self.signature)
    }
}

/// One signature slot per participant, each empty or filled.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignatureSlots(Vec<Option<String>>);

impl SignatureSlots {
    /// Creates `participants` empty slots.
    pub fn new(participants: usize) -> Self {
        Self(vec![None; participants])
    }

    /// Number of slots (always the participant count).
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of filled slots.
    pub fn populated(&self) -> usize {
        self.0.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).and_then(|slot| slot.as_deref())
    }

    /// Writes the given signatures into their slots.
    ///
    /// Slots not mentioned are left as they are. Fails without writing
    /// anything if an index is out of range.
    pub fn merge(&mut self, incoming: &[ParticipantSignature]) -> Result<(), StoreError> {
        if let Some(bad) = incoming.iter().find(|s| s.index as usize >= self.0.len()) {
            return Err(StoreError::validation(format!(
                "signature index {} out of range for {} participants",
                bad.index,
                self.0.len()
            )));
        }
        for signature in incoming {
            self.0[signature.index as usize] = Some(signature.signature.clone());
        }
        Ok(())
    }

    /// Filled slots as participant signatures, in slot order.
    pub fn iter_populated(&self) -> impl Iterator<Item = ParticipantSignature> + '_ {
        self.0.iter().enumerate().filter_map(|(index, slot)| {
            slot.as_ref()
                .map(|signature| ParticipantSignature::new(index as u8, signature.clone()))
        })
    }
}

/// A pending multi-signature transaction and its collected signatures.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoreTransaction {
    /// Canonical id (immutable).
    pub id: StoreId,
    /// Non-signature fields.
    pub fields: TransactionFields,
    /// Participants and stated threshold (immutable).
    pub multisig_asset: MultiSignatureAsset,
    /// Participant signatures, one slot per participant.
    pub signatures: SignatureSlots,
    /// Final signature of the sender, when the scheme needs one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_signature: Option<String>,
    /// Id the ledger knows the signed transaction by.
    pub transaction_id: String,
    /// When the record was first admitted (ms).
    pub received_at: Timestamp,
    /// When a signature was last merged (ms).
    pub last_updated_at: Timestamp,
}

impl StoreTransaction {
    pub fn sender(&self) -> &PublicKey {
        &self.fields.sender_public_key
    }

    pub fn participants(&self) -> &[PublicKey] {
        &self.multisig_asset.public_keys
    }

    /// Signatures required before the transaction can be broadcast.
    pub fn effective_quorum(&self) -> usize {
        super::services::effective_quorum(&self.fields.kind, &self.multisig_asset)
    }

    /// Ready once populated slots reach the effective quorum.
    pub fn readiness(&self) -> super::value_objects::Readiness {
        super::services::readiness(self)
    }

    /// Returns true if `key` is the sender or one of the participants.
    pub fn involves(&self, key: &PublicKey) -> bool {
        self.sender() == key || self.participants().contains(key)
    }

    /// Checks if the record outlived the retention window.
    pub fn is_expired(&self, now: Timestamp, retention: Duration) -> bool {
        now.saturating_sub(self.received_at) > retention.as_millis() as u64
    }
}

/// One co-signer's view of a transaction, as handed to the store.
///
/// Signatures are expected to be verified by the caller.
#[derive(Clone, Debug, PartialEq)]
pub struct Submission {
    pub fields: TransactionFields,
    pub multisig_asset: MultiSignatureAsset,
    pub signatures: Vec<ParticipantSignature>,
    pub sender_signature: Option<String>,
}

/// Store configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Maximum live records per sender.
    pub pending_limit: usize,
    /// Maximum participants in one wallet.
    pub max_participants: usize,
    /// How long a record may stay pending.
    pub retention: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            pending_limit: 10,
            max_participants: 16,
            retention: Duration::from_secs(24 * 60 * 60),
        }
    }
}

impl StoreConfig {
    /// Creates a small config for testing.
    pub fn for_testing() -> Self {
        Self {
            pending_limit: 3,
            max_participants: 16,
            retention: Duration::from_secs(60),
        }
    }
}
