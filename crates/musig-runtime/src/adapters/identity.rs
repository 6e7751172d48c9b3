//! SHA-256 identity resolver.
//!
//! The canonical encoding is the JSON form of `TransactionFields` with the
//! keys of every object, struct fields included, rewritten in sorted order.
//! Equal fields hash to the same digest whatever order their keys arrived
//! in and whichever map backs `serde_json::Value`.

use musig_store::{IdentityResolver, SignatureSlots, StoreError, StoreId, TransactionFields};
use serde_json::Value;
use sha2::{Digest, Sha256};

/// Rebuilds objects with their keys in ascending order, recursively.
fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, sort_keys(value)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}

/// Derives ids by hashing the canonical encoding with SHA-256.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256IdentityResolver;

impl Sha256IdentityResolver {
    pub fn new() -> Self {
        Self
    }

    /// Canonical byte encoding of the non-signature fields.
    pub fn canonical_encoding(fields: &TransactionFields) -> Result<Vec<u8>, StoreError> {
        let value = sort_keys(serde_json::to_value(fields)?);
        Ok(serde_json::to_vec(&value)?)
    }

    /// Digest over the non-signature fields.
    ///
    /// This is both the canonical id and the message co-signers sign.
    pub fn signing_digest(fields: &TransactionFields) -> Result<[u8; 32], StoreError> {
        let encoded = Self::canonical_encoding(fields)?;
        Ok(Sha256::digest(&encoded).into())
    }
}

impl IdentityResolver for Sha256IdentityResolver {
    fn canonical_id(&self, fields: &TransactionFields) -> Result<StoreId, StoreError> {
        Ok(StoreId::from_digest(Self::signing_digest(fields)?))
    }

    fn transaction_id(
        &self,
        fields: &TransactionFields,
        signatures: &SignatureSlots,
        sender_signature: Option<&str>,
    ) -> Result<String, StoreError> {
        let mut hasher = Sha256::new();
        hasher.update(Self::canonical_encoding(fields)?);
        for signature in signatures.iter_populated() {
            hasher.update([signature.index]);
            hasher.update(signature.signature.as_bytes());
        }
        if let Some(sender_signature) = sender_signature {
            hasher.update(b"sender");
            hasher.update(sender_signature.as_bytes());
        }
        Ok(hex::encode(hasher.finalize()))
    }
}
