//! Request and response payloads for the coordination API.
//!
//! Signatures travel index-prefixed: one hex byte for the participant
//! index followed by the 64-byte signature.

use musig_store::{
    MultiSignatureAsset, Readiness, StoreId, StoreTransaction, Timestamp, TransactionFields,
};
use serde::{Deserialize, Serialize};

/// Query for `list`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    /// Sender or participant key; all records when absent.
    #[serde(default)]
    pub public_key: Option<String>,
    /// `pending` or `ready`.
    #[serde(default)]
    pub state: Option<String>,
}

/// Body of `store`.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreRequest {
    pub fields: TransactionFields,
    pub multisig_asset: MultiSignatureAsset,
    /// Index-prefixed signatures.
    #[serde(default)]
    pub signatures: Vec<String>,
    #[serde(default)]
    pub sender_signature: Option<String>,
}

/// `{ "id": ... }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdResponse {
    pub id: StoreId,
}

/// `{ "removed": ... }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemovedResponse {
    pub removed: usize,
}

/// A record as returned to callers, with its derived state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionView {
    pub id: StoreId,
    pub fields: TransactionFields,
    pub multisig_asset: MultiSignatureAsset,
    /// Populated slots, index-prefixed, in slot order.
    pub signatures: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender_signature: Option<String>,
    pub transaction_id: String,
    pub received_at: Timestamp,
    pub last_updated_at: Timestamp,
    pub state: Readiness,
}

impl From<StoreTransaction> for TransactionView {
    fn from(record: StoreTransaction) -> Self {
        let state = record.readiness();
        let signatures = record
            .signatures
            .iter_populated()
            .map(|signature| signature.to_prefixed())
            .collect();
        Self {
            id: record.id,
            fields: record.fields,
            multisig_asset: record.multisig_asset,
            signatures,
            sender_signature: record.sender_signature,
            transaction_id: record.transaction_id,
            received_at: record.received_at,
            last_updated_at: record.last_updated_at,
            state,
        }
    }
}
