//! # Snapshot Codec
//!
//! Encodes the full record set as one flat JSON object keyed by canonical id.
//!
//! ```text
//! {
//!   "<id>": { "id": "<id>", "fields": {..}, "signatures": [..], .. },
//!   ...
//! }
//! ```
//!
//! Keys are written in ascending id order so consecutive snapshots of the
//! same state are byte-identical.

use super::entities::{StoreId, StoreTransaction};
use super::errors::StoreError;
use std::collections::BTreeMap;

/// Encoded form of an empty snapshot.
pub const EMPTY_SNAPSHOT: &str = "{}";

/// Snapshot encoder/decoder.
#[derive(Clone, Copy, Debug, Default)]
pub struct SnapshotCodec;

impl SnapshotCodec {
    pub fn new() -> Self {
        Self
    }

    /// Encodes records as pretty JSON keyed by id.
    pub fn encode(&self, records: &[StoreTransaction]) -> Result<Vec<u8>, StoreError> {
        let map: BTreeMap<&StoreId, &StoreTransaction> =
            records.iter().map(|record| (&record.id, record)).collect();
        if map.len() != records.len() {
            return Err(StoreError::internal("snapshot contains duplicate ids"));
        }
        Ok(serde_json::to_vec_pretty(&map)?)
    }

    /// Decodes a snapshot, checking that every key matches its record's id.
    ///
    /// Records come back in ascending id order.
    pub fn decode(&self, bytes: &[u8]) -> Result<Vec<StoreTransaction>, StoreError> {
        if bytes.iter().all(|b| b.is_ascii_whitespace()) {
            return Ok(Vec::new());
        }
        let map: BTreeMap<String, StoreTransaction> = serde_json::from_slice(bytes)?;
        let mut records = Vec::with_capacity(map.len());
        for (key, record) in map {
            if key != record.id.as_str() {
                return Err(StoreError::internal(format!(
                    "snapshot key {} does not match record id {}",
                    key, record.id
                )));
            }
            records.push(record);
        }
        Ok(records)
    }
}
