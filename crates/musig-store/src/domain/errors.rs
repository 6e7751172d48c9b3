//! Pending store error types.
//!
//! Every store operation either succeeds or fails with exactly one of these
//! kinds, and a failed operation leaves the store unchanged.

use super::entities::{PublicKey, StoreId};
use thiserror::Error;

/// Pending store error type.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Malformed fields, out-of-range index, or a signature that failed
    /// verification.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Sender already has the maximum number of live records.
    #[error("sender {sender} reached limit of {limit} pending transactions")]
    Admission { sender: PublicKey, limit: usize },

    /// No live record for the id.
    #[error("transaction not found: {0}")]
    NotFound(StoreId),

    /// Persistence failure or broken invariant.
    #[error("internal error: {0}")]
    Internal(String),
}

impl StoreError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Short label for log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Admission { .. } => "admission",
            Self::NotFound(_) => "not_found",
            Self::Internal(_) => "internal",
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal(format!("io: {}", err))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(format!("json: {}", err))
    }
}
