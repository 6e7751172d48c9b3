//! # Inbound Port - PendingStoreApi
//!
//! Primary driving port used by request handlers.
//!
//! | Method | Store operation |
//! |--------|-----------------|
//! | `submit` | `admit` (create or merge) |
//! | `find` | `get` |
//! | `find_by_public_key` | `get_by_public_key` |
//! | `list_all` | `all` |
//! | `delete` | `remove_by_id` |
//! | `delete_all` | `clear` |
//! | `get_status` | `status` |

use crate::domain::{
    Admission, PendingStore, PublicKey, StoreError, StoreId, StoreStatus, StoreTransaction,
    Submission,
};

/// Primary API for the pending store.
///
/// Results are owned copies so callers can release the store lock before
/// serializing them.
pub trait PendingStoreApi: Send + Sync {
    /// Admits a verified submission or merges it into the matching record.
    ///
    /// # Errors
    /// - `Validation`: malformed participant set or signature index
    /// - `Admission`: sender has too many pending transactions
    fn submit(&mut self, submission: Submission) -> Result<Admission, StoreError>;

    /// Gets a record by canonical id.
    fn find(&self, id: &StoreId) -> Option<StoreTransaction>;

    /// Gets every record the key sends or may sign, ascending by id.
    fn find_by_public_key(&self, key: &PublicKey) -> Vec<StoreTransaction>;

    /// Gets every live record, ascending by id.
    fn list_all(&self) -> Vec<StoreTransaction>;

    /// Removes a record.
    ///
    /// # Errors
    /// - `NotFound`: no live record for `id`
    fn delete(&mut self, id: &StoreId) -> Result<StoreTransaction, StoreError>;

    /// Removes every record, returning how many were removed.
    fn delete_all(&mut self) -> usize;

    /// Gets the current store status.
    fn get_status(&self) -> StoreStatus;
}

impl PendingStoreApi for PendingStore {
    fn submit(&mut self, submission: Submission) -> Result<Admission, StoreError> {
        self.admit(submission)
    }

    fn find(&self, id: &StoreId) -> Option<StoreTransaction> {
        self.get(id).cloned()
    }

    fn find_by_public_key(&self, key: &PublicKey) -> Vec<StoreTransaction> {
        self.get_by_public_key(key).into_iter().cloned().collect()
    }

    fn list_all(&self) -> Vec<StoreTransaction> {
        self.dump()
    }

    fn delete(&mut self, id: &StoreId) -> Result<StoreTransaction, StoreError> {
        self.remove_by_id(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    fn delete_all(&mut self) -> usize {
        self.clear()
    }

    fn get_status(&self) -> StoreStatus {
        self.status(self.now())
    }
}
