//! # Domain Layer - Pending Store
//!
//! Pure business logic for collecting partial signatures.
//!
//! ## Components
//!
//! - `entities`: StoreTransaction, TransactionFields, SignatureSlots, StoreConfig
//! - `store`: PendingStore with sender and participant indexes
//! - `services`: Quorum rules and submission validation
//! - `value_objects`: Readiness, Admission, StoreStatus
//! - `persistence`: SnapshotCodec for the JSON snapshot
//! - `errors`: StoreError enumeration
//!
//! ## Data Types
//!
//! - PublicKey: 33-byte compressed secp256k1 key, hex encoded
//! - StoreId: 32-byte canonical id, hex encoded
//! - Timestamp: milliseconds since UNIX epoch

pub mod entities;
pub mod errors;
pub mod persistence;
pub mod services;
pub mod store;
pub mod value_objects;

pub use entities::*;
pub use errors::*;
pub use persistence::*;
pub use services::*;
pub use store::*;
pub use value_objects::*;
