//! # Multi-Signature Pending Store
//!
//! Collects partial signatures for threshold transactions before they are
//! broadcast. Co-signers submit the same transaction independently, each
//! carrying a different, growing set of signatures; the store recognizes
//! them as one logical transaction, merges them into one record, reports
//! readiness, and discards the record once it expires or lands on the ledger.
//!
//! ## Domain Invariants
//!
//! | Invariant | Enforcement Location |
//! |-----------|---------------------|
//! | Id ignores signatures | `IdentityResolver::canonical_id` over `TransactionFields` only |
//! | Populated slots ≤ participants | `SignatureSlots::merge` index check |
//! | Participant set immutable | `PendingStore::merge` only touches slots |
//! | At most `pending_limit` records per sender | `PendingStore::admit` via sender index |
//! | Indexes agree with primary map | `insert_internal` / `remove_internal`, `check_consistency` |
//!
//! ## Record Lifecycle
//!
//! ```text
//! submit ──admit──→ [PENDING] ──merge──→ [READY] ──┐
//!                       │                          │
//!                       ├── retention elapsed ─────┤
//!                       ├── ledger includes it ────┼──→ [REMOVED]
//!                       └── explicit delete ───────┘
//! ```
//!
//! Readiness is never stored: a record is `Ready` once its populated slots
//! reach the effective quorum (every participant for a wallet registration,
//! the stated minimum otherwise).
//!
//! ## Module Structure (Hexagonal Architecture)
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      OUTER LAYER                                │
//! │  adapters/ - JSON snapshot file with advisory lock              │
//! │  tasks/    - Expiry, confirmation and snapshot background tasks │
//! └─────────────────────────────────────────────────────────────────┘
//!                          ↑ implements ↑
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      MIDDLE LAYER                               │
//! │  ports/inbound.rs  - PendingStoreApi trait                      │
//! │  ports/outbound.rs - IdentityResolver, SignatureVerifier,       │
//! │                      LedgerLookup, SnapshotStore, TimeSource    │
//! └─────────────────────────────────────────────────────────────────┘
//!                          ↑ uses ↑
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      INNER LAYER                                │
//! │  domain/entities.rs    - StoreTransaction, SignatureSlots       │
//! │  domain/store.rs       - PendingStore with secondary indexes    │
//! │  domain/persistence.rs - SnapshotCodec                          │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Concurrency
//!
//! The store is shared as `Arc<parking_lot::RwLock<PendingStore>>`. Every
//! operation completes under one guard; the confirmation reaper copies its
//! candidates under a read guard and never holds a lock across a ledger
//! lookup.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod tasks;

pub use adapters::JsonFileSnapshotStore;
pub use domain::{
    Admission, MultiSignatureAsset, ParticipantSignature, PendingStore, PublicKey, Readiness,
    SignatureSlots, StoreConfig, StoreError, StoreId, StoreStatus, StoreTransaction,
    Submission, SweepReport, Timestamp, TransactionFields, TransactionKind,
};
pub use ports::{
    IdentityResolver, LedgerError, LedgerLookup, PendingStoreApi, SignatureVerifier,
    SnapshotStore, SystemTimeSource, TimeSource,
};
pub use tasks::{shared, BackgroundTasks, SharedStore, TaskConfig};
