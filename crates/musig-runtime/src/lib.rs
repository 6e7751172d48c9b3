//! # MuSig Coordinator Runtime
//!
//! Wires the pending store to its concrete adapters and runs it.
//!
//! ## Modular Structure
//!
//! - `adapters/` - SHA-256 identity, Schnorr verification, HTTP ledger lookup
//! - `api/` - transport-agnostic request handlers and payloads
//! - `config` - `NodeConfig` with `MUSIG_*` environment overrides
//! - `runtime` - startup and graceful shutdown
//!
//! ```text
//!   caller ──→ ApiHandler ──→ SharedStore ←── BackgroundTasks
//!                  │               │            │    │    │
//!          SchnorrVerifier   Sha256Identity  expiry  │  snapshot ──→ <mode>.json
//!                                                    │
//!                                            confirmation ──→ HttpLedgerLookup
//! ```

pub mod adapters;
pub mod api;
pub mod config;
pub mod runtime;

pub use api::{ApiError, ApiHandler, ApiResult};
pub use config::{ConfigError, NodeConfig};
pub use runtime::{Collaborators, CoordinatorRuntime};
