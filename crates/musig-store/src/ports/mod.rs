//! Ports layer for the pending store.
//!
//! Defines the hexagonal architecture port traits:
//! - Inbound (Driving) ports: API exposed to request handlers
//! - Outbound (Driven) ports: identity, verification, ledger, snapshot and time

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
