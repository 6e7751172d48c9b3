//! Adapters for the pending store's outbound ports.
//!
//! - `json_file`: snapshot persistence in a flat JSON file

pub mod json_file;

pub use json_file::{JsonFileSnapshotStore, SnapshotLock};
