//! Collaborator adapters for the pending store's outbound ports.
//!
//! | Adapter | Port | Backing crate |
//! |---------|------|---------------|
//! | `Sha256IdentityResolver` | `IdentityResolver` | `sha2` |
//! | `SchnorrVerifier` | `SignatureVerifier` | `k256` (BIP-340) |
//! | `HttpLedgerLookup` | `LedgerLookup` | `reqwest` |

pub mod identity;
pub mod ledger;
pub mod verifier;

pub use identity::Sha256IdentityResolver;
pub use ledger::HttpLedgerLookup;
pub use verifier::SchnorrVerifier;
