//! BIP-340 Schnorr signature verifier.
//!
//! Participants sign the SHA-256 signing digest of the transaction fields.
//! The x-only verification key is the compressed key without its parity
//! byte.

use super::identity::Sha256IdentityResolver;
use k256::ecdsa::signature::hazmat::PrehashVerifier;
use k256::schnorr::{Signature, VerifyingKey};
use musig_store::{PublicKey, SignatureVerifier, TransactionFields};
use tracing::debug;

/// Verifies 64-byte Schnorr signatures with `k256`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchnorrVerifier;

impl SchnorrVerifier {
    pub fn new() -> Self {
        Self
    }
}

impl SignatureVerifier for SchnorrVerifier {
    fn verify(&self, fields: &TransactionFields, signature_hex: &str, public_key: &PublicKey) -> bool {
        let Ok(signature_bytes) = hex::decode(signature_hex) else {
            return false;
        };
        let Ok(signature) = Signature::try_from(signature_bytes.as_slice()) else {
            return false;
        };
        let key_bytes = public_key.to_bytes();
        let Ok(verifying_key) = VerifyingKey::from_bytes(&key_bytes[1..]) else {
            debug!(key = %public_key, "Public key is not on the curve");
            return false;
        };
        let Ok(digest) = Sha256IdentityResolver::signing_digest(fields) else {
            return false;
        };

        verifying_key.verify_prehash(&digest, &signature).is_ok()
    }
}
