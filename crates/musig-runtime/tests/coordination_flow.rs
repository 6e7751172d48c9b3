//! # Coordination Flow Tests
//!
//! End-to-end tests over the real adapters: SHA-256 identity, Schnorr
//! verification and the JSON snapshot file in a temporary directory.
//!
//! ## Test Categories
//!
//! 1. **Signature Collection**: partial submission, merge, readiness
//! 2. **Persistence**: shutdown snapshot survives a restart
//! 3. **Exclusive Ownership**: a second runtime cannot open the same snapshot

use k256::ecdsa::signature::hazmat::PrehashSigner;
use k256::schnorr::{Signature, SigningKey};
use musig_runtime::adapters::Sha256IdentityResolver;
use musig_runtime::api::{ListQuery, StoreRequest};
use musig_runtime::{CoordinatorRuntime, NodeConfig};
use musig_store::{
    MultiSignatureAsset, ParticipantSignature, PublicKey, Readiness, TransactionFields,
    TransactionKind,
};
use tempfile::TempDir;

// =============================================================================
// HELPERS
// =============================================================================

struct Participant {
    key: SigningKey,
    public: PublicKey,
}

impl Participant {
    fn new(seed: u8) -> Self {
        let key = SigningKey::from_bytes(&[seed; 32]).unwrap();
        let public = PublicKey::parse(&format!(
            "02{}",
            hex::encode(key.verifying_key().to_bytes())
        ))
        .unwrap();
        Self { key, public }
    }

    fn sign(&self, index: u8, fields: &TransactionFields) -> String {
        let digest = Sha256IdentityResolver::signing_digest(fields).unwrap();
        let signature: Signature = self.key.sign_prehash(&digest).unwrap();
        ParticipantSignature::new(index, hex::encode(signature.to_bytes())).to_prefixed()
    }
}

struct Wallet {
    participants: Vec<Participant>,
    fields: TransactionFields,
}

impl Wallet {
    fn new() -> Self {
        let participants: Vec<Participant> = (7..=9).map(Participant::new).collect();
        let fields = TransactionFields {
            kind: TransactionKind::Other {
                type_group: 1,
                type_id: 0,
            },
            sender_public_key: participants[0].public.clone(),
            payload: serde_json::json!({
                "amount": "250000",
                "recipient": "recipient-address",
                "nonce": "4",
            }),
        };
        Self {
            participants,
            fields,
        }
    }

    fn request(&self, signed_by: &[usize]) -> StoreRequest {
        StoreRequest {
            fields: self.fields.clone(),
            multisig_asset: MultiSignatureAsset {
                min: 2,
                public_keys: self.participants.iter().map(|p| p.public.clone()).collect(),
            },
            signatures: signed_by
                .iter()
                .map(|&i| self.participants[i].sign(i as u8, &self.fields))
                .collect(),
            sender_signature: None,
        }
    }
}

fn config(dir: &TempDir) -> NodeConfig {
    let mut config = NodeConfig::default();
    config.storage.data_dir = dir.path().to_path_buf();
    // Nothing listens here; confirmation lookups fail and records are kept.
    config.network.ledger_host = "http://127.0.0.1:9".to_string();
    config
}

// =============================================================================
// SIGNATURE COLLECTION
// =============================================================================

#[tokio::test]
async fn test_signatures_accumulate_until_ready() {
    let dir = TempDir::new().unwrap();
    let wallet = Wallet::new();
    let runtime = CoordinatorRuntime::new(config(&dir)).unwrap();
    let handler = runtime.handler();

    let first = handler.handle_store(wallet.request(&[0])).unwrap();
    let view = handler.handle_show(first.id.as_str()).unwrap();
    assert_eq!(view.state, Readiness::Pending);

    let second = handler.handle_store(wallet.request(&[0, 1])).unwrap();
    assert_eq!(first.id, second.id);

    let view = handler.handle_show(second.id.as_str()).unwrap();
    assert_eq!(view.state, Readiness::Ready);
    assert_eq!(view.signatures.len(), 2);

    let query = ListQuery {
        public_key: Some(wallet.participants[2].public.as_str().to_string()),
        state: Some("ready".to_string()),
    };
    assert_eq!(handler.handle_list(query).unwrap().len(), 1);

    runtime.shutdown().await.unwrap();
}

// =============================================================================
// PERSISTENCE
// =============================================================================

#[tokio::test]
async fn test_snapshot_survives_restart() {
    let dir = TempDir::new().unwrap();
    let wallet = Wallet::new();

    let id = {
        let mut runtime = CoordinatorRuntime::new(config(&dir)).unwrap();
        runtime.start();
        let id = runtime
            .handler()
            .handle_store(wallet.request(&[1]))
            .unwrap()
            .id;
        assert_eq!(runtime.shutdown().await.unwrap(), 1);
        id
    };

    assert!(dir.path().join("testnet.json").exists());

    let runtime = CoordinatorRuntime::new(config(&dir)).unwrap();
    let handler = runtime.handler();
    let view = handler.handle_show(id.as_str()).unwrap();
    assert_eq!(view.state, Readiness::Pending);
    assert_eq!(view.signatures.len(), 1);
    assert!(view.signatures[0].starts_with("01"));

    // The restored record still merges.
    let merged = handler.handle_store(wallet.request(&[2])).unwrap();
    assert_eq!(merged.id, id);
    assert_eq!(
        handler.handle_show(id.as_str()).unwrap().state,
        Readiness::Ready
    );

    runtime.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_delete_all_is_persisted() {
    let dir = TempDir::new().unwrap();
    let wallet = Wallet::new();

    let runtime = CoordinatorRuntime::new(config(&dir)).unwrap();
    runtime.handler().handle_store(wallet.request(&[0])).unwrap();
    assert_eq!(runtime.handler().handle_delete_all().removed, 1);
    assert_eq!(runtime.shutdown().await.unwrap(), 0);

    let runtime = CoordinatorRuntime::new(config(&dir)).unwrap();
    assert_eq!(runtime.handler().handle_status().total, 0);
    runtime.shutdown().await.unwrap();
}

// =============================================================================
// EXCLUSIVE OWNERSHIP
// =============================================================================

#[tokio::test]
async fn test_second_runtime_cannot_share_snapshot() {
    let dir = TempDir::new().unwrap();

    let runtime = CoordinatorRuntime::new(config(&dir)).unwrap();
    assert!(CoordinatorRuntime::new(config(&dir)).is_err());

    runtime.shutdown().await.unwrap();
    let reopened = CoordinatorRuntime::new(config(&dir)).unwrap();
    reopened.shutdown().await.unwrap();
}
