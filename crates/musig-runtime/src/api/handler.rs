//! Request handler for the coordination API.
//!
//! Transport-agnostic: an HTTP or RPC front end deserializes into the
//! payload types, calls one `handle_*` method, and serializes the result or
//! the `ApiError` with its status.

use super::error::{ApiError, ApiResult};
use super::payloads::{IdResponse, ListQuery, RemovedResponse, StoreRequest, TransactionView};
use musig_store::{
    ParticipantSignature, PendingStoreApi, PublicKey, Readiness, SharedStore, SignatureVerifier,
    StoreError, StoreId, StoreStatus, Submission,
};
use std::sync::Arc;
use tracing::{debug, info};

/// Request handler for the pending store.
pub struct ApiHandler {
    store: SharedStore,
    verifier: Arc<dyn SignatureVerifier>,
}

impl ApiHandler {
    /// Creates a new handler over a shared store.
    pub fn new(store: SharedStore, verifier: Arc<dyn SignatureVerifier>) -> Self {
        Self { store, verifier }
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    /// Handles `list`.
    ///
    /// Without a public key every record is returned.
    pub fn handle_list(&self, query: ListQuery) -> ApiResult<Vec<TransactionView>> {
        let state = query
            .state
            .as_deref()
            .map(str::parse::<Readiness>)
            .transpose()
            .map_err(ApiError::invalid_params)?;
        let key = query
            .public_key
            .as_deref()
            .map(PublicKey::parse)
            .transpose()?;

        let records = {
            let store = self.store.read();
            match &key {
                Some(key) => store.find_by_public_key(key),
                None => store.list_all(),
            }
        };

        Ok(records
            .into_iter()
            .map(TransactionView::from)
            .filter(|view| state.map_or(true, |state| view.state == state))
            .collect())
    }

    /// Handles `show`.
    pub fn handle_show(&self, id: &str) -> ApiResult<TransactionView> {
        let id = StoreId::parse(id)?;
        let record = self
            .store
            .read()
            .find(&id)
            .ok_or(StoreError::NotFound(id))?;
        Ok(record.into())
    }

    /// Handles `store`.
    ///
    /// Signatures are checked against the participant set of the live
    /// record when one exists, otherwise against the submitted set. The
    /// check and the admission run under one write guard.
    pub fn handle_store(&self, request: StoreRequest) -> ApiResult<IdResponse> {
        let signatures = request
            .signatures
            .iter()
            .map(|signature| ParticipantSignature::parse_prefixed(signature))
            .collect::<Result<Vec<_>, _>>()?;

        let mut store = self.store.write();
        let id = store.resolve_id(&request.fields)?;
        let participants = match store.get(&id) {
            Some(existing) => existing.participants().to_vec(),
            None => request.multisig_asset.public_keys.clone(),
        };

        for signature in &signatures {
            let key = participants
                .get(signature.index as usize)
                .ok_or_else(|| {
                    StoreError::validation(format!(
                        "signature index {} out of range for {} participants",
                        signature.index,
                        participants.len()
                    ))
                })?;
            if !self
                .verifier
                .verify(&request.fields, &signature.signature, key)
            {
                debug!(id = %id, index = signature.index, "Rejected participant signature");
                return Err(ApiError::invalid_params(format!(
                    "signature at index {} is not valid",
                    signature.index
                )));
            }
        }
        if let Some(sender_signature) = &request.sender_signature {
            if !self.verifier.verify(
                &request.fields,
                sender_signature,
                &request.fields.sender_public_key,
            ) {
                return Err(ApiError::invalid_params("sender signature is not valid"));
            }
        }

        let admission = store.submit(Submission {
            fields: request.fields,
            multisig_asset: request.multisig_asset,
            signatures,
            sender_signature: request.sender_signature,
        })?;
        drop(store);

        info!(
            id = %admission.id(),
            created = admission.is_created(),
            "Stored transaction"
        );
        Ok(IdResponse {
            id: admission.id().clone(),
        })
    }

    /// Handles `delete`.
    pub fn handle_delete(&self, id: &str) -> ApiResult<IdResponse> {
        let id = StoreId::parse(id)?;
        let removed = self.store.write().delete(&id)?;
        info!(id = %removed.id, "Deleted transaction");
        Ok(IdResponse { id: removed.id })
    }

    /// Handles `delete all`.
    pub fn handle_delete_all(&self) -> RemovedResponse {
        let removed = self.store.write().delete_all();
        info!(removed = removed, "Deleted all transactions");
        RemovedResponse { removed }
    }

    /// Current store counters.
    pub fn handle_status(&self) -> StoreStatus {
        self.store.read().get_status()
    }
}
