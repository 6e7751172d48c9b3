//! HTTP ledger lookup.
//!
//! `GET <host>/api/transactions/<transaction_id>`: 200 means the ledger has
//! the transaction, 404 means it does not, anything else is an error.

use async_trait::async_trait;
use musig_store::{LedgerError, LedgerLookup};
use reqwest::StatusCode;
use std::time::Duration;

/// Ledger lookup over the ledger's public HTTP API.
#[derive(Debug, Clone)]
pub struct HttpLedgerLookup {
    client: reqwest::Client,
    host: String,
}

impl HttpLedgerLookup {
    /// Creates a client whose requests give up after `timeout`.
    pub fn new(host: impl Into<String>, timeout: Duration) -> Result<Self, LedgerError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LedgerError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            host: host.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn transaction_url(&self, transaction_id: &str) -> String {
        format!("{}/api/transactions/{}", self.host, transaction_id)
    }
}

#[async_trait]
impl LedgerLookup for HttpLedgerLookup {
    async fn is_included(&self, transaction_id: &str) -> Result<bool, LedgerError> {
        let response = self
            .client
            .get(self.transaction_url(transaction_id))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LedgerError::Timeout
                } else {
                    LedgerError::Transport(e.to_string())
                }
            })?;

        match response.status() {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            other => Err(LedgerError::UnexpectedStatus(other.as_u16())),
        }
    }
}
