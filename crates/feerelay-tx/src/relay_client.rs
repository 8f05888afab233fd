//! HTTP client for the fee-relay service.
//!
//! Endpoints:
//! - GET /fee_payer/pubkey
//! - POST /transfer_sol
//! - POST /transfer_spl_token

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};
use feerelay_types::{Pubkey, RelayError, Result, TransactionId};

use crate::RelayRequest;

/// Relay API response wrapper, used by deployments that wrap payloads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayResponse<T> {
    pub code: Option<i32>,
    pub message: Option<String>,
    pub data: T,
}

/// The relay service as seen by the orchestrator.
#[async_trait]
pub trait RelayTransport: Send + Sync {
    /// Public key the relay will pay fees from.
    async fn fee_payer(&self) -> Result<Pubkey>;

    /// Submit a user-signed transfer; returns the relay's transaction id.
    async fn submit(&self, request: &RelayRequest) -> Result<TransactionId>;
}

/// Relay client over HTTP.
pub struct RelayClient {
    base_url: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl RelayClient {
    pub fn new(base_url: &str, timeout_ms: Option<u64>) -> Self {
        let timeout_ms = timeout_ms.unwrap_or(30_000);
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::builder()
                .timeout(Duration::from_millis(timeout_ms))
                .build()
                .unwrap_or_default(),
            timeout: Duration::from_millis(timeout_ms),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn read_success_body(resp: reqwest::Response, what: &str) -> Result<String> {
        let status = resp.status();
        let body = resp.text().await.map_err(|e| {
            RelayError::transport(format!("failed to read {} response: {}", what, e))
        })?;

        if !status.is_success() {
            warn!(%status, endpoint = what, "relay returned error status");
            return Err(RelayError::Transport {
                status: Some(status.as_u16()),
                message: format!("relay returned status {}: {}", status, body),
            });
        }

        parse_relay_body(&body)
    }
}

#[async_trait]
impl RelayTransport for RelayClient {
    /// GET /fee_payer/pubkey
    async fn fee_payer(&self) -> Result<Pubkey> {
        let url = format!("{}/fee_payer/pubkey", self.base_url);

        let resp = self.client
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| RelayError::transport(format!("relay request failed: {}", e)))?;

        let body = Self::read_success_body(resp, "fee_payer").await?;
        let fee_payer: Pubkey = body
            .parse()
            .map_err(|_| RelayError::InvalidResponse(format!("fee payer is not a public key: {}", body)))?;

        debug!(%fee_payer, "fetched relay fee payer");
        Ok(fee_payer)
    }

    /// POST /transfer_sol or /transfer_spl_token
    async fn submit(&self, request: &RelayRequest) -> Result<TransactionId> {
        let url = format!("{}{}", self.base_url, request.endpoint());

        let resp = self.client
            .post(&url)
            .json(request)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| RelayError::transport(format!("relay request failed: {}", e)))?;

        Self::read_success_body(resp, request.endpoint()).await
    }
}

/// Accepts a bare string, a JSON string, or a `{ "data": "..." }` envelope.
pub fn parse_relay_body(body: &str) -> Result<String> {
    let trimmed = body.trim();
    let value = if trimmed.starts_with('{') {
        let envelope: RelayResponse<String> = serde_json::from_str(trimmed)
            .map_err(|e| RelayError::InvalidResponse(format!("failed to parse relay response: {}", e)))?;
        envelope.data
    } else if trimmed.starts_with('"') {
        serde_json::from_str::<String>(trimmed)
            .map_err(|e| RelayError::InvalidResponse(format!("failed to parse relay response: {}", e)))?
    } else {
        trimmed.to_string()
    };

    if value.is_empty() {
        return Err(RelayError::InvalidResponse("empty relay response".into()));
    }
    Ok(value)
}
