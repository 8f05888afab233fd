//! JSON-RPC client for the network node.
//!
//! Methods:
//! - getLatestBlockhash
//! - getSignatureStatuses

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::time::Duration;
use tracing::debug;
use feerelay_types::{Blockhash, RelayError, Result, Signature};

use crate::NetworkClient;

/// Commitment level, ordered from weakest to strongest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Commitment {
    Processed,
    #[default]
    Confirmed,
    Finalized,
}

impl Commitment {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Processed => "processed",
            Self::Confirmed => "confirmed",
            Self::Finalized => "finalized",
        }
    }
}

impl fmt::Display for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of a submitted transaction signature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureStatus {
    pub slot: u64,
    pub confirmations: Option<u64>,
    pub err: Option<Value>,
    pub confirmation_status: Option<Commitment>,
}

/// JSON-RPC envelope.
#[derive(Debug, Deserialize)]
struct JsonRpcResponse<T> {
    result: Option<T>,
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

/// `{ context, value }` wrapper used by most node methods.
#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    value: T,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LatestBlockhash {
    blockhash: String,
    last_valid_block_height: u64,
}

/// Network node client.
pub struct RpcClient {
    rpc_url: String,
    client: reqwest::Client,
    timeout: Duration,
    commitment: Commitment,
}

impl RpcClient {
    pub fn new(rpc_url: &str, timeout_ms: Option<u64>) -> Self {
        let timeout_ms = timeout_ms.unwrap_or(20_000);
        Self {
            rpc_url: rpc_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::builder()
                .timeout(Duration::from_millis(timeout_ms))
                .build()
                .unwrap_or_default(),
            timeout: Duration::from_millis(timeout_ms),
            commitment: Commitment::default(),
        }
    }

    pub fn with_commitment(mut self, commitment: Commitment) -> Self {
        self.commitment = commitment;
        self
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
        let payload = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });

        let resp = self.client
            .post(&self.rpc_url)
            .json(&payload)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| RelayError::transport(format!("rpc request failed: {}", e)))?;

        if !resp.status().is_success() {
            let status = resp.status();
            return Err(RelayError::Transport {
                status: Some(status.as_u16()),
                message: format!("rpc returned status {} for {}", status, method),
            });
        }

        let body: JsonRpcResponse<T> = resp
            .json()
            .await
            .map_err(|e| RelayError::InvalidResponse(format!("failed to parse {} response: {}", method, e)))?;

        unwrap_rpc(method, body)
    }
}

fn unwrap_rpc<T>(method: &str, body: JsonRpcResponse<T>) -> Result<T> {
    if let Some(error) = body.error {
        return Err(RelayError::Rpc { code: error.code, message: error.message });
    }
    body.result
        .ok_or_else(|| RelayError::InvalidResponse(format!("{} returned neither result nor error", method)))
}

#[async_trait]
impl NetworkClient for RpcClient {
    async fn recent_blockhash(&self) -> Result<Blockhash> {
        let response: RpcResponse<LatestBlockhash> = self
            .call("getLatestBlockhash", json!([{ "commitment": self.commitment.as_str() }]))
            .await?;

        let blockhash: Blockhash = response.value.blockhash.parse()?;
        debug!(
            %blockhash,
            last_valid_block_height = response.value.last_valid_block_height,
            "fetched recent blockhash"
        );
        Ok(blockhash)
    }

    async fn signature_status(&self, signature: &Signature) -> Result<Option<SignatureStatus>> {
        let response: RpcResponse<Vec<Option<SignatureStatus>>> = self
            .call(
                "getSignatureStatuses",
                json!([[signature.to_string()], { "searchTransactionHistory": false }]),
            )
            .await?;

        Ok(response.value.into_iter().next().flatten())
    }
}
