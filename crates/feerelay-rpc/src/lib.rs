//! Network node access for the fee-relay SDK.
//!
//! - `NetworkClient`: the capabilities the orchestrator and watchers need
//! - `rpc_client`: JSON-RPC implementation over HTTP
//! - `watch_signature`: polls a signature's status and exposes the updates
//!   as an `EventStream`

pub mod rpc_client;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;
use feerelay_stream::{EmitHandle, EventStream};
use feerelay_types::{Blockhash, RelayError, Result, Signature};

pub use rpc_client::{Commitment, RpcClient, SignatureStatus};

/// Network capabilities consumed by the SDK.
#[async_trait]
pub trait NetworkClient: Send + Sync {
    /// A blockhash recent enough to anchor a new transaction.
    async fn recent_blockhash(&self) -> Result<Blockhash>;

    /// Current status of `signature`, `None` if the node has not seen it.
    async fn signature_status(&self, signature: &Signature) -> Result<Option<SignatureStatus>>;
}

/// Signature watch configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    pub poll_ms: u64,
    pub max_attempts: u32,
    /// Level at which the watch completes.
    pub commitment: Commitment,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            poll_ms: 2_000,
            max_attempts: 30,
            commitment: Commitment::Confirmed,
        }
    }
}

/// Watch a submitted signature until it reaches `config.commitment`.
///
/// Each distinct status is emitted once. The stream completes at the target
/// commitment, and fails on an on-chain error, an RPC failure, or after
/// `max_attempts` polls. Dropping the stream stops the poller at its next
/// iteration. Must be called from within a tokio runtime.
pub fn watch_signature(
    client: Arc<dyn NetworkClient>,
    signature: Signature,
    config: WatchConfig,
) -> EventStream<SignatureStatus, RelayError> {
    EventStream::from_producer(|handle| {
        tokio::spawn(poll_signature(client, signature, config, handle));
    })
}

async fn poll_signature(
    client: Arc<dyn NetworkClient>,
    signature: Signature,
    config: WatchConfig,
    handle: EmitHandle<SignatureStatus, RelayError>,
) {
    let mut last: Option<SignatureStatus> = None;

    for attempt in 0..config.max_attempts {
        if handle.is_terminated() {
            debug!(%signature, "signature watch dropped by consumer");
            return;
        }

        match client.signature_status(&signature).await {
            Err(e) => {
                handle.fail(e);
                return;
            }
            Ok(Some(status)) => {
                if last.as_ref() != Some(&status) {
                    handle.emit(status.clone());
                }
                if let Some(err) = &status.err {
                    handle.fail(RelayError::TransactionFailed(err.to_string()));
                    return;
                }
                if status
                    .confirmation_status
                    .is_some_and(|reached| reached >= config.commitment)
                {
                    debug!(%signature, slot = status.slot, "signature reached target commitment");
                    handle.complete();
                    return;
                }
                last = Some(status);
            }
            Ok(None) => {}
        }

        if attempt + 1 < config.max_attempts {
            tokio::time::sleep(Duration::from_millis(config.poll_ms)).await;
        }
    }

    handle.fail(RelayError::Timeout(format!(
        "signature {} not {} after {} attempts",
        signature, config.commitment, config.max_attempts
    )));
}
