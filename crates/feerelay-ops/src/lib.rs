//! Fee-sponsored transfer orchestration.
//!
//! Coordinates account storage, the network node, instruction builders and
//! the relay service to submit transfers whose network fee is paid by the
//! relay. The user's key signs locally; only the signature is sent.

pub mod config;

use std::sync::Arc;

use tracing::{debug, info, warn};
use feerelay_rpc::{NetworkClient, RpcClient};
use feerelay_store::{AccountStorage, SignerHandle};
use feerelay_tx::{
    DefaultInstructionBuilder, Instruction, InstructionBuilder, Message, RelayClient, RelayRequest,
    RelayTransport, Transaction,
};
use feerelay_tx::{TransferSolRequest, TransferSplTokenRequest};
use feerelay_types::{
    parse_address, Blockhash, Pubkey, RelayError, Result, Signature, TransactionId, TransactionSigner,
};

pub use config::RelayConfig;

/// Token being transferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenDescriptor {
    pub mint: Pubkey,
    pub decimals: u8,
}

/// One transfer intent, built per call and never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferRequest {
    Native {
        destination: String,
        amount: u64,
    },
    Token {
        source: String,
        destination: String,
        token: TokenDescriptor,
        amount: u64,
    },
}

/// Fee payer and anchor fetched for a single relay call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SigningContext {
    pub fee_payer: Pubkey,
    pub recent_blockhash: Blockhash,
}

/// The orchestrator holds shared handles to its collaborators and no state of
/// its own, so concurrent calls are independent.
pub struct FeeRelayOrchestrator {
    accounts: Arc<dyn AccountStorage>,
    network: Arc<dyn NetworkClient>,
    relay: Arc<dyn RelayTransport>,
    instructions: Arc<dyn InstructionBuilder>,
}

impl FeeRelayOrchestrator {
    pub fn new(
        accounts: Arc<dyn AccountStorage>,
        network: Arc<dyn NetworkClient>,
        relay: Arc<dyn RelayTransport>,
    ) -> Self {
        Self {
            accounts,
            network,
            relay,
            instructions: Arc::new(DefaultInstructionBuilder),
        }
    }

    /// Build an orchestrator talking HTTP to the configured relay and node.
    pub fn from_config(config: &RelayConfig, accounts: Arc<dyn AccountStorage>) -> Result<Self> {
        config.validate()?;
        let timeout = Some(config.request_timeout_ms);
        let network = RpcClient::new(&config.rpc_url, timeout).with_commitment(config.commitment);
        let relay = RelayClient::new(&config.relay_url, timeout);
        Ok(Self::new(accounts, Arc::new(network), Arc::new(relay)))
    }

    pub fn with_instruction_builder(mut self, instructions: Arc<dyn InstructionBuilder>) -> Self {
        self.instructions = instructions;
        self
    }

    /// Public key the relay pays fees from. No retry.
    pub async fn fee_payer(&self) -> Result<Pubkey> {
        self.relay.fee_payer().await
    }

    pub async fn transfer(&self, request: &TransferRequest) -> Result<TransactionId> {
        match request {
            TransferRequest::Native { destination, amount } => {
                self.transfer_native(destination, *amount).await
            }
            TransferRequest::Token { source, destination, token, amount } => {
                self.transfer_token(source, destination, token, *amount).await
            }
        }
    }

    /// Send `lamports` from the active account to `destination`, fee paid by the relay.
    pub async fn transfer_native(&self, destination: &str, lamports: u64) -> Result<TransactionId> {
        let signer = self.require_signer().await?;
        let recipient = parse_address(destination)?;
        let context = self.signing_context().await?;

        let sender = signer.pubkey();
        let instruction = self.instructions.native_transfer(&sender, &recipient, lamports);
        let signature = sign_relayed(signer.as_ref(), instruction, &context)?;

        let request = RelayRequest::TransferSol(TransferSolRequest {
            sender,
            recipient,
            amount: lamports,
            signature,
            blockhash: context.recent_blockhash,
        });
        self.submit(request).await
    }

    /// Move `amount` base units of `token` between two token accounts owned
    /// by the active account's authority.
    pub async fn transfer_token(
        &self,
        source: &str,
        destination: &str,
        token: &TokenDescriptor,
        amount: u64,
    ) -> Result<TransactionId> {
        let signer = self.require_signer().await?;
        let source = parse_address(source)?;
        let recipient = parse_address(destination)?;
        let context = self.signing_context().await?;

        let authority = signer.pubkey();
        let program_id = self.instructions.token_program_id();
        let instruction =
            self.instructions.token_transfer(&program_id, &source, &recipient, &authority, amount);
        let signature = sign_relayed(signer.as_ref(), instruction, &context)?;

        let request = RelayRequest::TransferSplToken(TransferSplTokenRequest {
            sender: source,
            recipient,
            mint_address: token.mint,
            authority,
            amount,
            decimals: token.decimals,
            signature,
            blockhash: context.recent_blockhash,
        });
        self.submit(request).await
    }

    async fn require_signer(&self) -> Result<SignerHandle> {
        self.accounts.active_signer().await?.ok_or(RelayError::Unauthorized)
    }

    /// Fetch fee payer and blockhash concurrently; the first error wins.
    async fn signing_context(&self) -> Result<SigningContext> {
        let (fee_payer, recent_blockhash) =
            tokio::try_join!(self.relay.fee_payer(), self.network.recent_blockhash())?;
        debug!(%fee_payer, %recent_blockhash, "signing context ready");
        Ok(SigningContext { fee_payer, recent_blockhash })
    }

    async fn submit(&self, request: RelayRequest) -> Result<TransactionId> {
        let endpoint = request.endpoint();
        let signature = *request.signature();
        match self.relay.submit(&request).await {
            Ok(tx_id) => {
                info!(endpoint, %signature, %tx_id, "relay accepted transfer");
                Ok(tx_id)
            }
            Err(e) => {
                warn!(endpoint, %signature, error = %e, "relay rejected transfer");
                Err(e)
            }
        }
    }
}

/// Compile `instruction` against the relay's fee payer and anchor, sign with
/// the user's key only, and return the user's signature.
fn sign_relayed(
    signer: &dyn TransactionSigner,
    instruction: Instruction,
    context: &SigningContext,
) -> Result<Signature> {
    let message = Message::new(&[instruction], &context.fee_payer, context.recent_blockhash)?;
    let mut transaction = Transaction::new_unsigned(message);
    transaction.partial_sign(signer)?;

    let pubkey = signer.pubkey();
    transaction
        .signature_for(&pubkey)
        .copied()
        .ok_or_else(|| RelayError::SignatureNotFound(pubkey.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ed25519_dalek::{Verifier, VerifyingKey};
    use feerelay_crypto::{Keypair, WalletConfig};
    use feerelay_rpc::SignatureStatus;
    use feerelay_store::MemoryAccountStore;
    use feerelay_tx::instruction::{system_transfer, token_transfer, TOKEN_PROGRAM_ID};
    use serde_json::json;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::sync::Barrier;

    type CallLog = Arc<Mutex<Vec<&'static str>>>;

    /// Relay mock recording calls; an optional barrier forces the fee-payer
    /// fetch to wait for the blockhash fetch.
    struct MockRelay {
        fee_payer: Result<Pubkey>,
        submit_result: Result<TransactionId>,
        log: CallLog,
        submitted: Mutex<Vec<RelayRequest>>,
        gate: Option<Arc<Barrier>>,
    }

    #[async_trait]
    impl RelayTransport for MockRelay {
        async fn fee_payer(&self) -> Result<Pubkey> {
            if let Some(gate) = &self.gate {
                gate.wait().await;
            }
            self.log.lock().unwrap().push("fee_payer");
            self.fee_payer.clone()
        }

        async fn submit(&self, request: &RelayRequest) -> Result<TransactionId> {
            self.log.lock().unwrap().push("submit");
            self.submitted.lock().unwrap().push(request.clone());
            self.submit_result.clone()
        }
    }

    struct MockNetwork {
        blockhash: Result<Blockhash>,
        log: CallLog,
        gate: Option<Arc<Barrier>>,
    }

    #[async_trait]
    impl NetworkClient for MockNetwork {
        async fn recent_blockhash(&self) -> Result<Blockhash> {
            if let Some(gate) = &self.gate {
                gate.wait().await;
            }
            self.log.lock().unwrap().push("blockhash");
            self.blockhash.clone()
        }

        async fn signature_status(&self, _signature: &Signature) -> Result<Option<SignatureStatus>> {
            Ok(None)
        }
    }

    /// Signer that "signs" with an empty signature.
    struct BlankSigner(Pubkey);

    impl TransactionSigner for BlankSigner {
        fn pubkey(&self) -> Pubkey {
            self.0
        }

        fn sign_message(&self, _message: &[u8]) -> Result<Signature> {
            Ok(Signature::default())
        }
    }

    struct Harness {
        orchestrator: FeeRelayOrchestrator,
        relay: Arc<MockRelay>,
        log: CallLog,
    }

    struct Setup {
        signer: Option<SignerHandle>,
        fee_payer: Result<Pubkey>,
        blockhash: Result<Blockhash>,
        gated: bool,
    }

    fn user() -> Arc<Keypair> {
        Arc::new(Keypair::from_seed_bytes(&[21u8; 32], &WalletConfig::default()))
    }

    fn fee_payer_key() -> Pubkey {
        Pubkey::new_from_array([0xf0; 32])
    }

    fn anchor() -> Blockhash {
        Blockhash::new_from_array([0xb1; 32])
    }

    fn destination() -> Pubkey {
        Pubkey::new_from_array([0xd0; 32])
    }

    impl Default for Setup {
        fn default() -> Self {
            Self {
                signer: Some(user()),
                fee_payer: Ok(fee_payer_key()),
                blockhash: Ok(anchor()),
                gated: false,
            }
        }
    }

    fn harness(setup: Setup) -> Harness {
        let log: CallLog = Arc::new(Mutex::new(Vec::new()));
        let gate = setup.gated.then(|| Arc::new(Barrier::new(2)));
        let relay = Arc::new(MockRelay {
            fee_payer: setup.fee_payer,
            submit_result: Ok("relay-tx-1".to_string()),
            log: Arc::clone(&log),
            submitted: Mutex::new(Vec::new()),
            gate: gate.clone(),
        });
        let network = Arc::new(MockNetwork {
            blockhash: setup.blockhash,
            log: Arc::clone(&log),
            gate,
        });
        let accounts = Arc::new(match setup.signer {
            Some(signer) => MemoryAccountStore::with_signer(signer),
            None => MemoryAccountStore::new(),
        });
        let orchestrator = FeeRelayOrchestrator::new(accounts, network, relay.clone());
        Harness { orchestrator, relay, log }
    }

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    fn verify(signer: &Pubkey, message: &Message, signature: &Signature) {
        let key = VerifyingKey::from_bytes(&signer.to_bytes()).unwrap();
        let sig = ed25519_dalek::Signature::from_bytes(&signature.to_bytes());
        key.verify(&message.serialize(), &sig).expect("signature must cover the relayed message");
    }

    #[tokio::test]
    async fn test_native_transfer_scenario() {
        init_tracing();
        let h = harness(Setup::default());
        let sender = user().public_key();

        let tx_id = h
            .orchestrator
            .transfer_native(&destination().to_string(), 1000)
            .await
            .unwrap();
        assert_eq!(tx_id, "relay-tx-1");

        let log = h.log.lock().unwrap().clone();
        assert_eq!(log.len(), 3);
        assert!(log[..2].contains(&"fee_payer") && log[..2].contains(&"blockhash"));
        assert_eq!(log[2], "submit");

        let submitted = h.relay.submitted.lock().unwrap();
        assert_eq!(submitted.len(), 1);
        let RelayRequest::TransferSol(body) = &submitted[0] else {
            panic!("expected transfer_sol body");
        };
        assert_eq!(submitted[0].endpoint(), "/transfer_sol");
        assert_eq!(body.sender, sender);
        assert_eq!(body.recipient, destination());
        assert_eq!(body.amount, 1000);
        assert_eq!(body.blockhash, anchor());

        let expected = Message::new(
            &[system_transfer(&sender, &destination(), 1000)],
            &fee_payer_key(),
            anchor(),
        )
        .unwrap();
        assert_eq!(expected.fee_payer(), Some(&fee_payer_key()));
        verify(&sender, &expected, &body.signature);

        let wire = serde_json::to_value(&submitted[0]).unwrap();
        assert_eq!(
            wire,
            json!({
                "sender": sender.to_string(),
                "recipient": destination().to_string(),
                "amount": 1000,
                "signature": body.signature.to_string(),
                "blockhash": anchor().to_string(),
            })
        );
    }

    #[tokio::test]
    async fn test_token_transfer_body_and_signature() {
        let h = harness(Setup::default());
        let authority = user().public_key();
        let source = Pubkey::new_from_array([0x50; 32]);
        let token = TokenDescriptor { mint: Pubkey::new_from_array([0x77; 32]), decimals: 6 };

        let tx_id = h
            .orchestrator
            .transfer_token(&source.to_string(), &destination().to_string(), &token, 2_500_000)
            .await
            .unwrap();
        assert_eq!(tx_id, "relay-tx-1");

        let submitted = h.relay.submitted.lock().unwrap();
        let RelayRequest::TransferSplToken(body) = &submitted[0] else {
            panic!("expected transfer_spl_token body");
        };
        assert_eq!(submitted[0].endpoint(), "/transfer_spl_token");
        assert_eq!(body.sender, source);
        assert_eq!(body.recipient, destination());
        assert_eq!(body.mint_address, token.mint);
        assert_eq!(body.authority, authority);
        assert_eq!(body.decimals, 6);
        assert_eq!(body.amount, 2_500_000);

        let expected = Message::new(
            &[token_transfer(&TOKEN_PROGRAM_ID, &source, &destination(), &authority, 2_500_000)],
            &fee_payer_key(),
            anchor(),
        )
        .unwrap();
        verify(&authority, &expected, &body.signature);
    }

    #[tokio::test]
    async fn test_no_signer_is_unauthorized_before_network() {
        let h = harness(Setup { signer: None, ..Setup::default() });

        let native = h.orchestrator.transfer_native(&destination().to_string(), 1).await;
        assert_eq!(native, Err(RelayError::Unauthorized));

        let token = TokenDescriptor { mint: Pubkey::new_from_array([1u8; 32]), decimals: 9 };
        let spl = h
            .orchestrator
            .transfer_token(&destination().to_string(), &destination().to_string(), &token, 1)
            .await;
        assert_eq!(spl, Err(RelayError::Unauthorized));

        assert!(h.log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fee_payer_503_fails_without_post() {
        let unavailable = RelayError::Transport {
            status: Some(503),
            message: "relay returned status 503 Service Unavailable: ".into(),
        };
        let h = harness(Setup { fee_payer: Err(unavailable.clone()), ..Setup::default() });

        let result = h.orchestrator.transfer_native(&destination().to_string(), 1000).await;
        assert_eq!(result, Err(unavailable));
        assert!(!h.log.lock().unwrap().contains(&"submit"));
        assert!(h.relay.submitted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_blockhash_failure_fails_without_post() {
        let node_error = RelayError::Rpc { code: -32005, message: "Node is behind".into() };
        let h = harness(Setup { blockhash: Err(node_error.clone()), ..Setup::default() });

        let result = h.orchestrator.transfer_native(&destination().to_string(), 1000).await;
        assert_eq!(result, Err(node_error));
        assert!(h.relay.submitted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_destination() {
        let h = harness(Setup::default());
        let result = h.orchestrator.transfer_native("not an address", 1000).await;
        assert!(matches!(result, Err(RelayError::InvalidAddress(_))));
        assert!(h.relay.submitted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fetches_run_concurrently() {
        // each fetch waits for the other; sequential fetching would deadlock
        let h = harness(Setup { gated: true, ..Setup::default() });
        let result = tokio::time::timeout(
            Duration::from_secs(2),
            h.orchestrator.transfer_native(&destination().to_string(), 5),
        )
        .await;
        assert_eq!(result.expect("fetches must not run sequentially"), Ok("relay-tx-1".to_string()));
    }

    #[tokio::test]
    async fn test_missing_signature_is_reported() {
        let blank: SignerHandle = Arc::new(BlankSigner(Pubkey::new_from_array([0x33; 32])));
        let h = harness(Setup { signer: Some(blank), ..Setup::default() });

        let result = h.orchestrator.transfer_native(&destination().to_string(), 5).await;
        assert!(matches!(result, Err(RelayError::SignatureNotFound(_))));
        assert!(h.relay.submitted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_transfer_dispatch_and_fee_payer() {
        let h = harness(Setup::default());
        assert_eq!(h.orchestrator.fee_payer().await, Ok(fee_payer_key()));

        let request = TransferRequest::Native { destination: destination().to_string(), amount: 9 };
        assert_eq!(h.orchestrator.transfer(&request).await, Ok("relay-tx-1".to_string()));
        assert_eq!(h.relay.submitted.lock().unwrap()[0].endpoint(), "/transfer_sol");
    }

    #[test]
    fn test_from_config_requires_relay_url() {
        let accounts = Arc::new(MemoryAccountStore::new());
        let missing = FeeRelayOrchestrator::from_config(&RelayConfig::default(), accounts.clone());
        assert!(matches!(missing, Err(RelayError::Config(_))));

        let config = RelayConfig::new("https://relay.example.com");
        assert!(FeeRelayOrchestrator::from_config(&config, accounts).is_ok());
    }
}
