//! Relay configuration.

use serde::{Deserialize, Serialize};
use feerelay_crypto::WalletConfig;
use feerelay_rpc::Commitment;
use feerelay_types::{RelayError, Result};

/// Endpoints and timeouts for one relay deployment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Base URL of the fee-relay service; required.
    pub relay_url: String,
    /// JSON-RPC endpoint used for recent blockhashes.
    pub rpc_url: String,
    pub request_timeout_ms: u64,
    pub commitment: Commitment,
    pub wallet: WalletConfig,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            relay_url: String::new(),
            rpc_url: "https://api.mainnet-beta.solana.com".to_string(),
            request_timeout_ms: 30_000,
            commitment: Commitment::Confirmed,
            wallet: WalletConfig::default(),
        }
    }
}

impl RelayConfig {
    pub fn new(relay_url: &str) -> Self {
        Self { relay_url: relay_url.to_string(), ..Self::default() }
    }

    pub fn validate(&self) -> Result<()> {
        for (name, url) in [("relay_url", &self.relay_url), ("rpc_url", &self.rpc_url)] {
            if url.trim().is_empty() {
                return Err(RelayError::Config(format!("{} is required", name)));
            }
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(RelayError::Config(format!("{} must be an http(s) url: {}", name, url)));
            }
        }
        if self.request_timeout_ms == 0 {
            return Err(RelayError::Config("request_timeout_ms must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use feerelay_crypto::DerivationScheme;

    #[test]
    fn test_defaults() {
        let config = RelayConfig::default();
        assert_eq!(config.request_timeout_ms, 30_000);
        assert_eq!(config.commitment, Commitment::Confirmed);
        assert_eq!(config.wallet.derivation_scheme, DerivationScheme::Bip44Change);
        assert!(matches!(config.validate(), Err(RelayError::Config(_))));
        assert!(RelayConfig::new("https://relay.example.com").validate().is_ok());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: RelayConfig = serde_json::from_str(
            r#"{"relay_url":"https://relay.example.com/","commitment":"finalized","wallet":{"derivationScheme":"bip44"}}"#,
        )
        .unwrap();
        assert_eq!(config.rpc_url, "https://api.mainnet-beta.solana.com");
        assert_eq!(config.commitment, Commitment::Finalized);
        assert_eq!(config.wallet.derivation_scheme, DerivationScheme::Bip44);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_non_http_urls() {
        let config = RelayConfig::new("ftp://relay.example.com");
        assert!(matches!(config.validate(), Err(RelayError::Config(_))));
    }
}
