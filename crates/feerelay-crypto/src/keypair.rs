//! Ed25519 keypair signer.
//!
//! Secret key bytes stay inside [`Keypair`]; callers only ever see the public
//! key and signatures.

use std::fmt;

use ed25519_dalek::{Signer as _, SigningKey};
use rand::rngs::OsRng;
use feerelay_types::{Pubkey, RelayError, Result, Signature, TransactionSigner};

use crate::derivation::{DerivationScheme, WalletConfig};

/// Length of the `secret || public` keypair encoding used by wallet exports.
pub const KEYPAIR_LENGTH: usize = 64;

pub struct Keypair {
    signing_key: SigningKey,
    scheme: DerivationScheme,
}

impl Keypair {
    /// Generate a fresh random keypair.
    pub fn generate(config: &WalletConfig) -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
            scheme: config.derivation_scheme,
        }
    }

    /// Build a keypair from a 32-byte ed25519 seed already derived along
    /// `config.derivation_scheme`.
    pub fn from_seed_bytes(seed: &[u8; 32], config: &WalletConfig) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
            scheme: config.derivation_scheme,
        }
    }

    /// Import a base58 `secret || public` export (64 bytes).
    pub fn from_base58_secret(encoded: &str, config: &WalletConfig) -> Result<Self> {
        let bytes = bs58::decode(encoded.trim())
            .into_vec()
            .map_err(|e| RelayError::Signing(format!("invalid keypair encoding: {}", e)))?;
        let bytes: [u8; KEYPAIR_LENGTH] = bytes.try_into().map_err(|b: Vec<u8>| {
            RelayError::Signing(format!(
                "keypair must be {} bytes, got {}",
                KEYPAIR_LENGTH,
                b.len()
            ))
        })?;
        let signing_key = SigningKey::from_keypair_bytes(&bytes)
            .map_err(|_| RelayError::Signing("public key does not match secret key".into()))?;
        Ok(Self { signing_key, scheme: config.derivation_scheme })
    }

    pub fn scheme(&self) -> DerivationScheme {
        self.scheme
    }

    pub fn public_key(&self) -> Pubkey {
        Pubkey::new_from_array(self.signing_key.verifying_key().to_bytes())
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keypair")
            .field("pubkey", &self.public_key())
            .field("scheme", &self.scheme)
            .finish_non_exhaustive()
    }
}

impl TransactionSigner for Keypair {
    fn pubkey(&self) -> Pubkey {
        self.public_key()
    }

    fn sign_message(&self, message: &[u8]) -> Result<Signature> {
        let signature = self.signing_key.sign(message);
        Ok(Signature::new_from_array(signature.to_bytes()))
    }
}
