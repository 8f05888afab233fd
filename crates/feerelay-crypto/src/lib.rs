//! Signing primitives for the fee-relay SDK.
//!
//! - `derivation`: derivation path selection and wallet settings
//! - `keypair`: ed25519 signer implementing `TransactionSigner`

pub mod derivation;
pub mod keypair;

pub use derivation::{DerivationScheme, WalletConfig};
pub use keypair::Keypair;
