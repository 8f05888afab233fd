//! Account storage trait and implementations for the fee-relay SDK.
//!
//! Defines the `AccountStorage` trait that wallet backends implement to expose
//! the signed-in account. Provides a `MemoryAccountStore` for testing.

use std::sync::Arc;

use async_trait::async_trait;
use feerelay_types::{Result, TransactionSigner};

pub mod memory;

pub use memory::MemoryAccountStore;

/// Shared handle to a signer owned by account storage.
pub type SignerHandle = Arc<dyn TransactionSigner>;

/// The account storage trait.
///
/// Async so that keychain- or disk-backed stores fit behind the same seam.
#[async_trait]
pub trait AccountStorage: Send + Sync {
    async fn init(&self) -> Result<()> { Ok(()) }

    /// The signer of the signed-in account, if any.
    async fn active_signer(&self) -> Result<Option<SignerHandle>>;
}
