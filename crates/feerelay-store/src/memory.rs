//! In-memory account storage.

use async_trait::async_trait;
use std::sync::{Mutex, PoisonError};

use crate::*;

/// In-memory account storage (for testing and ephemeral use).
pub struct MemoryAccountStore {
    active: Mutex<Option<SignerHandle>>,
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        Self { active: Mutex::new(None) }
    }

    pub fn with_signer(signer: SignerHandle) -> Self {
        Self { active: Mutex::new(Some(signer)) }
    }

    /// Sign in, replacing any previous account.
    pub fn set_active_signer(&self, signer: SignerHandle) {
        *self.active.lock().unwrap_or_else(PoisonError::into_inner) = Some(signer);
    }

    /// Sign out.
    pub fn clear(&self) {
        *self.active.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

impl Default for MemoryAccountStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AccountStorage for MemoryAccountStore {
    async fn active_signer(&self) -> Result<Option<SignerHandle>> {
        let active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(active.clone())
    }
}
