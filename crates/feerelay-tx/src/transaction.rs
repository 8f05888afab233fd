//! Partially signed transactions.

use feerelay_types::{Pubkey, RelayError, Result, Signature, TransactionSigner};

use crate::message::Message;

/// A message plus one signature slot per required signer.
///
/// Unfilled slots hold the all-zero signature. A relayed transaction is
/// submitted with only the user's slot filled; the relay fills the fee-payer
/// slot before broadcasting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub signatures: Vec<Signature>,
    pub message: Message,
}

impl Transaction {
    pub fn new_unsigned(message: Message) -> Self {
        let slots = message.signer_keys().len();
        Self {
            signatures: vec![Signature::default(); slots],
            message,
        }
    }

    /// Sign with one of the required signers, leaving the other slots as they are.
    pub fn partial_sign(&mut self, signer: &dyn TransactionSigner) -> Result<()> {
        let pubkey = signer.pubkey();
        let slot = self
            .message
            .signer_keys()
            .iter()
            .position(|key| *key == pubkey)
            .ok_or_else(|| {
                RelayError::Signing(format!("{} is not a required signer of this message", pubkey))
            })?;

        let signature = signer.sign_message(&self.message.serialize())?;
        self.signatures[slot] = signature;
        Ok(())
    }

    /// Signature recorded for `pubkey`, if that slot has been filled.
    pub fn signature_for(&self, pubkey: &Pubkey) -> Option<&Signature> {
        let slot = self.message.signer_keys().iter().position(|key| key == pubkey)?;
        self.signatures
            .get(slot)
            .filter(|signature| **signature != Signature::default())
    }

    pub fn is_fully_signed(&self) -> bool {
        self.signatures.iter().all(|s| *s != Signature::default())
    }
}
