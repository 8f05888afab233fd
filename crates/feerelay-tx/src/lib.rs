//! Transaction building and relay submission.
//!
//! - Build transfer instructions and compile them into messages
//! - Sign locally, leaving the fee-payer slot for the relay
//! - Submit relay request bodies to the fee-relay service

use serde::{Deserialize, Serialize};
use feerelay_types::{Blockhash, Pubkey, Signature};

pub mod instruction;
pub mod message;
pub mod relay_client;
pub mod transaction;

pub use instruction::{AccountMeta, DefaultInstructionBuilder, Instruction, InstructionBuilder};
pub use message::Message;
pub use relay_client::{RelayClient, RelayTransport};
pub use transaction::Transaction;

/// Body of `POST /transfer_sol`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferSolRequest {
    pub sender: Pubkey,
    pub recipient: Pubkey,
    pub amount: u64,
    pub signature: Signature,
    pub blockhash: Blockhash,
}

/// Body of `POST /transfer_spl_token`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferSplTokenRequest {
    pub sender: Pubkey,
    pub recipient: Pubkey,
    pub mint_address: Pubkey,
    pub authority: Pubkey,
    pub amount: u64,
    pub decimals: u8,
    pub signature: Signature,
    pub blockhash: Blockhash,
}

/// Relay request for a native or token transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RelayRequest {
    TransferSol(TransferSolRequest),
    TransferSplToken(TransferSplTokenRequest),
}

impl RelayRequest {
    pub fn endpoint(&self) -> &'static str {
        match self {
            Self::TransferSol(_) => "/transfer_sol",
            Self::TransferSplToken(_) => "/transfer_spl_token",
        }
    }

    pub fn signature(&self) -> &Signature {
        match self {
            Self::TransferSol(body) => &body.signature,
            Self::TransferSplToken(body) => &body.signature,
        }
    }

    pub fn blockhash(&self) -> &Blockhash {
        match self {
            Self::TransferSol(body) => &body.blockhash,
            Self::TransferSplToken(body) => &body.blockhash,
        }
    }
}
