//! Instructions and the builders for the two supported transfers.

use feerelay_types::Pubkey;

/// System program (`11111111111111111111111111111111`).
pub const SYSTEM_PROGRAM_ID: Pubkey = Pubkey::new_from_array([0u8; 32]);

/// SPL token program (`TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA`).
pub const TOKEN_PROGRAM_ID: Pubkey = Pubkey::new_from_array([
    6, 221, 246, 225, 215, 101, 161, 147, 217, 203, 225, 70, 206, 235, 121, 172, 28, 180, 133, 237,
    95, 91, 55, 145, 58, 140, 245, 133, 126, 255, 0, 169,
]);

/// System program `Transfer` discriminant (u32 LE).
const SYSTEM_TRANSFER_TAG: u32 = 2;

/// Token program `Transfer` discriminant (u8).
const TOKEN_TRANSFER_TAG: u8 = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountMeta {
    pub pubkey: Pubkey,
    pub is_signer: bool,
    pub is_writable: bool,
}

impl AccountMeta {
    pub fn new(pubkey: Pubkey, is_signer: bool) -> Self {
        Self { pubkey, is_signer, is_writable: true }
    }

    pub fn new_readonly(pubkey: Pubkey, is_signer: bool) -> Self {
        Self { pubkey, is_signer, is_writable: false }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub program_id: Pubkey,
    pub accounts: Vec<AccountMeta>,
    pub data: Vec<u8>,
}

/// Factory for transfer instructions.
///
/// The orchestrator only goes through this trait, so alternative program
/// layouts (e.g. token-2022) can be swapped in.
pub trait InstructionBuilder: Send + Sync {
    fn native_transfer(&self, from: &Pubkey, to: &Pubkey, lamports: u64) -> Instruction;

    fn token_transfer(
        &self,
        program_id: &Pubkey,
        source: &Pubkey,
        destination: &Pubkey,
        owner: &Pubkey,
        amount: u64,
    ) -> Instruction;

    /// Program id passed to `token_transfer` by default.
    fn token_program_id(&self) -> Pubkey {
        TOKEN_PROGRAM_ID
    }
}

/// System program and SPL token program builders.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultInstructionBuilder;

impl InstructionBuilder for DefaultInstructionBuilder {
    fn native_transfer(&self, from: &Pubkey, to: &Pubkey, lamports: u64) -> Instruction {
        system_transfer(from, to, lamports)
    }

    fn token_transfer(
        &self,
        program_id: &Pubkey,
        source: &Pubkey,
        destination: &Pubkey,
        owner: &Pubkey,
        amount: u64,
    ) -> Instruction {
        token_transfer(program_id, source, destination, owner, amount)
    }
}

/// System program lamport transfer.
pub fn system_transfer(from: &Pubkey, to: &Pubkey, lamports: u64) -> Instruction {
    let mut data = Vec::with_capacity(12);
    data.extend_from_slice(&SYSTEM_TRANSFER_TAG.to_le_bytes());
    data.extend_from_slice(&lamports.to_le_bytes());

    Instruction {
        program_id: SYSTEM_PROGRAM_ID,
        accounts: vec![AccountMeta::new(*from, true), AccountMeta::new(*to, false)],
        data,
    }
}

/// SPL token `Transfer` between two token accounts, authorised by `owner`.
pub fn token_transfer(
    program_id: &Pubkey,
    source: &Pubkey,
    destination: &Pubkey,
    owner: &Pubkey,
    amount: u64,
) -> Instruction {
    let mut data = Vec::with_capacity(9);
    data.push(TOKEN_TRANSFER_TAG);
    data.extend_from_slice(&amount.to_le_bytes());

    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(*source, false),
            AccountMeta::new(*destination, false),
            AccountMeta::new_readonly(*owner, true),
        ],
        data,
    }
}
