//! Legacy message compilation.
//!
//! Layout of [`Message::serialize`]:
//!   header (3 bytes) | compact-u16 key count | keys (32 bytes each)
//!   | recent blockhash (32) | compact-u16 ix count | compiled instructions
//!
//! Account keys are ordered fee payer first, then writable signers, readonly
//! signers, writable non-signers, readonly non-signers. The serialized bytes
//! are what every signer signs.

use feerelay_types::{Blockhash, Pubkey, RelayError, Result};

use crate::instruction::Instruction;

/// Legacy messages index accounts with a single byte.
const MAX_ACCOUNT_KEYS: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MessageHeader {
    pub num_required_signatures: u8,
    pub num_readonly_signed_accounts: u8,
    pub num_readonly_unsigned_accounts: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledInstruction {
    pub program_id_index: u8,
    pub accounts: Vec<u8>,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub header: MessageHeader,
    pub account_keys: Vec<Pubkey>,
    pub recent_blockhash: Blockhash,
    pub instructions: Vec<CompiledInstruction>,
}

#[derive(Debug, Clone, Copy)]
struct KeyEntry {
    pubkey: Pubkey,
    is_signer: bool,
    is_writable: bool,
}

impl Message {
    /// Compile `instructions` into a message paid for by `fee_payer` and
    /// anchored at `recent_blockhash`.
    pub fn new(
        instructions: &[Instruction],
        fee_payer: &Pubkey,
        recent_blockhash: Blockhash,
    ) -> Result<Self> {
        let mut entries = vec![KeyEntry { pubkey: *fee_payer, is_signer: true, is_writable: true }];
        for ix in instructions {
            for meta in &ix.accounts {
                upsert(&mut entries, meta.pubkey, meta.is_signer, meta.is_writable);
            }
            upsert(&mut entries, ix.program_id, false, false);
        }

        if entries.len() > MAX_ACCOUNT_KEYS {
            return Err(RelayError::Encoding(format!(
                "too many account keys: {} > {}",
                entries.len(),
                MAX_ACCOUNT_KEYS
            )));
        }

        // stable sort keeps first-seen order within each class
        entries.sort_by_key(|e| {
            if e.pubkey == *fee_payer {
                0
            } else {
                match (e.is_signer, e.is_writable) {
                    (true, true) => 1,
                    (true, false) => 2,
                    (false, true) => 3,
                    (false, false) => 4,
                }
            }
        });

        let header = MessageHeader {
            num_required_signatures: count_where(&entries, |e| e.is_signer),
            num_readonly_signed_accounts: count_where(&entries, |e| e.is_signer && !e.is_writable),
            num_readonly_unsigned_accounts: count_where(&entries, |e| !e.is_signer && !e.is_writable),
        };

        let account_keys: Vec<Pubkey> = entries.iter().map(|e| e.pubkey).collect();
        let index_of = |key: &Pubkey| -> u8 {
            // every key was inserted above and the count is bounded by MAX_ACCOUNT_KEYS
            account_keys.iter().position(|k| k == key).unwrap_or_default() as u8
        };

        let compiled = instructions
            .iter()
            .map(|ix| CompiledInstruction {
                program_id_index: index_of(&ix.program_id),
                accounts: ix.accounts.iter().map(|meta| index_of(&meta.pubkey)).collect(),
                data: ix.data.clone(),
            })
            .collect();

        Ok(Self {
            header,
            account_keys,
            recent_blockhash,
            instructions: compiled,
        })
    }

    pub fn fee_payer(&self) -> Option<&Pubkey> {
        self.account_keys.first()
    }

    /// Keys that must sign, in signature-slot order.
    pub fn signer_keys(&self) -> &[Pubkey] {
        let n = usize::from(self.header.num_required_signatures).min(self.account_keys.len());
        &self.account_keys[..n]
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(3 + 1 + self.account_keys.len() * 32 + 32 + 64);
        out.push(self.header.num_required_signatures);
        out.push(self.header.num_readonly_signed_accounts);
        out.push(self.header.num_readonly_unsigned_accounts);

        encode_length(&mut out, self.account_keys.len());
        for key in &self.account_keys {
            out.extend_from_slice(key.as_bytes());
        }
        out.extend_from_slice(self.recent_blockhash.as_bytes());

        encode_length(&mut out, self.instructions.len());
        for ix in &self.instructions {
            out.push(ix.program_id_index);
            encode_length(&mut out, ix.accounts.len());
            out.extend_from_slice(&ix.accounts);
            encode_length(&mut out, ix.data.len());
            out.extend_from_slice(&ix.data);
        }
        out
    }
}

fn count_where(entries: &[KeyEntry], pred: impl Fn(&KeyEntry) -> bool) -> u8 {
    entries.iter().filter(|e| pred(e)).count() as u8
}

fn upsert(entries: &mut Vec<KeyEntry>, pubkey: Pubkey, is_signer: bool, is_writable: bool) {
    if let Some(existing) = entries.iter_mut().find(|e| e.pubkey == pubkey) {
        existing.is_signer |= is_signer;
        existing.is_writable |= is_writable;
    } else {
        entries.push(KeyEntry { pubkey, is_signer, is_writable });
    }
}

/// Compact-u16 ("shortvec") length prefix.
pub fn encode_length(out: &mut Vec<u8>, len: usize) {
    let mut rem = len;
    loop {
        let mut byte = (rem & 0x7f) as u8;
        rem >>= 7;
        if rem == 0 {
            out.push(byte);
            break;
        }
        byte |= 0x80;
        out.push(byte);
    }
}
