//! Legacy transaction wire format.
//!
//! Builds and serializes the message layout the RPC node expects:
//! a three-byte header, compact-u16 ("shortvec") length prefixes, the
//! deduplicated account table ordered writable-signers first, the
//! recent blockhash, and per-instruction index lists.

use crate::chain::pubkey::{Pubkey, SYSTEM_PROGRAM};
use crate::wallet::Wallet;

pub type Blockhash = [u8; 32];

/// System program transfer instruction discriminant.
const SYSTEM_TRANSFER_INDEX: u32 = 2;

// ---------------------------------------------------------------------------
// Instructions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountMeta {
    pub pubkey: Pubkey,
    pub is_signer: bool,
    pub is_writable: bool,
}

impl AccountMeta {
    pub fn writable(pubkey: Pubkey, is_signer: bool) -> Self {
        Self {
            pubkey,
            is_signer,
            is_writable: true,
        }
    }

    pub fn readonly(pubkey: Pubkey, is_signer: bool) -> Self {
        Self {
            pubkey,
            is_signer,
            is_writable: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Instruction {
    pub program_id: Pubkey,
    pub accounts: Vec<AccountMeta>,
    pub data: Vec<u8>,
}

/// Native SOL transfer: `lamports` from `from` to `to`.
pub fn system_transfer(from: &Pubkey, to: &Pubkey, lamports: u64) -> Instruction {
    let mut data = Vec::with_capacity(12);
    data.extend_from_slice(&SYSTEM_TRANSFER_INDEX.to_le_bytes());
    data.extend_from_slice(&lamports.to_le_bytes());

    Instruction {
        program_id: SYSTEM_PROGRAM,
        accounts: vec![
            AccountMeta::writable(*from, true),
            AccountMeta::writable(*to, false),
        ],
        data,
    }
}

// ---------------------------------------------------------------------------
// Compact-u16 ("shortvec") encoding
// ---------------------------------------------------------------------------

pub fn encode_shortvec_len(out: &mut Vec<u8>, mut len: usize) {
    loop {
        let mut byte = (len & 0x7f) as u8;
        len >>= 7;
        if len != 0 {
            byte |= 0x80;
        }
        out.push(byte);
        if len == 0 {
            break;
        }
    }
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Message {
    pub num_required_signatures: u8,
    pub num_readonly_signed: u8,
    pub num_readonly_unsigned: u8,
    pub account_keys: Vec<Pubkey>,
    pub recent_blockhash: Blockhash,
    pub instructions: Vec<CompiledInstruction>,
}

#[derive(Debug, Clone)]
pub struct CompiledInstruction {
    pub program_id_index: u8,
    pub account_indices: Vec<u8>,
    pub data: Vec<u8>,
}

impl Message {
    /// Compile instructions into a message with `payer` as the fee
    /// payer (first writable signer).
    pub fn compile(payer: &Pubkey, instructions: &[Instruction], blockhash: Blockhash) -> Self {
        // Merge metas: signer/writable flags accumulate across uses.
        let mut metas: Vec<AccountMeta> = vec![AccountMeta::writable(*payer, true)];
        for ix in instructions {
            for meta in &ix.accounts {
                match metas.iter_mut().find(|m| m.pubkey == meta.pubkey) {
                    Some(existing) => {
                        existing.is_signer |= meta.is_signer;
                        existing.is_writable |= meta.is_writable;
                    }
                    None => metas.push(meta.clone()),
                }
            }
            if !metas.iter().any(|m| m.pubkey == ix.program_id) {
                metas.push(AccountMeta::readonly(ix.program_id, false));
            }
        }

        // Order: writable signers, readonly signers, writable
        // non-signers, readonly non-signers. Stable within each class.
        metas.sort_by_key(|m| match (m.is_signer, m.is_writable) {
            (true, true) => 0u8,
            (true, false) => 1,
            (false, true) => 2,
            (false, false) => 3,
        });

        let num_required_signatures = metas.iter().filter(|m| m.is_signer).count() as u8;
        let num_readonly_signed =
            metas.iter().filter(|m| m.is_signer && !m.is_writable).count() as u8;
        let num_readonly_unsigned =
            metas.iter().filter(|m| !m.is_signer && !m.is_writable).count() as u8;

        let account_keys: Vec<Pubkey> = metas.iter().map(|m| m.pubkey).collect();
        let index_of = |key: &Pubkey| -> u8 {
            account_keys
                .iter()
                .position(|k| k == key)
                .map(|i| i as u8)
                .unwrap_or(0)
        };

        let compiled = instructions
            .iter()
            .map(|ix| CompiledInstruction {
                program_id_index: index_of(&ix.program_id),
                account_indices: ix.accounts.iter().map(|m| index_of(&m.pubkey)).collect(),
                data: ix.data.clone(),
            })
            .collect();

        Self {
            num_required_signatures,
            num_readonly_signed,
            num_readonly_unsigned,
            account_keys,
            recent_blockhash: blockhash,
            instructions: compiled,
        }
    }

    /// Serialize to the signable wire form.
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(128);
        out.push(self.num_required_signatures);
        out.push(self.num_readonly_signed);
        out.push(self.num_readonly_unsigned);

        encode_shortvec_len(&mut out, self.account_keys.len());
        for key in &self.account_keys {
            out.extend_from_slice(key.as_bytes());
        }

        out.extend_from_slice(&self.recent_blockhash);

        encode_shortvec_len(&mut out, self.instructions.len());
        for ix in &self.instructions {
            out.push(ix.program_id_index);
            encode_shortvec_len(&mut out, ix.account_indices.len());
            out.extend_from_slice(&ix.account_indices);
            encode_shortvec_len(&mut out, ix.data.len());
            out.extend_from_slice(&ix.data);
        }

        out
    }
}

// ---------------------------------------------------------------------------
// Transaction
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Transaction {
    pub signatures: Vec<[u8; 64]>,
    pub message: Message,
}

impl Transaction {
    /// An unsigned transaction (signature slots zeroed).
    pub fn new_unsigned(message: Message) -> Self {
        let slots = message.num_required_signatures as usize;
        Self {
            signatures: vec![[0u8; 64]; slots],
            message,
        }
    }

    /// Sign the message with each wallet whose pubkey appears in a
    /// signer slot. Slots for absent signers are left zeroed.
    pub fn sign(&mut self, wallets: &[&Wallet]) {
        let message_bytes = self.message.serialize();
        let signer_keys =
            &self.message.account_keys[..self.message.num_required_signatures as usize];
        for wallet in wallets {
            if let Some(slot) = signer_keys.iter().position(|k| *k == wallet.pubkey()) {
                self.signatures[slot] = wallet.sign(&message_bytes);
            }
        }
    }

    /// Serialize to the submit wire form: signature list then message.
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(256);
        encode_shortvec_len(&mut out, self.signatures.len());
        for sig in &self.signatures {
            out.extend_from_slice(sig);
        }
        out.extend_from_slice(&self.message.serialize());
        out
    }
}
