//! Solana public keys and program-derived addresses.
//!
//! `Pubkey` is a 32-byte ed25519 point (or an off-curve derived
//! address) with base58 text form. Derivation follows the runtime's
//! scheme: sha256 of the seeds, the owning program id, and the
//! `"ProgramDerivedAddress"` marker; a derived address must not be a
//! valid curve point.

use ed25519_dalek::VerifyingKey;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::LazyLock;

use crate::types::AgentError;

pub const PUBKEY_LENGTH: usize = 32;

const PDA_MARKER: &[u8] = b"ProgramDerivedAddress";

/// A Solana account address.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pubkey([u8; PUBKEY_LENGTH]);

impl Pubkey {
    pub const fn new(bytes: [u8; PUBKEY_LENGTH]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; PUBKEY_LENGTH] {
        &self.0
    }

    pub fn to_base58(&self) -> String {
        bs58::encode(self.0).into_string()
    }

    /// Whether these bytes decompress to a point on the ed25519 curve.
    /// Derived addresses are valid only when they do not.
    pub fn is_on_curve(&self) -> bool {
        VerifyingKey::from_bytes(&self.0).is_ok()
    }
}

impl fmt::Display for Pubkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_base58())
    }
}

impl fmt::Debug for Pubkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pubkey({})", self.to_base58())
    }
}

impl std::str::FromStr for Pubkey {
    type Err = AgentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let decoded = bs58::decode(s)
            .into_vec()
            .map_err(|_| AgentError::InvalidAddress(s.to_string()))?;
        let bytes: [u8; PUBKEY_LENGTH] = decoded
            .try_into()
            .map_err(|_| AgentError::InvalidAddress(s.to_string()))?;
        Ok(Self(bytes))
    }
}

impl AsRef<[u8]> for Pubkey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// Well-known program ids
// ---------------------------------------------------------------------------

/// The system program (all-zero id).
pub const SYSTEM_PROGRAM: Pubkey = Pubkey::new([0u8; PUBKEY_LENGTH]);

fn known(addr: &'static str) -> Pubkey {
    addr.parse().expect("well-known program id is valid base58")
}

/// SPL token program.
pub static TOKEN_PROGRAM: LazyLock<Pubkey> =
    LazyLock::new(|| known("TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA"));

/// Associated token account program.
pub static ASSOCIATED_TOKEN_PROGRAM: LazyLock<Pubkey> =
    LazyLock::new(|| known("ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL"));

/// Raydium liquidity pool program (AMM v4).
pub static RAYDIUM_AMM_V4: LazyLock<Pubkey> =
    LazyLock::new(|| known("675kPX9MHTjS2zt1qfr1NYHuzeLXfQM9H24wFSUt1Mp8"));

/// Raydium AMM authority (fixed PDA of the AMM program).
pub static RAYDIUM_AUTHORITY: LazyLock<Pubkey> =
    LazyLock::new(|| known("5Q544fKrFoe6tsEbD7S8EmxGTJYAKtTVhAW5Q5pge4j1"));

// ---------------------------------------------------------------------------
// Program-derived addresses
// ---------------------------------------------------------------------------

/// Derive an address from seeds and a program id. Fails when the
/// result lands on the curve (the runtime rejects such addresses).
pub fn create_program_address(seeds: &[&[u8]], program: &Pubkey) -> Result<Pubkey, AgentError> {
    let mut hasher = Sha256::new();
    for seed in seeds {
        hasher.update(seed);
    }
    hasher.update(program.as_bytes());
    hasher.update(PDA_MARKER);

    let addr = Pubkey::new(hasher.finalize().into());
    if addr.is_on_curve() {
        return Err(AgentError::InvalidAddress(
            "derived address is on the ed25519 curve".to_string(),
        ));
    }
    Ok(addr)
}

/// Search bump seeds from 255 downward for a valid derived address.
pub fn find_program_address(seeds: &[&[u8]], program: &Pubkey) -> Result<(Pubkey, u8), AgentError> {
    for bump in (0..=255u8).rev() {
        let bump_seed = [bump];
        let mut all: Vec<&[u8]> = seeds.to_vec();
        all.push(&bump_seed);
        if let Ok(addr) = create_program_address(&all, program) {
            return Ok((addr, bump));
        }
    }
    Err(AgentError::InvalidAddress(
        "no valid bump seed found".to_string(),
    ))
}

/// The associated token account of `owner` for `mint`.
pub fn associated_token_address(owner: &Pubkey, mint: &Pubkey) -> Result<Pubkey, AgentError> {
    let (addr, _) = find_program_address(
        &[
            owner.as_bytes(),
            TOKEN_PROGRAM.as_bytes(),
            mint.as_bytes(),
        ],
        &ASSOCIATED_TOKEN_PROGRAM,
    )?;
    Ok(addr)
}
