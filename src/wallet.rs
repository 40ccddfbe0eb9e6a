//! Key/signer provider.
//!
//! Wraps an ed25519 keypair in the format the agent consumes: the
//! secret is a comma-separated list of the 64 keypair bytes
//! (seed followed by public key), as printed by the `keygen` binary.

use ed25519_dalek::{Signer, SigningKey, KEYPAIR_LENGTH};
use rand::rngs::OsRng;

use crate::chain::pubkey::Pubkey;
use crate::types::AgentError;

/// The agent's signing identity.
#[derive(Clone)]
pub struct Wallet {
    signing_key: SigningKey,
}

impl Wallet {
    /// Parse the comma-separated 64-byte secret key. The embedded
    /// public half is validated against the seed.
    pub fn from_secret_str(secret: &str) -> Result<Self, AgentError> {
        let bytes: Vec<u8> = secret
            .split(',')
            .map(|part| part.trim().parse::<u8>())
            .collect::<Result<_, _>>()
            .map_err(|_| {
                AgentError::ConfigMissing("private key is not a comma-separated byte list".into())
            })?;

        let keypair: [u8; KEYPAIR_LENGTH] = bytes.try_into().map_err(|v: Vec<u8>| {
            AgentError::ConfigMissing(format!("private key must be 64 bytes, got {}", v.len()))
        })?;

        let signing_key = SigningKey::from_keypair_bytes(&keypair).map_err(|e| {
            AgentError::ConfigMissing(format!("private key is not a valid ed25519 keypair: {e}"))
        })?;

        Ok(Self { signing_key })
    }

    /// Generate a fresh keypair from the OS entropy source.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// The wallet's public address.
    pub fn pubkey(&self) -> Pubkey {
        Pubkey::new(self.signing_key.verifying_key().to_bytes())
    }

    /// Sign an arbitrary message (a serialized transaction message).
    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        self.signing_key.sign(message).to_bytes()
    }

    /// The 64 keypair bytes as a comma-separated string, the format
    /// `from_secret_str` parses. Printed by `keygen`.
    pub fn secret_bytes_csv(&self) -> String {
        self.signing_key
            .to_keypair_bytes()
            .iter()
            .map(|b| b.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl std::fmt::Debug for Wallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never expose key material through Debug.
        f.debug_struct("Wallet").field("pubkey", &self.pubkey()).finish()
    }
}
