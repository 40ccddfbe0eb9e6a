//! Solana chain access.
//!
//! `pubkey` and `tx` provide the wire-level primitives; `rpc` talks to
//! a node over JSON-RPC. The `ChainClient` trait is the seam the
//! executor and dex integration depend on, so tests can substitute a
//! deterministic in-memory chain.

pub mod pubkey;
pub mod rpc;
pub mod tx;

use async_trait::async_trait;

use crate::chain::pubkey::Pubkey;
use crate::chain::tx::{Blockhash, Transaction};
use crate::types::AgentError;

/// Abstraction over the blockchain RPC surface the agent consumes.
///
/// `send_transaction` returns the transaction signature (base58);
/// `confirm_transaction` blocks until the network acknowledges it or
/// the client's configured timeout elapses.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Current balance of an account, in lamports.
    async fn get_balance(&self, address: &Pubkey) -> Result<u64, AgentError>;

    /// Raw account data. Errors if the account does not exist.
    async fn get_account_data(&self, address: &Pubkey) -> Result<Vec<u8>, AgentError>;

    /// A recent blockhash usable for transaction construction.
    async fn get_latest_blockhash(&self) -> Result<Blockhash, AgentError>;

    /// Submit a signed transaction; returns its signature.
    async fn send_transaction(&self, tx: &Transaction) -> Result<String, AgentError>;

    /// Wait until the given signature reaches the configured
    /// commitment level.
    async fn confirm_transaction(&self, signature: &str) -> Result<(), AgentError>;
}
