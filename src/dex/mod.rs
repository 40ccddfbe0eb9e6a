//! DEX integration.
//!
//! The executor only needs two operations from a DEX: resolve a pool
//! id to the full set of accounts a swap touches, and build an
//! unsigned swap transaction against them. `raydium` implements this
//! for Raydium AMM v4 pools backed by a Serum market.

pub mod raydium;

use async_trait::async_trait;
use std::fmt;

use crate::chain::pubkey::Pubkey;
use crate::chain::tx::Transaction;
use crate::types::AgentError;

/// Every account involved in a swap against one pool.
#[derive(Debug, Clone)]
pub struct PoolKeys {
    pub amm_id: Pubkey,
    pub amm_open_orders: Pubkey,
    pub amm_target_orders: Pubkey,
    pub base_vault: Pubkey,
    pub quote_vault: Pubkey,
    pub base_mint: Pubkey,
    pub quote_mint: Pubkey,
    pub base_decimals: u8,
    pub market_program: Pubkey,
    pub market_id: Pubkey,
    pub market_bids: Pubkey,
    pub market_asks: Pubkey,
    pub market_event_queue: Pubkey,
    pub market_base_vault: Pubkey,
    pub market_quote_vault: Pubkey,
    pub market_vault_signer: Pubkey,
}

impl fmt::Display for PoolKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "pool {} ({} / {}) via market {}",
            self.amm_id, self.base_mint, self.quote_mint, self.market_id,
        )
    }
}

/// Abstraction over the DEX operations the executor consumes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DexClient: Send + Sync {
    /// Fetch and decode the pool and its market metadata.
    async fn load_pool(&self, pool_id: &Pubkey) -> Result<PoolKeys, AgentError>;

    /// Build an unsigned fixed-side-in swap of `amount_in` base units
    /// for at least `min_amount_out` quote units, paid by `owner`.
    async fn build_swap(
        &self,
        keys: &PoolKeys,
        owner: &Pubkey,
        amount_in: u64,
        min_amount_out: u64,
    ) -> Result<Transaction, AgentError>;
}
