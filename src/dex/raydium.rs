//! Raydium AMM v4 integration.
//!
//! Decodes the on-chain liquidity state and its Serum market at the
//! fixed byte offsets of their account layouts, and assembles the
//! swap-base-in instruction (discriminant 9) with the standard
//! 18-account meta list.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use crate::chain::pubkey::{
    associated_token_address, create_program_address, Pubkey, RAYDIUM_AUTHORITY, RAYDIUM_AMM_V4,
    TOKEN_PROGRAM,
};
use crate::chain::tx::{AccountMeta, Instruction, Message, Transaction};
use crate::chain::ChainClient;
use crate::dex::{DexClient, PoolKeys};
use crate::types::AgentError;

/// Swap instruction discriminant (fixed side "in").
const SWAP_BASE_IN: u8 = 9;

// AMM v4 liquidity state layout (752 bytes).
const AMM_STATE_LEN: usize = 752;
const AMM_BASE_DECIMAL: usize = 32;
const AMM_BASE_VAULT: usize = 336;
const AMM_QUOTE_VAULT: usize = 368;
const AMM_BASE_MINT: usize = 400;
const AMM_QUOTE_MINT: usize = 432;
const AMM_OPEN_ORDERS: usize = 496;
const AMM_MARKET_ID: usize = 528;
const AMM_MARKET_PROGRAM: usize = 560;
const AMM_TARGET_ORDERS: usize = 592;

// Serum market state v3 layout (388 bytes, 5-byte header padding).
const MARKET_STATE_LEN: usize = 388;
const MARKET_VAULT_SIGNER_NONCE: usize = 45;
const MARKET_BASE_VAULT: usize = 117;
const MARKET_QUOTE_VAULT: usize = 165;
const MARKET_EVENT_QUEUE: usize = 253;
const MARKET_BIDS: usize = 285;
const MARKET_ASKS: usize = 317;

fn read_pubkey(data: &[u8], offset: usize) -> Result<Pubkey, AgentError> {
    let bytes: [u8; 32] = data
        .get(offset..offset + 32)
        .and_then(|s| s.try_into().ok())
        .ok_or_else(|| AgentError::Dex(format!("account data truncated at offset {offset}")))?;
    Ok(Pubkey::new(bytes))
}

fn read_u64(data: &[u8], offset: usize) -> Result<u64, AgentError> {
    let bytes: [u8; 8] = data
        .get(offset..offset + 8)
        .and_then(|s| s.try_into().ok())
        .ok_or_else(|| AgentError::Dex(format!("account data truncated at offset {offset}")))?;
    Ok(u64::from_le_bytes(bytes))
}

/// Raydium client over a chain RPC connection.
pub struct RaydiumClient {
    chain: Arc<dyn ChainClient>,
}

impl RaydiumClient {
    pub fn new(chain: Arc<dyn ChainClient>) -> Self {
        Self { chain }
    }

    fn decode_pool(pool_id: &Pubkey, data: &[u8]) -> Result<DecodedPool, AgentError> {
        if data.len() < AMM_STATE_LEN {
            return Err(AgentError::Dex(format!(
                "{pool_id} is not an AMM v4 pool account ({} bytes)",
                data.len()
            )));
        }
        Ok(DecodedPool {
            base_decimals: read_u64(data, AMM_BASE_DECIMAL)? as u8,
            base_vault: read_pubkey(data, AMM_BASE_VAULT)?,
            quote_vault: read_pubkey(data, AMM_QUOTE_VAULT)?,
            base_mint: read_pubkey(data, AMM_BASE_MINT)?,
            quote_mint: read_pubkey(data, AMM_QUOTE_MINT)?,
            open_orders: read_pubkey(data, AMM_OPEN_ORDERS)?,
            market_id: read_pubkey(data, AMM_MARKET_ID)?,
            market_program: read_pubkey(data, AMM_MARKET_PROGRAM)?,
            target_orders: read_pubkey(data, AMM_TARGET_ORDERS)?,
        })
    }

    fn decode_market(
        market_id: &Pubkey,
        market_program: &Pubkey,
        data: &[u8],
    ) -> Result<DecodedMarket, AgentError> {
        if data.len() < MARKET_STATE_LEN {
            return Err(AgentError::Dex(format!(
                "{market_id} is not a market account ({} bytes)",
                data.len()
            )));
        }
        let nonce = read_u64(data, MARKET_VAULT_SIGNER_NONCE)?;
        let vault_signer = create_program_address(
            &[market_id.as_bytes(), &nonce.to_le_bytes()],
            market_program,
        )
        .map_err(|e| AgentError::Dex(format!("vault signer derivation failed: {e}")))?;

        Ok(DecodedMarket {
            base_vault: read_pubkey(data, MARKET_BASE_VAULT)?,
            quote_vault: read_pubkey(data, MARKET_QUOTE_VAULT)?,
            event_queue: read_pubkey(data, MARKET_EVENT_QUEUE)?,
            bids: read_pubkey(data, MARKET_BIDS)?,
            asks: read_pubkey(data, MARKET_ASKS)?,
            vault_signer,
        })
    }
}

#[derive(Debug)]
struct DecodedPool {
    base_decimals: u8,
    base_vault: Pubkey,
    quote_vault: Pubkey,
    base_mint: Pubkey,
    quote_mint: Pubkey,
    open_orders: Pubkey,
    market_id: Pubkey,
    market_program: Pubkey,
    target_orders: Pubkey,
}

struct DecodedMarket {
    base_vault: Pubkey,
    quote_vault: Pubkey,
    event_queue: Pubkey,
    bids: Pubkey,
    asks: Pubkey,
    vault_signer: Pubkey,
}

#[async_trait]
impl DexClient for RaydiumClient {
    async fn load_pool(&self, pool_id: &Pubkey) -> Result<PoolKeys, AgentError> {
        let pool_data = self.chain.get_account_data(pool_id).await?;
        let pool = Self::decode_pool(pool_id, &pool_data)?;

        debug!(pool = %pool_id, market = %pool.market_id, "Pool state decoded");

        let market_data = self.chain.get_account_data(&pool.market_id).await?;
        let market = Self::decode_market(&pool.market_id, &pool.market_program, &market_data)?;

        Ok(PoolKeys {
            amm_id: *pool_id,
            amm_open_orders: pool.open_orders,
            amm_target_orders: pool.target_orders,
            base_vault: pool.base_vault,
            quote_vault: pool.quote_vault,
            base_mint: pool.base_mint,
            quote_mint: pool.quote_mint,
            base_decimals: pool.base_decimals,
            market_program: pool.market_program,
            market_id: pool.market_id,
            market_bids: market.bids,
            market_asks: market.asks,
            market_event_queue: market.event_queue,
            market_base_vault: market.base_vault,
            market_quote_vault: market.quote_vault,
            market_vault_signer: market.vault_signer,
        })
    }

    async fn build_swap(
        &self,
        keys: &PoolKeys,
        owner: &Pubkey,
        amount_in: u64,
        min_amount_out: u64,
    ) -> Result<Transaction, AgentError> {
        let source = associated_token_address(owner, &keys.base_mint)?;
        let destination = associated_token_address(owner, &keys.quote_mint)?;

        let mut data = Vec::with_capacity(17);
        data.push(SWAP_BASE_IN);
        data.extend_from_slice(&amount_in.to_le_bytes());
        data.extend_from_slice(&min_amount_out.to_le_bytes());

        let instruction = Instruction {
            program_id: *RAYDIUM_AMM_V4,
            accounts: vec![
                AccountMeta::readonly(*TOKEN_PROGRAM, false),
                AccountMeta::writable(keys.amm_id, false),
                AccountMeta::readonly(*RAYDIUM_AUTHORITY, false),
                AccountMeta::writable(keys.amm_open_orders, false),
                AccountMeta::writable(keys.amm_target_orders, false),
                AccountMeta::writable(keys.base_vault, false),
                AccountMeta::writable(keys.quote_vault, false),
                AccountMeta::readonly(keys.market_program, false),
                AccountMeta::writable(keys.market_id, false),
                AccountMeta::writable(keys.market_bids, false),
                AccountMeta::writable(keys.market_asks, false),
                AccountMeta::writable(keys.market_event_queue, false),
                AccountMeta::writable(keys.market_base_vault, false),
                AccountMeta::writable(keys.market_quote_vault, false),
                AccountMeta::readonly(keys.market_vault_signer, false),
                AccountMeta::writable(source, false),
                AccountMeta::writable(destination, false),
                AccountMeta::readonly(*owner, true),
            ],
            data,
        };

        let blockhash = self.chain.get_latest_blockhash().await?;
        let message = Message::compile(owner, &[instruction], blockhash);
        Ok(Transaction::new_unsigned(message))
    }
}

/// Convert a UI amount to native units for a mint with `decimals`.
pub fn ui_to_native(amount: f64, decimals: u8) -> u64 {
    (amount * 10f64.powi(decimals as i32)) as u64
}
