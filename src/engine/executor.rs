//! Task executor.
//!
//! Dispatches one pending task at a time by kind, invoking the chain
//! and DEX clients, and converts each handler's `Result` into a single
//! terminal status write. Per-task errors never escape the task
//! boundary; the loop keeps running.

use std::sync::Arc;
use tracing::{error, info, warn};

use crate::chain::pubkey::Pubkey;
use crate::chain::tx::{system_transfer, Message, Transaction};
use crate::chain::ChainClient;
use crate::dex::raydium::ui_to_native;
use crate::dex::DexClient;
use crate::storage::TaskStore;
use crate::types::{AgentError, PassReport, Task, TaskKind, TaskStatus, TransferPayload};
use crate::wallet::Wallet;

/// Example swap size, in base-mint UI units. The quote bound is zero
/// and the side is fixed to base-in.
const DEX_BASE_AMOUNT_UI: f64 = 0.001;

/// Pool and mint identifiers for the dex_trade handler. Held as text
/// and parsed per task, so a malformed identifier fails the task
/// rather than startup.
#[derive(Debug, Clone)]
pub struct TradeConfig {
    pub pool_id: String,
    pub base_mint: String,
    pub quote_mint: String,
}

/// Executes pending tasks against the chain and DEX clients.
pub struct TaskExecutor {
    chain: Arc<dyn ChainClient>,
    dex: Arc<dyn DexClient>,
    wallet: Wallet,
    trade: TradeConfig,
}

impl TaskExecutor {
    pub fn new(
        chain: Arc<dyn ChainClient>,
        dex: Arc<dyn DexClient>,
        wallet: Wallet,
        trade: TradeConfig,
    ) -> Self {
        Self {
            chain,
            dex,
            wallet,
            trade,
        }
    }

    /// Run one pass over the pending set: execute each task
    /// sequentially and write its terminal status. After this returns,
    /// no examined task is still `pending`.
    ///
    /// Storage failures are logged and skipped, never propagated; the
    /// loop must outlive a transiently unavailable store.
    pub async fn process_pending(&self, store: &TaskStore) -> PassReport {
        let tasks = match store.list_pending().await {
            Ok(tasks) => tasks,
            Err(e) => {
                error!(error = %e, "Failed to list pending tasks");
                return PassReport::default();
            }
        };

        let mut report = PassReport::default();
        for task in &tasks {
            info!(id = task.id, kind = %task.kind, "Processing task");
            let status = self.execute(task).await;

            if let Err(e) = store.update_status(task.id, status).await {
                error!(id = task.id, error = %e, "Failed to record task status");
            }

            report.processed += 1;
            match status {
                TaskStatus::Completed => report.completed += 1,
                TaskStatus::Failed => report.failed += 1,
                TaskStatus::Pending => {}
            }
        }
        report
    }

    /// Dispatch one task and decide its terminal status. Exactly one
    /// status is produced per task; a handler failure is final and is
    /// never overwritten by the completed path.
    pub async fn execute(&self, task: &Task) -> TaskStatus {
        let outcome = match &task.kind {
            TaskKind::Transfer => self.handle_transfer(task).await,
            TaskKind::DexTrade => self.handle_dex_trade(task).await,
            TaskKind::Other(kind) => {
                // No handler registered: the task falls through and is
                // marked completed.
                warn!(id = task.id, kind = %kind, "No handler for task kind");
                Ok(())
            }
        };

        match outcome {
            Ok(()) => TaskStatus::Completed,
            Err(e) => {
                error!(id = task.id, error = %e, "Task failed");
                TaskStatus::Failed
            }
        }
    }

    /// Native SOL transfer. An unparsable recipient fails the task
    /// before any network call is made.
    async fn handle_transfer(&self, task: &Task) -> Result<(), AgentError> {
        let payload: TransferPayload = serde_json::from_value(task.payload.clone())
            .map_err(|e| AgentError::Payload(format!("task {}: {e}", task.id)))?;

        let to: Pubkey = payload.to.parse()?;
        let lamports = payload.lamports();

        info!(id = task.id, to = %to, lamports, "Transferring SOL");

        let blockhash = self.chain.get_latest_blockhash().await?;
        let instruction = system_transfer(&self.wallet.pubkey(), &to, lamports);
        let message = Message::compile(&self.wallet.pubkey(), &[instruction], blockhash);
        let mut tx = Transaction::new_unsigned(message);
        tx.sign(&[&self.wallet]);

        let signature = self.chain.send_transaction(&tx).await?;
        info!(%signature, "Transaction sent");
        self.chain.confirm_transaction(&signature).await?;
        info!(%signature, "Transaction confirmed");
        Ok(())
    }

    /// Swap the hardcoded example amount through the configured pool.
    async fn handle_dex_trade(&self, task: &Task) -> Result<(), AgentError> {
        let pool_id: Pubkey = self.trade.pool_id.parse()?;
        let base_mint: Pubkey = self.trade.base_mint.parse()?;
        let quote_mint: Pubkey = self.trade.quote_mint.parse()?;

        let keys = self.dex.load_pool(&pool_id).await?;
        if keys.base_mint != base_mint || keys.quote_mint != quote_mint {
            return Err(AgentError::Dex(format!(
                "configured mints do not match pool {pool_id} ({} / {})",
                keys.base_mint, keys.quote_mint,
            )));
        }

        let amount_in = ui_to_native(DEX_BASE_AMOUNT_UI, keys.base_decimals);
        // No price is computed, so no output bound can be enforced.
        let min_amount_out = 0;

        info!(id = task.id, pool = %pool_id, amount_in, "Building swap");

        let mut tx = self
            .dex
            .build_swap(&keys, &self.wallet.pubkey(), amount_in, min_amount_out)
            .await?;
        tx.sign(&[&self.wallet]);

        let signature = self.chain.send_transaction(&tx).await?;
        info!(%signature, "DEX trade transaction sent");
        self.chain.confirm_transaction(&signature).await?;
        info!(%signature, "DEX trade transaction confirmed");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
