//! COURIER: Autonomous Solana task execution agent.
//!
//! Entry point. Loads configuration and the five mandatory env-backed
//! values (exiting with status 1 before any storage side effect if one
//! is missing), initialises structured logging, opens the task store,
//! seeds the two example tasks, and runs the poll loop with graceful
//! shutdown.

use anyhow::{Context, Result};
use secrecy::ExposeSecret;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use courier::chain::rpc::RpcClient;
use courier::chain::ChainClient;
use courier::config::{AppConfig, Secrets};
use courier::dex::raydium::RaydiumClient;
use courier::engine::executor::{TaskExecutor, TradeConfig};
use courier::engine::runner::Agent;
use courier::storage::TaskStore;
use courier::types::{lamports_to_sol, TaskKind};
use courier::wallet::Wallet;

const BANNER: &str = r#"
  ____ ___  _   _ ____  ___ _____ ____
 / ___/ _ \| | | |  _ \|_ _| ____|  _ \
| |  | | | | | | | |_) || ||  _| | |_) |
| |__| |_| | |_| |  _ < | || |___|  _ <
 \____\___/ \___/|_| \_\___|_____|_| \_\

  Chain Operations Unit for Routing & Executing Requests
  v0.1.0 - Autonomous Agent
"#;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    // Load configuration from TOML
    let cfg = AppConfig::load("config.toml")?;

    // Resolve the mandatory env-backed values before touching storage.
    // A missing one exits with status 1 and a diagnostic, nothing else.
    let secrets = match Secrets::from_env(&cfg) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    // Initialise structured logging
    init_logging();

    // Print startup banner
    println!("{BANNER}");
    info!(
        agent_name = %cfg.agent.name,
        poll_interval_secs = cfg.agent.poll_interval_secs,
        rpc_url = %cfg.rpc.url,
        "Agent started"
    );

    // -- Initialise components -------------------------------------------

    let wallet = Wallet::from_secret_str(secrets.private_key.expose_secret())
        .context("Failed to load signing key")?;
    info!(pubkey = %wallet.pubkey(), "Wallet loaded");

    let chain: Arc<dyn ChainClient> = Arc::new(RpcClient::new(
        &cfg.rpc.url,
        &cfg.rpc.commitment,
        Duration::from_secs(cfg.rpc.confirm_timeout_secs),
    )?);
    let dex = Arc::new(RaydiumClient::new(Arc::clone(&chain)));

    let store = TaskStore::open(&cfg.agent.db_path)
        .await
        .context("Failed to initialise task store")?;

    // -- Startup report ---------------------------------------------------

    let balance = chain.get_balance(&wallet.pubkey()).await?;
    info!(sol = lamports_to_sol(balance), "Balance");

    // Seed the example tasks: one transfer to the configured recipient
    // and one empty DEX trade, each process start.
    if cfg.agent.seed_example_tasks {
        store
            .insert(
                &TaskKind::Transfer,
                &json!({"to": secrets.recipient, "amount": cfg.transfer.amount_sol}),
            )
            .await?;
        store.insert(&TaskKind::DexTrade, &json!({})).await?;
        info!("Seeded example tasks");
    }

    // -- Main loop --------------------------------------------------------

    let executor = TaskExecutor::new(
        chain,
        dex,
        wallet,
        TradeConfig {
            pool_id: secrets.pool_id,
            base_mint: secrets.base_mint,
            quote_mint: secrets.quote_mint,
        },
    );

    let agent = Agent::new(
        store,
        executor,
        Duration::from_secs(cfg.agent.poll_interval_secs),
    );
    agent.run().await?;

    info!("Agent shut down cleanly.");
    Ok(())
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("courier=info"));

    let json_logging = std::env::var("COURIER_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    } else {
        fmt().with_env_filter(env_filter).with_target(true).init();
    }
}
