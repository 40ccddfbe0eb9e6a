//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Secrets and chain identifiers (signing key, recipient, pool id,
//! token mints) are referenced by env-var name in the config and
//! resolved at runtime via `std::env::var`. All five are mandatory:
//! a missing one aborts startup before any storage side effect.

use anyhow::{Context, Result};
use secrecy::SecretString;
use serde::Deserialize;
use std::fs;

use crate::types::AgentError;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub agent: AgentConfig,
    pub rpc: RpcConfig,
    pub wallet: WalletConfig,
    pub transfer: TransferConfig,
    pub dex: DexConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AgentConfig {
    pub name: String,
    /// Fixed sleep between executor passes, in seconds.
    pub poll_interval_secs: u64,
    #[serde(default = "default_db_path")]
    pub db_path: String,
    /// Seed the two example tasks (one transfer, one empty dex trade)
    /// on every process start.
    #[serde(default = "default_true")]
    pub seed_example_tasks: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RpcConfig {
    pub url: String,
    #[serde(default = "default_commitment")]
    pub commitment: String,
    /// How long to poll for transaction confirmation before giving up.
    #[serde(default = "default_confirm_timeout")]
    pub confirm_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WalletConfig {
    /// Env var holding the comma-separated 64-byte secret key.
    pub private_key_env: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TransferConfig {
    /// Env var holding the recipient address for the seeded transfer.
    pub recipient_env: String,
    #[serde(default = "default_transfer_amount")]
    pub amount_sol: f64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DexConfig {
    pub pool_id_env: String,
    pub base_mint_env: String,
    pub quote_mint_env: String,
}

fn default_db_path() -> String {
    "agent.db".to_string()
}

fn default_true() -> bool {
    true
}

fn default_commitment() -> String {
    "confirmed".to_string()
}

fn default_confirm_timeout() -> u64 {
    60
}

fn default_transfer_amount() -> f64 {
    0.01
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        Ok(config)
    }

    /// Resolve an environment variable name to its value.
    pub fn resolve_env(env_name: &str) -> Result<String, AgentError> {
        std::env::var(env_name).map_err(|_| AgentError::ConfigMissing(env_name.to_string()))
    }
}

/// The env-resolved mandatory values. Constructed once at startup;
/// a single missing variable fails the whole set.
#[derive(Debug, Clone)]
pub struct Secrets {
    pub private_key: SecretString,
    pub recipient: String,
    pub pool_id: String,
    pub base_mint: String,
    pub quote_mint: String,
}

impl Secrets {
    pub fn from_env(cfg: &AppConfig) -> Result<Self, AgentError> {
        Ok(Self {
            private_key: SecretString::new(AppConfig::resolve_env(&cfg.wallet.private_key_env)?),
            recipient: AppConfig::resolve_env(&cfg.transfer.recipient_env)?,
            pool_id: AppConfig::resolve_env(&cfg.dex.pool_id_env)?,
            base_mint: AppConfig::resolve_env(&cfg.dex.base_mint_env)?,
            quote_mint: AppConfig::resolve_env(&cfg.dex.quote_mint_env)?,
        })
    }
}
