//! Shared types for the COURIER agent.
//!
//! These types form the data model used across all modules.
//! They are designed to be stable so that chain, dex, storage,
//! and engine modules can depend on them without circular references.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Smallest unit of the native balance; 1e9 lamports = 1 SOL.
pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// Convert a SOL amount to lamports, truncating sub-lamport precision.
pub fn sol_to_lamports(sol: f64) -> u64 {
    (sol * LAMPORTS_PER_SOL as f64) as u64
}

/// Convert lamports to a human-readable SOL amount.
pub fn lamports_to_sol(lamports: u64) -> f64 {
    lamports as f64 / LAMPORTS_PER_SOL as f64
}

// ---------------------------------------------------------------------------
// Task
// ---------------------------------------------------------------------------

/// A unit of requested work, persisted in the task store.
///
/// `id` is assigned by the store on insert and never changes.
/// `payload` is kind-specific JSON, immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub kind: TaskKind,
    pub status: TaskStatus,
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task #{} [{}] {}", self.id, self.kind, self.status)
    }
}

/// Task kind tag. Unknown strings round-trip through `Other` so the
/// store never rejects a row it cannot classify.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskKind {
    Transfer,
    DexTrade,
    Other(String),
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskKind::Transfer => write!(f, "transfer"),
            TaskKind::DexTrade => write!(f, "dex_trade"),
            TaskKind::Other(s) => write!(f, "{s}"),
        }
    }
}

impl std::str::FromStr for TaskKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "transfer" => TaskKind::Transfer,
            "dex_trade" => TaskKind::DexTrade,
            other => TaskKind::Other(other.to_string()),
        })
    }
}

/// Task lifecycle status. Valid transitions are `Pending → Completed`
/// and `Pending → Failed`; terminal states never change again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    Pending,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TaskStatus::Pending)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskStatus::Pending => write!(f, "pending"),
            TaskStatus::Completed => write!(f, "completed"),
            TaskStatus::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TaskStatus::Pending),
            "completed" => Ok(TaskStatus::Completed),
            "failed" => Ok(TaskStatus::Failed),
            other => Err(anyhow::anyhow!("Unknown task status: {other}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

/// Payload for a `transfer` task. `amount` is in SOL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferPayload {
    pub to: String,
    pub amount: f64,
}

impl TransferPayload {
    pub fn lamports(&self) -> u64 {
        sol_to_lamports(self.amount)
    }
}

impl fmt::Display for TransferPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} SOL → {}", self.amount, self.to)
    }
}

// ---------------------------------------------------------------------------
// Pass report
// ---------------------------------------------------------------------------

/// Summary of a single executor pass over the pending set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PassReport {
    pub processed: usize,
    pub completed: usize,
    pub failed: usize,
}

impl fmt::Display for PassReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "processed={} completed={} failed={}",
            self.processed, self.completed, self.failed,
        )
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain-specific error types for COURIER.
///
/// `ConfigMissing` is fatal at startup. `Storage` is fatal during
/// initialization only. The remaining variants are per-task: the
/// executor catches them at the task boundary and converts them to a
/// `failed` status write, so they never crash the loop.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("Missing required configuration: {0}")]
    ConfigMissing(String),

    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Transaction rejected: {0}")]
    TransactionRejected(String),

    #[error("Invalid task payload: {0}")]
    Payload(String),

    #[error("Dex error: {0}")]
    Dex(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
