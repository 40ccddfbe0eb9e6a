//! Persistence layer.
//!
//! A single SQLite table of task records, created on first run. The
//! store only ever appends rows and flips `status`; tasks are never
//! deleted, so the table grows without bound.

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::str::FromStr;
use tracing::{debug, info, warn};

use crate::types::{AgentError, Task, TaskKind, TaskStatus};

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS tasks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    kind TEXT NOT NULL,
    status TEXT NOT NULL,
    payload TEXT NOT NULL,
    created_at TEXT NOT NULL
)";

/// Durable task table. One pool is opened at startup and shared for
/// the process lifetime.
#[derive(Clone)]
pub struct TaskStore {
    pool: SqlitePool,
}

impl TaskStore {
    /// Open (creating if absent) the database at `path` and ensure the
    /// tasks table exists. Fatal for the caller if this fails.
    pub async fn open(path: &str) -> Result<Self, AgentError> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        sqlx::query(CREATE_TABLE).execute(&pool).await?;
        info!(path, "Task store ready");
        Ok(Self { pool })
    }

    /// In-memory store, used by tests.
    pub async fn open_in_memory() -> Result<Self, AgentError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(SqliteConnectOptions::from_str("sqlite::memory:").map_err(AgentError::Storage)?)
            .await?;
        sqlx::query(CREATE_TABLE).execute(&pool).await?;
        Ok(Self { pool })
    }

    /// Append a new pending task; returns its assigned id.
    pub async fn insert(
        &self,
        kind: &TaskKind,
        payload: &serde_json::Value,
    ) -> Result<i64, AgentError> {
        let result = sqlx::query(
            "INSERT INTO tasks (kind, status, payload, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(kind.to_string())
        .bind(TaskStatus::Pending.to_string())
        .bind(payload.to_string())
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        debug!(id, kind = %kind, "Task inserted");
        Ok(id)
    }

    /// All pending tasks, in insertion order.
    pub async fn list_pending(&self) -> Result<Vec<Task>, AgentError> {
        let rows = sqlx::query(
            "SELECT id, kind, status, payload, created_at FROM tasks \
             WHERE status = ? ORDER BY id",
        )
        .bind(TaskStatus::Pending.to_string())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|row| self.row_to_task(row)).collect())
    }

    /// Set the status for the given id. Succeeds (affecting zero rows)
    /// when the id does not exist.
    pub async fn update_status(&self, id: i64, status: TaskStatus) -> Result<(), AgentError> {
        let result = sqlx::query("UPDATE tasks SET status = ? WHERE id = ?")
            .bind(status.to_string())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            warn!(id, "Status update matched no task");
        } else {
            debug!(id, status = %status, "Task status updated");
        }
        Ok(())
    }

    /// Fetch a single task by id, if present.
    pub async fn get(&self, id: i64) -> Result<Option<Task>, AgentError> {
        let row = sqlx::query("SELECT id, kind, status, payload, created_at FROM tasks WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| self.row_to_task(r)))
    }

    fn row_to_task(&self, row: sqlx::sqlite::SqliteRow) -> Task {
        let id: i64 = row.get("id");
        let kind_text: String = row.get("kind");
        let status_text: String = row.get("status");
        let payload_text: String = row.get("payload");
        let created_text: String = row.get("created_at");

        // Unknown kinds round-trip through TaskKind::Other (infallible).
        let kind = kind_text.parse().unwrap_or(TaskKind::Other(kind_text));

        let status = status_text.parse().unwrap_or_else(|_| {
            warn!(id, status = %status_text, "Unknown status in store, treating as failed");
            TaskStatus::Failed
        });

        // A corrupt payload surfaces as null rather than dropping the row.
        let payload = serde_json::from_str(&payload_text).unwrap_or_else(|e| {
            warn!(id, error = %e, "Unparsable task payload");
            serde_json::Value::Null
        });

        let created_at = DateTime::parse_from_rfc3339(&created_text)
            .map(|t| t.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());

        Task {
            id,
            kind,
            status,
            payload,
            created_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
