//! # Execution Channel
//!
//! The boundary every statement crosses to reach the store. Callers hand
//! over SQL text and JSON parameters; rows come back as JSON values. The
//! trait is object-safe so repositories, the batch coordinator, and tests
//! all share one seam.
//!
//! ## Dispatch Paths
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      ExecutionChannel                                   │
//! │                                                                         │
//! │  execute_one(stmt)                 execute_batch(stmts)                 │
//! │       │                                 │                               │
//! │       ▼                                 ▼                               │
//! │  ┌─────────┐                      ┌──────────────┐                      │
//! │  │  pool   │                      │ BEGIN        │                      │
//! │  │ acquire │                      │   stmt 1..n  │ any failure:        │
//! │  └────┬────┘                      │ COMMIT       │ ROLLBACK, nothing   │
//! │       │                          └──────┬───────┘ applied             │
//! │       ▼                                 ▼                              │
//! │   rows: Vec<Vec<Value>>       results: Vec<Vec<Vec<Value>>>            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Value Mapping
//! Parameters bind by JSON type: null, bool, integer, float, string.
//! Arrays and objects are rejected. Cells decode by probing the dynamic
//! storage class in a fixed order (INTEGER, then REAL, then TEXT, then
//! BOOLEAN) and fall back to null, so a bound `true` comes back as `1`.
//! The row codec re-applies column types on top of this transport layer.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow, SqliteSynchronous,
};
use sqlx::{Row, Sqlite, SqlitePool};
use tracing::{debug, info, warn};

use crate::codec::value_kind;
use crate::error::{DbError, DbResult};
use crate::statement::Statement;

/// Result rows of one statement: outer Vec is rows, inner is cells in
/// projection order.
pub type Rows = Vec<Vec<Value>>;

// =============================================================================
// Channel Trait
// =============================================================================

/// Executes statements against the store.
///
/// `execute_batch` is the transactional path: either every statement's
/// effect is applied or none is. Implementations must uphold that, since
/// the domain operations lean on it for balance consistency.
#[async_trait]
pub trait ExecutionChannel: Send + Sync {
    /// Runs a single statement and returns its rows (empty for writes
    /// without RETURNING).
    async fn execute_one(&self, statement: &Statement) -> DbResult<Rows>;

    /// Runs statements in order inside one transaction, returning each
    /// statement's rows. Nothing is applied if any statement fails.
    async fn execute_batch(&self, statements: &[Statement]) -> DbResult<Vec<Rows>>;

    /// Releases underlying resources. Safe to call more than once.
    async fn close(&self) {}
}

// =============================================================================
// Configuration
// =============================================================================

/// Connection settings for the SQLite-backed channel.
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// Filesystem path of the database, or `:memory:`.
    pub path: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
}

impl ChannelConfig {
    /// File-backed store with defaults suited to a single-venue desktop
    /// deployment.
    pub fn new(path: impl Into<String>) -> Self {
        ChannelConfig {
            path: path.into(),
            max_connections: 5,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
        }
    }

    /// In-memory store for tests and ephemeral sessions.
    ///
    /// Pinned to exactly one connection: every SQLite connection to
    /// `:memory:` gets its own private database, so a wider pool would
    /// scatter tables across invisible copies.
    pub fn in_memory() -> Self {
        ChannelConfig {
            path: ":memory:".to_string(),
            max_connections: 1,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(60),
        }
    }

    pub fn max_connections(mut self, n: u32) -> Self {
        self.max_connections = n;
        self
    }

    pub fn min_connections(mut self, n: u32) -> Self {
        self.min_connections = n;
        self
    }

    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }
}

// =============================================================================
// SQLite Channel
// =============================================================================

/// [`ExecutionChannel`] backed by a pooled SQLite database.
pub struct SqliteChannel {
    pool: SqlitePool,
}

impl SqliteChannel {
    /// Opens (creating if missing) the database and prepares the pool.
    ///
    /// Foreign keys stay OFF: references are declared in the schema but
    /// enforced by this layer's own detach/cascade batches, matching the
    /// persisted data's history.
    pub async fn connect(config: &ChannelConfig) -> DbResult<Self> {
        let url = format!("sqlite://{}?mode=rwc", config.path);
        let options = SqliteConnectOptions::from_str(&url)?
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.acquire_timeout)
            .idle_timeout(config.idle_timeout)
            .connect_with(options)
            .await?;

        info!(path = %config.path, "execution channel ready");
        Ok(SqliteChannel { pool })
    }
}

#[async_trait]
impl ExecutionChannel for SqliteChannel {
    async fn execute_one(&self, statement: &Statement) -> DbResult<Rows> {
        debug!(sql = %statement.sql, params = statement.params.len(), "execute");
        fetch_rows(&self.pool, statement).await
    }

    async fn execute_batch(&self, statements: &[Statement]) -> DbResult<Vec<Rows>> {
        debug!(statements = statements.len(), "execute batch");
        let mut tx = self.pool.begin().await?;
        let mut results = Vec::with_capacity(statements.len());
        for statement in statements {
            match fetch_rows(&mut *tx, statement).await {
                Ok(rows) => results.push(rows),
                Err(err) => {
                    if let Err(rollback_err) = tx.rollback().await {
                        warn!(error = %rollback_err, "rollback failed");
                    }
                    return Err(err);
                }
            }
        }
        tx.commit().await?;
        Ok(results)
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

/// Binds a statement's parameters, runs it, and decodes the result rows.
///
/// One fetch path for reads and writes alike: a write without RETURNING
/// simply yields no rows.
async fn fetch_rows<'e, E>(executor: E, statement: &Statement) -> DbResult<Rows>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let mut query = sqlx::query(&statement.sql);
    for param in &statement.params {
        query = match param {
            Value::Null => query.bind(Option::<String>::None),
            Value::Bool(b) => query.bind(*b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    query.bind(i)
                } else if let Some(f) = n.as_f64() {
                    query.bind(f)
                } else {
                    return Err(DbError::Encode(format!("unbindable number: {n}")));
                }
            }
            Value::String(s) => query.bind(s.as_str()),
            other => {
                return Err(DbError::Encode(format!(
                    "unbindable parameter type: {}",
                    value_kind(other)
                )))
            }
        };
    }

    let rows = query.fetch_all(executor).await?;
    Ok(rows.iter().map(decode_sqlite_row).collect())
}

/// Lowers one SQLite row to JSON values by probing storage classes.
fn decode_sqlite_row(row: &SqliteRow) -> Vec<Value> {
    (0..row.len())
        .map(|idx| {
            if let Ok(v) = row.try_get::<i64, _>(idx) {
                Value::from(v)
            } else if let Ok(v) = row.try_get::<f64, _>(idx) {
                serde_json::Number::from_f64(v)
                    .map(Value::Number)
                    .unwrap_or(Value::Null)
            } else if let Ok(v) = row.try_get::<String, _>(idx) {
                Value::String(v)
            } else if let Ok(v) = row.try_get::<bool, _>(idx) {
                Value::Bool(v)
            } else {
                Value::Null
            }
        })
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================
