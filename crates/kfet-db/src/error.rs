//! # Data Layer Error Types
//!
//! Error types for statement building, dispatch, and row decoding.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  Before dispatch          In flight              After dispatch         │
//! │  ───────────────          ─────────              ──────────────         │
//! │  MissingColumn            Connection             RowArity               │
//! │  UnknownColumn            Channel                Decode                 │
//! │  EmptyPatch               (batch rolled          NotFound               │
//! │  InvalidValue              back as a unit)                              │
//! │  InvalidStatement                                                       │
//! │  Input (ValidationError)                                                │
//! │  Encode                                                                 │
//! │       │                        │                      │                 │
//! │       └────────────────────────┴──────────────────────┘                 │
//! │                                │                                        │
//! │                                ▼                                        │
//! │        Domain operation caller (no retry, no partial effect)            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A decoding error means the physical store and the schema registry have
//! drifted apart; it is always reported, never papered over with defaults.

use kfet_core::ValidationError;
use thiserror::Error;

/// Data layer errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found.
    ///
    /// ## When This Occurs
    /// - An update or delete matched no row (detected via RETURNING)
    /// - A balance operation references a customer that does not exist
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: i64 },

    /// A required column (non-nullable, no default) was absent from an
    /// insert payload. Raised before dispatch.
    #[error("missing required column {table}.{column}")]
    MissingColumn {
        table: &'static str,
        column: String,
    },

    /// A payload carried a field that is not a column of the target table.
    /// Guards against silent schema drift between records and registry.
    #[error("unknown column {table}.{column}")]
    UnknownColumn {
        table: &'static str,
        column: String,
    },

    /// A partial update provided no fields at all.
    #[error("empty patch for {table}: at least one column must be provided")]
    EmptyPatch { table: &'static str },

    /// A provided value does not fit the column's declared type
    /// (including null for a non-nullable column).
    #[error("invalid value for {table}.{column}: expected {expected}")]
    InvalidValue {
        table: &'static str,
        column: String,
        expected: &'static str,
    },

    /// A statement was assembled against the registry incorrectly
    /// (e.g. joining entities with no declared reference).
    #[error("invalid statement for {table}: {reason}")]
    InvalidStatement {
        table: &'static str,
        reason: String,
    },

    /// Input failed a domain validation rule.
    #[error("invalid input: {0}")]
    Input(#[from] ValidationError),

    /// A payload could not be serialized into wire values. Raised before
    /// dispatch.
    #[error("encode failed: {0}")]
    Encode(String),

    /// The execution channel could not be reached or has gone away.
    #[error("connection failed: {0}")]
    Connection(String),

    /// The remote execution of a statement (or batch) failed. For batches
    /// this means nothing was applied.
    #[error("execution failed: {0}")]
    Channel(String),

    /// A returned row's width does not match the expected column list.
    #[error("row shape mismatch for {table}: expected {expected} columns, got {actual}")]
    RowArity {
        table: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A returned cell or row could not be decoded into the typed record.
    #[error("decode failed: {0}")]
    Decode(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity kind and id.
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        DbError::NotFound { entity, id }
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::PoolTimedOut   → DbError::Connection
/// sqlx::Error::PoolClosed     → DbError::Connection
/// sqlx::Error::Io             → DbError::Connection
/// sqlx::Error::Database       → DbError::Channel (remote rejected the SQL)
/// Other                       → DbError::Channel
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut => {
                DbError::Connection("connection pool timed out".to_string())
            }
            sqlx::Error::PoolClosed => DbError::Connection("connection pool is closed".to_string()),
            sqlx::Error::Io(e) => DbError::Connection(e.to_string()),
            sqlx::Error::Database(db_err) => DbError::Channel(db_err.message().to_string()),
            other => DbError::Channel(other.to_string()),
        }
    }
}

/// Result type for data layer operations.
pub type DbResult<T> = Result<T, DbError>;

// =============================================================================
// Unit Tests
// =============================================================================
