//! # Database Error Types
//!
//! What can go wrong between a repository call and SQLite.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  sqlx::Error   MigrateError   serde_json::Error (JSON columns)         │
//! │       │             │                 │                                 │
//! │       └─────────────┴────────┬────────┘                                 │
//! │                              ▼                                          │
//! │                          DbError                                        │
//! │                              │                                          │
//! │                              ▼                                          │
//! │  LedgerError (tally-ledger) { kind, message }                          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    /// A row that had to exist is gone.
    ///
    /// ## When This Occurs
    /// - `fetch_one` found nothing
    /// - A batched update or delete matched no row
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A UNIQUE or PRIMARY KEY constraint rejected the write.
    ///
    /// ## When This Occurs
    /// - Inserting a ledger entry whose id is already stored (a retried add)
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// A FOREIGN KEY constraint rejected the write.
    ///
    /// ## When This Occurs
    /// - An employee pointing at a company that does not exist
    /// - Removing an employee or company something still references
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Any other statement failure reported by SQLite.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// A stored value could not be decoded (line items JSON, timestamps).
    #[error("Invalid stored data: {0}")]
    InvalidData(String),

    #[error("Connection pool exhausted")]
    PoolExhausted,

    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Whether the error came from a constraint the caller could have
    /// checked first (unique or foreign key).
    pub fn is_constraint(&self) -> bool {
        matches!(
            self,
            DbError::UniqueViolation { .. } | DbError::ForeignKeyViolation { .. }
        )
    }
}

/// ## Mapping
/// ```text
/// RowNotFound                     → NotFound
/// Database, unique violation      → UniqueViolation (column from the message)
/// Database, foreign key violation → ForeignKeyViolation
/// Database, anything else         → QueryFailed
/// PoolTimedOut                    → PoolExhausted
/// PoolClosed                      → ConnectionFailed
/// other                           → Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),

            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                // SQLite: "UNIQUE constraint failed: consumptions.id"
                let field = db_err
                    .message()
                    .rsplit(": ")
                    .next()
                    .unwrap_or("unknown")
                    .to_string();
                DbError::duplicate(field, "unknown")
            }

            sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
                DbError::ForeignKeyViolation {
                    message: db_err.message().to_string(),
                }
            }

            sqlx::Error::Database(db_err) => DbError::QueryFailed(db_err.message().to_string()),

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("pool is closed".to_string()),

            other => DbError::Internal(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

impl From<serde_json::Error> for DbError {
    fn from(err: serde_json::Error) -> Self {
        DbError::InvalidData(err.to_string())
    }
}

pub type DbResult<T> = Result<T, DbError>;
