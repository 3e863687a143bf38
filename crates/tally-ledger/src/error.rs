//! # Ledger Errors
//!
//! The one error type callers of [`LedgerService`](crate::LedgerService) see.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Error Conversion Flow                             │
//! │                                                                         │
//! │  tally-core                tally-db                                     │
//! │  ┌──────────────────┐     ┌──────────────────┐                        │
//! │  │ ValidationError  │     │ DbError          │                        │
//! │  │        ↓         │     │  NotFound        │                        │
//! │  │ CoreError        │     │  UniqueViolation │                        │
//! │  └────────┬─────────┘     │  ForeignKey...   │                        │
//! │           │               │  Query/Conn/...  │                        │
//! │           │               └────────┬─────────┘                        │
//! │           ▼                        ▼                                   │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  LedgerError { kind: ErrorKind, message }                       │   │
//! │  │  serialized as { "code": "NOT_FOUND", "message": "..." }       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use tracing::error;

use tally_core::{CoreError, ValidationError};
use tally_db::DbError;

/// Error categories callers can branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Entry, product, company or employee does not exist.
    NotFound,
    /// Malformed input: empty ids, empty item lists, non-positive amounts.
    InvalidArgument,
    /// The entry's state forbids the operation.
    InvalidState,
    /// The operation would leave dangling references.
    PreconditionFailed,
    /// The store failed; nothing was written.
    TransportFailure,
}

/// Error returned by every ledger operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("[{kind:?}] {message}")]
pub struct LedgerError {
    #[serde(rename = "code")]
    pub kind: ErrorKind,
    pub message: String,
}

impl LedgerError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        LedgerError {
            kind,
            message: message.into(),
        }
    }

    pub fn not_found(entity: &str, id: &str) -> Self {
        Self::new(ErrorKind::NotFound, format!("{} not found: {}", entity, id))
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidArgument, message)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}

impl From<ValidationError> for LedgerError {
    fn from(err: ValidationError) -> Self {
        LedgerError::new(ErrorKind::InvalidArgument, err.to_string())
    }
}

impl From<CoreError> for LedgerError {
    fn from(err: CoreError) -> Self {
        let kind = match &err {
            CoreError::NotFound { .. } => ErrorKind::NotFound,
            CoreError::InvalidState { .. } => ErrorKind::InvalidState,
            CoreError::PreconditionFailed { .. } => ErrorKind::PreconditionFailed,
            CoreError::Validation(_) => ErrorKind::InvalidArgument,
        };
        LedgerError::new(kind, err.to_string())
    }
}

/// ## Mapping
/// ```text
/// DbError::NotFound                 → NOT_FOUND
/// DbError::UniqueViolation          → PRECONDITION_FAILED
/// DbError::ForeignKeyViolation      → PRECONDITION_FAILED
/// everything else                   → TRANSPORT_FAILURE (logged)
/// ```
impl From<DbError> for LedgerError {
    fn from(err: DbError) -> Self {
        match &err {
            DbError::NotFound { .. } => LedgerError::new(ErrorKind::NotFound, err.to_string()),
            _ if err.is_constraint() => {
                LedgerError::new(ErrorKind::PreconditionFailed, err.to_string())
            }
            _ => {
                error!(error = %err, "Store operation failed");
                LedgerError::new(ErrorKind::TransportFailure, err.to_string())
            }
        }
    }
}

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_as_code_and_message() {
        let err = LedgerError::not_found("Consumption", "con-1");
        let json = serde_json::to_value(&err).unwrap();

        assert_eq!(json["code"], "NOT_FOUND");
        assert_eq!(json["message"], "Consumption not found: con-1");
    }

    #[test]
    fn test_core_error_kinds() {
        let err: LedgerError =
            CoreError::invalid_state("Consumption", "con-1", "pending", "revert payment").into();
        assert_eq!(err.kind(), ErrorKind::InvalidState);

        let err: LedgerError =
            CoreError::precondition("Employee", "e1", "delete", "entries reference it").into();
        assert_eq!(err.kind(), ErrorKind::PreconditionFailed);

        let err: LedgerError = ValidationError::Required {
            field: "items".to_string(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_db_error_kinds() {
        let err: LedgerError = DbError::not_found("Product", "p1").into();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err: LedgerError = DbError::duplicate("consumptions.id", "con-1").into();
        assert_eq!(err.kind(), ErrorKind::PreconditionFailed);

        let err: LedgerError = DbError::ForeignKeyViolation {
            message: "FOREIGN KEY constraint failed".to_string(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::PreconditionFailed);

        let err: LedgerError = DbError::PoolExhausted.into();
        assert_eq!(err.kind(), ErrorKind::TransportFailure);
    }
}
