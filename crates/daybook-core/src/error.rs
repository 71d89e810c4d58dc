use daybook_domain::{DateRangeError, RecordId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Customer not found: {0}")]
    CustomerNotFound(String),
    #[error("{kind} not found: {id}")]
    RecordNotFound { kind: &'static str, id: RecordId },
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Invariant violated: {0}")]
    InvariantViolation(String),
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(String),
    #[error(transparent)]
    DateRange(#[from] DateRangeError),
}

pub type CoreResult<T> = Result<T, CoreError>;
