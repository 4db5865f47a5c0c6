// ⚠️ Errors - typed failures of store operations

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// A failed backend write during one retry attempt.
///
/// Recovered by the retry loop; only surfaces as the source of
/// [`StoreError::RetriesExhausted`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}")]
pub struct TransientWriteError {
    pub attempt: u32,
    pub reason: String,
}

impl TransientWriteError {
    pub fn new(attempt: u32, reason: impl Into<String>) -> Self {
        TransientWriteError {
            attempt,
            reason: reason.into(),
        }
    }
}

/// Errors surfaced to callers of the entity store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("An entity with the same ID already exists.")]
    DuplicateId(String),

    #[error("Database is unavailable.")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        last_error: TransientWriteError,
    },

    #[error("entity not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),
}

impl StoreError {
    /// True for failures caused by the request itself rather than the backend.
    pub fn is_client_error(&self) -> bool {
        matches!(self, StoreError::DuplicateId(_) | StoreError::Validation(_))
    }
}
