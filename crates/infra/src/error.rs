use thiserror::Error;

use cashbook_core::DomainError;

/// Errors surfaced by ledger repositories.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// The stored version no longer matches the writer's expectation.
    #[error("concurrency conflict: {0}")]
    Conflict(String),

    /// The record to replace does not exist.
    #[error("record not found: {0}")]
    NotFound(String),

    /// Anything else the backend reports (connection loss, poisoned lock, bad row).
    #[error("storage backend error: {0}")]
    Backend(String),
}

impl From<StorageError> for DomainError {
    fn from(value: StorageError) -> Self {
        match value {
            StorageError::Conflict(msg) => DomainError::conflict(msg),
            StorageError::NotFound(msg) => DomainError::not_found(msg),
            StorageError::Backend(msg) => DomainError::storage(msg),
        }
    }
}
