//! Domain error model.

use thiserror::Error;

/// Result type used across the engine.
pub type DomainResult<T> = Result<T, DomainError>;

/// Engine-level error.
///
/// Validation, not-found and conflict failures are deterministic and are surfaced to the
/// caller as-is. `Storage` is what remains once the storage layer has given up retrying.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Malformed or invariant-violating input. The message lists every problem found.
    #[error("validation failed: {0}")]
    Validation(String),

    /// An identifier could not be parsed.
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// Unknown, invisible or soft-deleted resource.
    #[error("not found: {0}")]
    NotFound(String),

    /// Concurrent edit collision (stale version).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Storage failure after retries were exhausted.
    #[error("storage error: {0}")]
    Storage(String),

    /// Authorization failure at the engine boundary.
    #[error("unauthorized")]
    Unauthorized,
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Stable machine-readable code, used by the HTTP layer and in logs.
    pub fn code(&self) -> &'static str {
        match self {
            DomainError::Validation(_) => "validation_error",
            DomainError::InvalidId(_) => "invalid_id",
            DomainError::NotFound(_) => "not_found",
            DomainError::Conflict(_) => "conflict",
            DomainError::Storage(_) => "storage_error",
            DomainError::Unauthorized => "unauthorized",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_detail() {
        let err = DomainError::validation("amount must be positive");
        assert_eq!(err.to_string(), "validation failed: amount must be positive");
        assert_eq!(err.code(), "validation_error");

        let err = DomainError::not_found("entry 42");
        assert_eq!(err.to_string(), "not found: entry 42");
    }
}
