//! Optimistic concurrency primitives.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Optimistic concurrency expectation for a versioned record.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpectedVersion {
    /// Skip version checking. The writer is expected to have re-read the record.
    Any,
    /// Require the record to be at an exact version.
    Exact(u64),
}

impl ExpectedVersion {
    pub fn matches(self, actual: u64) -> bool {
        match self {
            ExpectedVersion::Any => true,
            ExpectedVersion::Exact(v) => v == actual,
        }
    }

    pub fn check(self, actual: u64) -> DomainResult<()> {
        if self.matches(actual) {
            Ok(())
        } else {
            Err(DomainError::conflict(format!(
                "optimistic concurrency check failed (expected: {self:?}, actual: {actual})"
            )))
        }
    }
}

impl From<Option<u64>> for ExpectedVersion {
    fn from(value: Option<u64>) -> Self {
        match value {
            Some(v) => ExpectedVersion::Exact(v),
            None => ExpectedVersion::Any,
        }
    }
}
