//! Audit trail for ledger mutations.
//!
//! Audit is best-effort: a sink failure is logged by the caller and never rolls back or
//! fails the mutation it describes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use cashbook_core::{Entity, TenantId, UserId};

pub mod jsonl;
pub mod memory;
pub mod tracing_sink;

pub use jsonl::JsonLinesAuditSink;
pub use memory::InMemoryAuditSink;
pub use tracing_sink::TracingAuditSink;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    Create,
    Update,
    Confirm,
    Delete,
}

impl core::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            AuditAction::Create => "CREATE",
            AuditAction::Update => "UPDATE",
            AuditAction::Confirm => "CONFIRM",
            AuditAction::Delete => "DELETE",
        })
    }
}

/// One audited mutation with JSON snapshots of the record before and after it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub company_id: TenantId,
    pub user_id: UserId,
    pub entity: String,
    pub entity_id: String,
    pub action: AuditAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_snapshot: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_snapshot: Option<serde_json::Value>,
    pub recorded_at: DateTime<Utc>,
}

impl AuditRecord {
    /// Build a record for `E`. At least one of `before`/`after` must be given; the entity id
    /// is taken from `after` when present.
    pub fn for_entity<E>(
        company_id: TenantId,
        user_id: UserId,
        action: AuditAction,
        before: Option<&E>,
        after: Option<&E>,
    ) -> Result<Self, AuditError>
    where
        E: Entity + Serialize,
    {
        let subject = after
            .or(before)
            .ok_or_else(|| AuditError::Serialize("audit record without a snapshot".to_string()))?;

        let snapshot = |e: Option<&E>| -> Result<Option<serde_json::Value>, AuditError> {
            e.map(serde_json::to_value)
                .transpose()
                .map_err(|err| AuditError::Serialize(err.to_string()))
        };

        Ok(Self {
            company_id,
            user_id,
            entity: E::KIND.to_string(),
            entity_id: subject.id().to_string(),
            action,
            old_snapshot: snapshot(before)?,
            new_snapshot: snapshot(after)?,
            recorded_at: Utc::now(),
        })
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuditError {
    #[error("failed to serialize audit record: {0}")]
    Serialize(String),

    #[error("audit io error: {0}")]
    Io(String),

    #[error("audit sink unavailable: {0}")]
    Unavailable(String),
}

pub trait AuditSink: Send + Sync {
    fn record(&self, record: &AuditRecord) -> Result<(), AuditError>;
}

impl<S> AuditSink for std::sync::Arc<S>
where
    S: AuditSink + ?Sized,
{
    fn record(&self, record: &AuditRecord) -> Result<(), AuditError> {
        (**self).record(record)
    }
}
