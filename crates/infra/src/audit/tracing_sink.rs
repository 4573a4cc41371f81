use super::{AuditError, AuditRecord, AuditSink};

/// Emits each record as a structured `audit` event on the tracing subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, record: &AuditRecord) -> Result<(), AuditError> {
        let old = record.old_snapshot.as_ref().map(ToString::to_string);
        let new = record.new_snapshot.as_ref().map(ToString::to_string);

        tracing::info!(
            target: "audit",
            company_id = %record.company_id,
            user_id = %record.user_id,
            entity = %record.entity,
            entity_id = %record.entity_id,
            action = %record.action,
            old_snapshot = old.as_deref(),
            new_snapshot = new.as_deref(),
            "audit record"
        );
        Ok(())
    }
}
