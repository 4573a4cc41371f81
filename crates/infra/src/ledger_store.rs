//! The single gatekeeper for ledger entry mutations.
//!
//! Every operation is scoped by the [`Actor`]'s tenant, validated with the pure checks from
//! `cashbook-ledger`, written through a [`LedgerRepository`] as one atomic unit, then
//! audited. Audit failures are logged and swallowed.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::instrument;

use cashbook_core::{ChartAccountId, DomainError, DomainResult, EntryId, ExpectedVersion};
use cashbook_ledger::{
    Account, Actor, EntryDraft, EntryFilter, LedgerEntry, PostingRefs, check_confirmation, check_draft,
    check_version,
};

use crate::audit::{AuditAction, AuditRecord, AuditSink};
use crate::registry::{Registry, hidden_accounts};
use crate::repository::LedgerRepository;

#[derive(Clone)]
pub struct LedgerStore {
    repo: Arc<dyn LedgerRepository>,
    registry: Arc<dyn Registry>,
    audit: Arc<dyn AuditSink>,
}

impl LedgerStore {
    pub fn new(repo: Arc<dyn LedgerRepository>, registry: Arc<dyn Registry>, audit: Arc<dyn AuditSink>) -> Self {
        Self { repo, registry, audit }
    }

    /// Validate and store a new entry with the tenant's next code.
    #[instrument(
        skip(self, draft),
        fields(tenant_id = %actor.tenant_id, account_id = %draft.account_id, amount = %draft.amount),
        err
    )]
    pub async fn post(&self, actor: &Actor, draft: EntryDraft) -> DomainResult<LedgerEntry> {
        let account = self.visible_account(actor, &draft)?;
        let confirmed = draft.confirmed.unwrap_or(account.default_confirmed);
        self.validate(actor, &account, &draft, confirmed)?;

        let entry = LedgerEntry::from_draft(actor.tenant_id, 0, draft, confirmed, Utc::now());
        let stored = self.repo.insert(entry).await?;

        tracing::info!(entry_id = %stored.id, code = stored.code, confirmed, "ledger entry posted");
        self.audit(actor, AuditAction::Create, None, Some(&stored));
        Ok(stored)
    }

    /// Replace an entry and its splits. A draft without `confirmed` keeps the entry's
    /// current state. A concurrent writer committing between our read and our write
    /// surfaces as `Conflict`.
    #[instrument(
        skip(self, draft),
        fields(tenant_id = %actor.tenant_id, entry_id = %id, expected = ?expected),
        err
    )]
    pub async fn update(
        &self,
        actor: &Actor,
        id: EntryId,
        draft: EntryDraft,
        expected: ExpectedVersion,
    ) -> DomainResult<LedgerEntry> {
        let current = self.live_entry(actor, id).await?;
        check_version(expected, current.version).into_result()?;

        let account = self.visible_account(actor, &draft)?;
        let confirmed = draft.confirmed.unwrap_or(current.confirmed);
        self.validate(actor, &account, &draft, confirmed)?;

        let next = current.replaced_by(draft, confirmed, Utc::now());
        self.repo
            .replace(&next, ExpectedVersion::Exact(current.version))
            .await?;

        tracing::info!(version = next.version, "ledger entry updated");
        self.audit(actor, AuditAction::Update, Some(&current), Some(&next));
        Ok(next)
    }

    /// Flip the confirmation flag. Confirming requires the split sum to match the amount;
    /// setting the current value is a no-op.
    #[instrument(skip(self), fields(tenant_id = %actor.tenant_id, entry_id = %id), err)]
    pub async fn confirm(&self, actor: &Actor, id: EntryId, confirmed: bool) -> DomainResult<LedgerEntry> {
        let current = self.live_entry(actor, id).await?;
        if current.confirmed == confirmed {
            return Ok(current);
        }
        if confirmed {
            check_confirmation(&current).into_result()?;
        }

        let mut next = current.clone();
        next.confirmed = confirmed;
        next.updated_at = Utc::now();
        next.version = current.version + 1;
        self.repo
            .replace(&next, ExpectedVersion::Exact(current.version))
            .await?;

        tracing::info!(version = next.version, "ledger entry confirmation changed");
        self.audit(actor, AuditAction::Confirm, Some(&current), Some(&next));
        Ok(next)
    }

    /// Mark an entry deleted. Deleting an already deleted entry is a no-op.
    #[instrument(skip(self), fields(tenant_id = %actor.tenant_id, entry_id = %id), err)]
    pub async fn soft_delete(&self, actor: &Actor, id: EntryId) -> DomainResult<LedgerEntry> {
        let current = self.get(actor, id).await?;
        if current.is_deleted() {
            return Ok(current);
        }

        let now = Utc::now();
        let mut next = current.clone();
        next.deleted_at = Some(now);
        next.updated_at = now;
        next.version = current.version + 1;
        self.repo
            .replace(&next, ExpectedVersion::Exact(current.version))
            .await?;

        tracing::info!(version = next.version, "ledger entry deleted");
        self.audit(actor, AuditAction::Delete, Some(&current), Some(&next));
        Ok(next)
    }

    /// Fetch one entry, deleted entries included.
    #[instrument(skip(self), fields(tenant_id = %actor.tenant_id, entry_id = %id), err)]
    pub async fn get(&self, actor: &Actor, id: EntryId) -> DomainResult<LedgerEntry> {
        let entry = self
            .repo
            .get(actor.tenant_id, id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("entry {id}")))?;

        if hidden_accounts(self.registry.as_ref(), actor).contains(&entry.account_id) {
            return Err(DomainError::not_found(format!("entry {id}")));
        }
        Ok(entry)
    }

    /// Entries of the actor's tenant matching `filter`, ordered by `(issue_date, code)`.
    #[instrument(skip(self, filter), fields(tenant_id = %actor.tenant_id), err)]
    pub async fn list(&self, actor: &Actor, filter: &EntryFilter) -> DomainResult<Vec<LedgerEntry>> {
        let hidden = hidden_accounts(self.registry.as_ref(), actor);
        let mut entries = self.repo.list(actor.tenant_id, filter).await?;
        entries.retain(|e| !hidden.contains(&e.account_id));
        tracing::debug!(count = entries.len(), "ledger entries listed");
        Ok(entries)
    }

    /// Whether posted splits reference the chart node. Chart writes use it to freeze the
    /// structure of nodes the ledger depends on.
    #[instrument(skip(self), err)]
    pub async fn chart_account_in_use(&self, id: ChartAccountId) -> DomainResult<bool> {
        Ok(self.repo.chart_account_in_use(id).await?)
    }

    async fn live_entry(&self, actor: &Actor, id: EntryId) -> DomainResult<LedgerEntry> {
        let entry = self.get(actor, id).await?;
        if entry.is_deleted() {
            return Err(DomainError::not_found(format!("entry {id} (deleted)")));
        }
        Ok(entry)
    }

    fn visible_account(&self, actor: &Actor, draft: &EntryDraft) -> DomainResult<Account> {
        self.registry
            .account(actor.tenant_id, draft.account_id)
            .filter(|a| a.is_visible_to(actor))
            .ok_or_else(|| DomainError::not_found(format!("account {}", draft.account_id)))
    }

    fn validate(&self, actor: &Actor, account: &Account, draft: &EntryDraft, confirmed: bool) -> DomainResult<()> {
        let chart = self.registry.visible_chart(actor.tenant_id);
        let cost_centers: HashMap<_, _> = draft
            .splits
            .iter()
            .filter_map(|s| s.cost_center_id)
            .filter_map(|id| self.registry.cost_center(actor.tenant_id, id))
            .map(|cc| (cc.id, cc))
            .collect();

        let refs = PostingRefs {
            account,
            chart: &chart,
            cost_centers: &cost_centers,
        };
        check_draft(draft, confirmed, refs).into_result()
    }

    fn audit(&self, actor: &Actor, action: AuditAction, before: Option<&LedgerEntry>, after: Option<&LedgerEntry>) {
        let result = AuditRecord::for_entity(actor.tenant_id, actor.user_id, action, before, after)
            .and_then(|record| self.audit.record(&record));

        if let Err(e) = result {
            tracing::warn!(error = %e, action = %action, "audit record dropped");
        }
    }
}
