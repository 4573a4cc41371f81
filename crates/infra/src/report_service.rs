//! Read-side services: fetch the actor's entries, then hand them to the pure report engines.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::instrument;

use cashbook_core::{AccountId, DomainError, DomainResult};
use cashbook_ledger::{Actor, DateRange, EntryFilter};
use cashbook_reports::{AccountBalance, DreOptions, DreReport, Statement, account_balances, dre, statement};

use crate::registry::{Registry, hidden_accounts};
use crate::repository::LedgerRepository;

/// Parameters of a bank statement request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct StatementQuery {
    pub account_id: AccountId,
    pub range: DateRange,
    /// Restrict to confirmed (`Some(true)`) or unconfirmed (`Some(false)`) entries.
    #[serde(default)]
    pub confirmed: Option<bool>,
    #[serde(default)]
    pub include_deleted: bool,
}

#[derive(Clone)]
pub struct ReportService {
    repo: Arc<dyn LedgerRepository>,
    registry: Arc<dyn Registry>,
}

impl ReportService {
    pub fn new(repo: Arc<dyn LedgerRepository>, registry: Arc<dyn Registry>) -> Self {
        Self { repo, registry }
    }

    #[instrument(
        skip(self),
        fields(tenant_id = %actor.tenant_id, account_id = %query.account_id),
        err
    )]
    pub async fn statement(&self, actor: &Actor, query: StatementQuery) -> DomainResult<Statement> {
        self.registry
            .account(actor.tenant_id, query.account_id)
            .filter(|a| a.is_visible_to(actor))
            .ok_or_else(|| DomainError::not_found(format!("account {}", query.account_id)))?;

        // Everything up to the end of the range: earlier entries feed the opening balance.
        let filter = EntryFilter {
            date_to: Some(query.range.to),
            account_id: Some(query.account_id),
            confirmed: query.confirmed,
            include_deleted: query.include_deleted,
            ..EntryFilter::default()
        };
        let entries = self.repo.list(actor.tenant_id, &filter).await?;
        Ok(statement(&entries, query.range))
    }

    /// Income statement over confirmed, non-deleted entries of the accounts the actor sees.
    #[instrument(skip(self), fields(tenant_id = %actor.tenant_id), err)]
    pub async fn dre(&self, actor: &Actor, range: DateRange, options: DreOptions) -> DomainResult<DreReport> {
        let filter = EntryFilter {
            date_from: Some(range.from),
            date_to: Some(range.to),
            confirmed: Some(true),
            ..EntryFilter::default()
        };
        let hidden = hidden_accounts(self.registry.as_ref(), actor);
        let mut entries = self.repo.list(actor.tenant_id, &filter).await?;
        entries.retain(|e| !hidden.contains(&e.account_id));

        let chart = self.registry.visible_chart(actor.tenant_id);
        let report = dre::run(&chart, &entries, range, options);
        tracing::debug!(entries = entries.len(), lines = report.lines.len(), "dre computed");
        Ok(report)
    }

    #[instrument(skip(self), fields(tenant_id = %actor.tenant_id), err)]
    pub async fn balances(&self, actor: &Actor, as_of: NaiveDate) -> DomainResult<Vec<AccountBalance>> {
        let filter = EntryFilter {
            date_to: Some(as_of),
            ..EntryFilter::default()
        };
        let hidden = hidden_accounts(self.registry.as_ref(), actor);
        let mut entries = self.repo.list(actor.tenant_id, &filter).await?;
        entries.retain(|e| !hidden.contains(&e.account_id));
        Ok(account_balances(&entries, as_of))
    }
}
