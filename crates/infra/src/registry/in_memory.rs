use std::collections::HashMap;
use std::sync::RwLock;

use cashbook_chart::{ChartAccount, ChartOfAccounts, VisibleChart};
use cashbook_core::{AccountId, CostCenterId, DomainError, DomainResult, TenantId};
use cashbook_ledger::{Account, CostCenter};

use super::Registry;

#[derive(Debug, Default)]
struct State {
    accounts: HashMap<AccountId, Account>,
    cost_centers: HashMap<CostCenterId, CostCenter>,
    chart: ChartOfAccounts,
}

/// In-memory registration data for tests/dev. Writes validate the same invariants the
/// registration layer would (unique codes, chart tree rules).
#[derive(Debug, Default)]
pub struct InMemoryRegistry {
    inner: RwLock<State>,
}

fn poisoned() -> DomainError {
    DomainError::storage("registry lock poisoned")
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_account(&self, account: Account) -> DomainResult<Account> {
        let mut state = self.inner.write().map_err(|_| poisoned())?;
        let duplicate = state
            .accounts
            .values()
            .any(|a| a.id != account.id && a.tenant_id == account.tenant_id && a.code == account.code);
        if duplicate {
            return Err(DomainError::validation(format!(
                "account code '{}' is already used",
                account.code
            )));
        }
        state.accounts.insert(account.id, account.clone());
        Ok(account)
    }

    pub fn add_cost_center(&self, cost_center: CostCenter) -> DomainResult<CostCenter> {
        let mut state = self.inner.write().map_err(|_| poisoned())?;
        let duplicate = state.cost_centers.values().any(|c| {
            c.id != cost_center.id && c.tenant_id == cost_center.tenant_id && c.code == cost_center.code
        });
        if duplicate {
            return Err(DomainError::validation(format!(
                "cost center code '{}' is already used",
                cost_center.code
            )));
        }
        state.cost_centers.insert(cost_center.id, cost_center.clone());
        Ok(cost_center)
    }

    /// Insert or replace a chart node. `tenant_id` is the writer: it may only touch its own
    /// nodes, and may only hang them under nodes it can see. `in_use` marks a node that
    /// posted splits reference; its structure is then frozen.
    pub fn upsert_chart_account(
        &self,
        tenant_id: TenantId,
        node: ChartAccount,
        in_use: bool,
    ) -> DomainResult<ChartAccount> {
        let mut state = self.inner.write().map_err(|_| poisoned())?;

        if node.owner.tenant_id() != Some(tenant_id) {
            return Err(DomainError::validation("chart accounts can only be written for the caller's tenant"));
        }
        if let Some(existing) = state.chart.get(node.id) {
            if existing.owner != node.owner {
                return Err(DomainError::not_found(format!("chart account {}", node.id)));
            }
        }
        if let Some(parent) = node.parent_id.and_then(|p| state.chart.get(p)) {
            if !parent.owner.is_visible_to(tenant_id) {
                return Err(DomainError::not_found(format!("chart account {}", parent.id)));
            }
        }

        state.chart.upsert(node.clone(), in_use)?;
        Ok(node)
    }

    /// Insert or replace a node shared by every tenant.
    pub fn upsert_global_chart_account(&self, node: ChartAccount, in_use: bool) -> DomainResult<ChartAccount> {
        let mut state = self.inner.write().map_err(|_| poisoned())?;
        if node.owner.tenant_id().is_some() {
            return Err(DomainError::validation("global chart accounts cannot have an owning tenant"));
        }
        state.chart.upsert(node.clone(), in_use)?;
        Ok(node)
    }
}

impl Registry for InMemoryRegistry {
    fn account(&self, tenant_id: TenantId, id: AccountId) -> Option<Account> {
        let state = self.inner.read().ok()?;
        state.accounts.get(&id).filter(|a| a.tenant_id == tenant_id).cloned()
    }

    fn accounts(&self, tenant_id: TenantId) -> Vec<Account> {
        let Ok(state) = self.inner.read() else {
            return vec![];
        };
        let mut out: Vec<Account> = state
            .accounts
            .values()
            .filter(|a| a.tenant_id == tenant_id)
            .cloned()
            .collect();
        out.sort_by(|a, b| a.code.cmp(&b.code));
        out
    }

    fn cost_center(&self, tenant_id: TenantId, id: CostCenterId) -> Option<CostCenter> {
        let state = self.inner.read().ok()?;
        state.cost_centers.get(&id).filter(|c| c.tenant_id == tenant_id).cloned()
    }

    fn cost_centers(&self, tenant_id: TenantId) -> Vec<CostCenter> {
        let Ok(state) = self.inner.read() else {
            return vec![];
        };
        let mut out: Vec<CostCenter> = state
            .cost_centers
            .values()
            .filter(|c| c.tenant_id == tenant_id)
            .cloned()
            .collect();
        out.sort_by(|a, b| a.code.cmp(&b.code));
        out
    }

    fn visible_chart(&self, tenant_id: TenantId) -> VisibleChart {
        match self.inner.read() {
            Ok(state) => state.chart.visible_to(tenant_id),
            Err(_) => VisibleChart::new(tenant_id, Vec::new()),
        }
    }
}
