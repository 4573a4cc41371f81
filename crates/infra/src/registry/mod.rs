//! Read access to registration data (accounts, cost centers, chart of accounts).
//!
//! The ledger never writes registration data; it only resolves references against it.

use std::collections::HashSet;

use cashbook_chart::VisibleChart;
use cashbook_core::{AccountId, CostCenterId, TenantId};
use cashbook_ledger::{Account, Actor, CostCenter};

pub mod in_memory;

pub use in_memory::InMemoryRegistry;

pub trait Registry: Send + Sync {
    fn account(&self, tenant_id: TenantId, id: AccountId) -> Option<Account>;

    fn accounts(&self, tenant_id: TenantId) -> Vec<Account>;

    fn cost_center(&self, tenant_id: TenantId, id: CostCenterId) -> Option<CostCenter>;

    fn cost_centers(&self, tenant_id: TenantId) -> Vec<CostCenter>;

    /// Chart nodes visible to the tenant (its own plus global nodes).
    fn visible_chart(&self, tenant_id: TenantId) -> VisibleChart;
}

/// Accounts of the actor's tenant the actor may not see.
pub fn hidden_accounts(registry: &dyn Registry, actor: &Actor) -> HashSet<AccountId> {
    if actor.privileged {
        return HashSet::new();
    }
    registry
        .accounts(actor.tenant_id)
        .into_iter()
        .filter(|a| !a.is_visible_to(actor))
        .map(|a| a.id)
        .collect()
}
