use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cashbook_core::{AccountId, CostCenterId, Entity, TenantId};

use crate::actor::Actor;

/// Cash/bank account that entries are posted against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub tenant_id: TenantId,
    /// Unique per tenant, e.g. "001".
    pub code: String,
    pub description: String,
    pub active: bool,
    pub use_in_cash_flow: bool,
    /// Only visible to privileged actors.
    pub super_only: bool,
    /// New entries on this account are confirmed unless the caller says otherwise.
    pub default_confirmed: bool,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn new(tenant_id: TenantId, code: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: AccountId::new(),
            tenant_id,
            code: code.into(),
            description: description.into(),
            active: true,
            use_in_cash_flow: true,
            super_only: false,
            default_confirmed: false,
            created_at: Utc::now(),
        }
    }

    /// Whether `actor` may see (and therefore post to, list or report on) this account.
    pub fn is_visible_to(&self, actor: &Actor) -> bool {
        self.tenant_id == actor.tenant_id && (!self.super_only || actor.privileged)
    }
}

impl Entity for Account {
    const KIND: &'static str = "Account";
    type Id = AccountId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Tenant-scoped cost allocation tag, optionally attached to a split.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostCenter {
    pub id: CostCenterId,
    pub tenant_id: TenantId,
    pub code: String,
    pub description: String,
    pub active: bool,
}

impl CostCenter {
    pub fn new(tenant_id: TenantId, code: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: CostCenterId::new(),
            tenant_id,
            code: code.into(),
            description: description.into(),
            active: true,
        }
    }
}

impl Entity for CostCenter {
    const KIND: &'static str = "CostCenter";
    type Id = CostCenterId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cashbook_core::UserId;

    #[test]
    fn super_only_accounts_need_a_privileged_actor() {
        let tenant_id = TenantId::new();
        let mut account = Account::new(tenant_id, "001", "Main bank");
        account.super_only = true;

        let clerk = Actor::new(tenant_id, UserId::new());
        let owner = Actor::privileged(tenant_id, UserId::new());
        let stranger = Actor::privileged(TenantId::new(), UserId::new());

        assert!(!account.is_visible_to(&clerk));
        assert!(account.is_visible_to(&owner));
        assert!(!account.is_visible_to(&stranger));
    }
}
