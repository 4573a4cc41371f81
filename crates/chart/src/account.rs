use serde::{Deserialize, Serialize};

use cashbook_core::{ChartAccountId, Entity, TenantId};

/// Who a chart node belongs to.
///
/// Global nodes are shared by every tenant; tenant nodes are only visible to their owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "scope", content = "tenant_id", rename_all = "lowercase")]
pub enum Owner {
    Global,
    Tenant(TenantId),
}

impl Owner {
    pub fn is_visible_to(&self, tenant_id: TenantId) -> bool {
        match self {
            Owner::Global => true,
            Owner::Tenant(owner) => *owner == tenant_id,
        }
    }

    pub fn tenant_id(&self) -> Option<TenantId> {
        match self {
            Owner::Global => None,
            Owner::Tenant(t) => Some(*t),
        }
    }
}

impl From<Option<TenantId>> for Owner {
    fn from(value: Option<TenantId>) -> Self {
        match value {
            Some(t) => Owner::Tenant(t),
            None => Owner::Global,
        }
    }
}

/// Synthetic nodes aggregate; only analytic nodes receive postings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanType {
    Synthetic,
    Analytic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RevenueExpense {
    Revenue,
    Expense,
}

/// Natural side of a node (its sign convention in reports).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DebitCredit {
    Debit,
    Credit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FixedVariable {
    Fixed,
    Variable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CostExpense {
    Cost,
    Expense,
}

/// DRE grouping and visibility flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct DreFlags {
    pub other_financial_income: bool,
    pub deductions_taxes: bool,
    pub investments: bool,
    pub sales_marketing: bool,
    pub profit_sharing: bool,
    /// Hide this node (and its subtree) from the DRE.
    pub dre_hide: bool,
    /// Hide this node from cash-flow views.
    pub cashflow_hide: bool,
}

/// A node of the chart of accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartAccount {
    pub id: ChartAccountId,
    pub owner: Owner,
    pub code: String,
    pub description: String,
    pub active: bool,
    /// Aggregation-only node; never a posting target.
    pub is_super: bool,
    pub plan_type: PlanType,
    pub parent_id: Option<ChartAccountId>,
    pub revenue_expense: RevenueExpense,
    pub debit_credit: DebitCredit,
    pub fixed_variable: FixedVariable,
    pub cost_expense: CostExpense,
    #[serde(default)]
    pub flags: DreFlags,
}

impl ChartAccount {
    /// New active node with the conventional natural side for its kind (revenue on the
    /// credit side, expense on the debit side), fixed, non-cost, no flags.
    pub fn new(
        owner: Owner,
        code: impl Into<String>,
        description: impl Into<String>,
        plan_type: PlanType,
        revenue_expense: RevenueExpense,
    ) -> Self {
        let debit_credit = match revenue_expense {
            RevenueExpense::Revenue => DebitCredit::Credit,
            RevenueExpense::Expense => DebitCredit::Debit,
        };

        Self {
            id: ChartAccountId::new(),
            owner,
            code: code.into(),
            description: description.into(),
            active: true,
            is_super: false,
            plan_type,
            parent_id: None,
            revenue_expense,
            debit_credit,
            fixed_variable: FixedVariable::Fixed,
            cost_expense: CostExpense::Expense,
            flags: DreFlags::default(),
        }
    }

    pub fn with_parent(mut self, parent_id: ChartAccountId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    pub fn with_flags(mut self, flags: DreFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_fixed_variable(mut self, fixed_variable: FixedVariable) -> Self {
        self.fixed_variable = fixed_variable;
        self
    }

    pub fn is_analytic(&self) -> bool {
        self.plan_type == PlanType::Analytic
    }

    /// Same revenue/expense kind and natural side.
    pub fn same_nature(&self, other: &ChartAccount) -> bool {
        self.revenue_expense == other.revenue_expense && self.debit_credit == other.debit_credit
    }

    /// Equal in everything but the descriptive fields (`description`, `active`).
    pub fn same_structure(&self, other: &ChartAccount) -> bool {
        self.id == other.id
            && self.owner == other.owner
            && self.code == other.code
            && self.is_super == other.is_super
            && self.plan_type == other.plan_type
            && self.parent_id == other.parent_id
            && self.same_nature(other)
            && self.fixed_variable == other.fixed_variable
            && self.cost_expense == other.cost_expense
            && self.flags == other.flags
    }
}

impl Entity for ChartAccount {
    const KIND: &'static str = "ChartAccount";
    type Id = ChartAccountId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_owner_is_visible_to_everyone() {
        let a = TenantId::new();
        let b = TenantId::new();
        assert!(Owner::Global.is_visible_to(a));
        assert!(Owner::Tenant(a).is_visible_to(a));
        assert!(!Owner::Tenant(a).is_visible_to(b));
        assert_eq!(Owner::from(None), Owner::Global);
        assert_eq!(Owner::from(Some(a)).tenant_id(), Some(a));
    }
}
