//! Arena of chart nodes indexed by id.
//!
//! Parent links are plain ids. Every write re-validates the link it introduces and walks
//! the ancestor chain with a visited set, so a cycle can never be stored.

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use cashbook_core::{ChartAccountId, DomainError, TenantId};

use crate::account::{ChartAccount, Owner};
use crate::visible::VisibleChart;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChartError {
    #[error("parent {0} does not exist")]
    UnknownParent(ChartAccountId),

    #[error("parent '{0}' is analytic and cannot have children")]
    AnalyticParent(String),

    #[error("node '{code}' must share revenue/expense and debit/credit with parent '{parent}'")]
    SignMismatch { code: String, parent: String },

    #[error("node '{code}' cannot hang under '{parent}', which belongs to another tenant")]
    OwnerMismatch { code: String, parent: String },

    #[error("parent link of '{0}' would create a cycle")]
    Cycle(String),

    #[error("code '{0}' is already used in this scope")]
    DuplicateCode(String),

    #[error("node '{0}' has children and cannot become analytic")]
    AnalyticWithChildren(String),

    #[error("node '{code}' cannot change revenue/expense or debit/credit while child '{child}' keeps the old one")]
    ChildSignMismatch { code: String, child: String },

    #[error("node '{0}' is referenced by posted splits; only its description and active flag may change")]
    InUse(String),
}

impl From<ChartError> for DomainError {
    fn from(value: ChartError) -> Self {
        DomainError::validation(value.to_string())
    }
}

/// All chart nodes known to the registry (every tenant plus global nodes).
#[derive(Debug, Clone, Default)]
pub struct ChartOfAccounts {
    nodes: HashMap<ChartAccountId, ChartAccount>,
}

impl ChartOfAccounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an arena from a batch of nodes (e.g. loaded from storage), validating every
    /// parent link and rejecting cycles.
    pub fn from_nodes(nodes: impl IntoIterator<Item = ChartAccount>) -> Result<Self, ChartError> {
        let chart = Self {
            nodes: nodes.into_iter().map(|n| (n.id, n)).collect(),
        };

        for node in chart.nodes.values() {
            chart.check_link(node)?;
            if chart.has_cycle_from(node.id) {
                return Err(ChartError::Cycle(node.code.clone()));
            }
        }

        Ok(chart)
    }

    /// Insert or replace a node. `in_use` tells whether posted splits reference the node;
    /// such a node keeps its structure and only its descriptive fields may change.
    pub fn upsert(&mut self, node: ChartAccount, in_use: bool) -> Result<(), ChartError> {
        if let Some(existing) = self.nodes.get(&node.id) {
            if in_use && !existing.same_structure(&node) {
                return Err(ChartError::InUse(existing.code.clone()));
            }
        }

        self.check_link(&node)?;

        if let Some(parent_id) = node.parent_id {
            if self.path_reaches(parent_id, node.id) {
                return Err(ChartError::Cycle(node.code.clone()));
            }
        }

        let mut children = self.nodes.values().filter(|n| n.parent_id == Some(node.id));
        if let Some(child) = children.next() {
            if node.is_analytic() {
                return Err(ChartError::AnalyticWithChildren(node.code.clone()));
            }
            if let Some(child) = std::iter::once(child).chain(children).find(|c| !c.same_nature(&node)) {
                return Err(ChartError::ChildSignMismatch {
                    code: node.code.clone(),
                    child: child.code.clone(),
                });
            }
        }

        tracing::debug!(chart_account_id = %node.id, code = %node.code, "chart node stored");
        self.nodes.insert(node.id, node);
        Ok(())
    }

    pub fn get(&self, id: ChartAccountId) -> Option<&ChartAccount> {
        self.nodes.get(&id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Resolved view of the nodes a tenant may see (its own plus global ones).
    pub fn visible_to(&self, tenant_id: TenantId) -> VisibleChart {
        VisibleChart::new(
            tenant_id,
            self.nodes
                .values()
                .filter(|n| n.owner.is_visible_to(tenant_id))
                .cloned(),
        )
    }

    fn check_link(&self, node: &ChartAccount) -> Result<(), ChartError> {
        let duplicate = self
            .nodes
            .values()
            .any(|n| n.id != node.id && n.owner == node.owner && n.code == node.code);
        if duplicate {
            return Err(ChartError::DuplicateCode(node.code.clone()));
        }

        let Some(parent_id) = node.parent_id else {
            return Ok(());
        };
        if parent_id == node.id {
            return Err(ChartError::Cycle(node.code.clone()));
        }

        let parent = self
            .nodes
            .get(&parent_id)
            .ok_or(ChartError::UnknownParent(parent_id))?;

        if parent.is_analytic() {
            return Err(ChartError::AnalyticParent(parent.code.clone()));
        }

        let owner_ok = match (parent.owner, node.owner) {
            (Owner::Global, _) => true,
            (Owner::Tenant(p), Owner::Tenant(c)) => p == c,
            (Owner::Tenant(_), Owner::Global) => false,
        };
        if !owner_ok {
            return Err(ChartError::OwnerMismatch {
                code: node.code.clone(),
                parent: parent.code.clone(),
            });
        }

        if !parent.same_nature(node) {
            return Err(ChartError::SignMismatch {
                code: node.code.clone(),
                parent: parent.code.clone(),
            });
        }

        Ok(())
    }

    /// Walk up from `start`; true when `target` is met or the walk loops.
    fn path_reaches(&self, start: ChartAccountId, target: ChartAccountId) -> bool {
        let mut visited = HashSet::new();
        let mut cursor = Some(start);

        while let Some(current) = cursor {
            if current == target || !visited.insert(current) {
                return true;
            }
            cursor = self.nodes.get(&current).and_then(|n| n.parent_id);
        }

        false
    }

    fn has_cycle_from(&self, start: ChartAccountId) -> bool {
        let mut visited = HashSet::new();
        let mut cursor = Some(start);

        while let Some(current) = cursor {
            if !visited.insert(current) {
                return true;
            }
            cursor = self.nodes.get(&current).and_then(|n| n.parent_id);
        }

        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::{PlanType, RevenueExpense};

    fn synthetic(owner: Owner, code: &str, kind: RevenueExpense) -> ChartAccount {
        ChartAccount::new(owner, code, code, PlanType::Synthetic, kind)
    }

    fn analytic(owner: Owner, code: &str, kind: RevenueExpense) -> ChartAccount {
        ChartAccount::new(owner, code, code, PlanType::Analytic, kind)
    }

    #[test]
    fn builds_a_valid_tree() {
        let root = synthetic(Owner::Global, "3", RevenueExpense::Revenue);
        let leaf = analytic(Owner::Global, "3.1", RevenueExpense::Revenue).with_parent(root.id);

        let mut chart = ChartOfAccounts::new();
        chart.upsert(root.clone(), false).unwrap();
        chart.upsert(leaf.clone(), false).unwrap();

        assert_eq!(chart.len(), 2);
        let view = chart.visible_to(TenantId::new());
        assert_eq!(view.parent(leaf.id).map(|p| p.id), Some(root.id));
    }

    #[test]
    fn rejects_reparenting_into_own_subtree() {
        let a = synthetic(Owner::Global, "4", RevenueExpense::Expense);
        let b = synthetic(Owner::Global, "4.1", RevenueExpense::Expense).with_parent(a.id);
        let c = synthetic(Owner::Global, "4.1.1", RevenueExpense::Expense).with_parent(b.id);

        let mut chart = ChartOfAccounts::new();
        chart.upsert(a.clone(), false).unwrap();
        chart.upsert(b, false).unwrap();
        chart.upsert(c.clone(), false).unwrap();

        let looped = a.with_parent(c.id);
        assert_eq!(chart.upsert(looped, false), Err(ChartError::Cycle("4".to_string())));
    }

    #[test]
    fn from_nodes_detects_existing_cycle() {
        let mut a = synthetic(Owner::Global, "1", RevenueExpense::Expense);
        let b = synthetic(Owner::Global, "2", RevenueExpense::Expense).with_parent(a.id);
        a.parent_id = Some(b.id);

        let err = ChartOfAccounts::from_nodes(vec![a, b]).unwrap_err();
        assert!(matches!(err, ChartError::Cycle(_)));
    }

    #[test]
    fn analytic_nodes_are_leaves() {
        let leaf = analytic(Owner::Global, "3.1", RevenueExpense::Revenue);
        let child = analytic(Owner::Global, "3.1.1", RevenueExpense::Revenue).with_parent(leaf.id);

        let mut chart = ChartOfAccounts::new();
        chart.upsert(leaf.clone(), false).unwrap();
        assert_eq!(
            chart.upsert(child, false),
            Err(ChartError::AnalyticParent("3.1".to_string()))
        );
    }

    #[test]
    fn child_must_follow_parent_sign_convention() {
        let root = synthetic(Owner::Global, "3", RevenueExpense::Revenue);
        let child = analytic(Owner::Global, "3.9", RevenueExpense::Expense).with_parent(root.id);

        let mut chart = ChartOfAccounts::new();
        chart.upsert(root, false).unwrap();
        assert!(matches!(
            chart.upsert(child, false),
            Err(ChartError::SignMismatch { .. })
        ));
    }

    #[test]
    fn tenant_node_cannot_hang_under_another_tenant() {
        let t1 = TenantId::new();
        let t2 = TenantId::new();
        let root = synthetic(Owner::Tenant(t1), "5", RevenueExpense::Expense);
        let child = analytic(Owner::Tenant(t2), "5.1", RevenueExpense::Expense).with_parent(root.id);
        let global_child = analytic(Owner::Global, "5.2", RevenueExpense::Expense).with_parent(root.id);

        let mut chart = ChartOfAccounts::new();
        chart.upsert(root, false).unwrap();
        assert!(matches!(chart.upsert(child, false), Err(ChartError::OwnerMismatch { .. })));
        assert!(matches!(chart.upsert(global_child, false), Err(ChartError::OwnerMismatch { .. })));
    }

    #[test]
    fn codes_are_unique_per_owner() {
        let tenant = TenantId::new();
        let mut chart = ChartOfAccounts::new();
        chart.upsert(synthetic(Owner::Global, "3", RevenueExpense::Revenue), false).unwrap();
        // Same code in another scope is fine.
        chart.upsert(synthetic(Owner::Tenant(tenant), "3", RevenueExpense::Revenue), false).unwrap();

        let dup = synthetic(Owner::Global, "3", RevenueExpense::Revenue);
        assert_eq!(chart.upsert(dup, false), Err(ChartError::DuplicateCode("3".to_string())));
    }

    #[test]
    fn synthetic_with_children_cannot_become_analytic() {
        let root = synthetic(Owner::Global, "4", RevenueExpense::Expense);
        let leaf = analytic(Owner::Global, "4.1", RevenueExpense::Expense).with_parent(root.id);

        let mut chart = ChartOfAccounts::new();
        chart.upsert(root.clone(), false).unwrap();
        chart.upsert(leaf, false).unwrap();

        let mut flipped = root;
        flipped.plan_type = PlanType::Analytic;
        assert_eq!(
            chart.upsert(flipped, false),
            Err(ChartError::AnalyticWithChildren("4".to_string()))
        );
    }

    #[test]
    fn parent_cannot_leave_its_children_on_the_other_side() {
        let root = synthetic(Owner::Global, "3", RevenueExpense::Revenue);
        let leaf = analytic(Owner::Global, "3.1", RevenueExpense::Revenue).with_parent(root.id);

        let mut chart = ChartOfAccounts::new();
        chart.upsert(root.clone(), false).unwrap();
        chart.upsert(leaf, false).unwrap();

        let mut flipped = root.clone();
        flipped.revenue_expense = RevenueExpense::Expense;
        assert_eq!(
            chart.upsert(flipped, false),
            Err(ChartError::ChildSignMismatch {
                code: "3".to_string(),
                child: "3.1".to_string(),
            })
        );

        let mut flipped_side = root;
        flipped_side.debit_credit = crate::account::DebitCredit::Debit;
        assert!(matches!(
            chart.upsert(flipped_side, false),
            Err(ChartError::ChildSignMismatch { .. })
        ));
    }

    #[test]
    fn nodes_in_use_keep_their_structure() {
        let root = synthetic(Owner::Global, "3", RevenueExpense::Revenue);
        let leaf = analytic(Owner::Global, "3.1", RevenueExpense::Revenue).with_parent(root.id);

        let mut chart = ChartOfAccounts::new();
        chart.upsert(root, false).unwrap();
        chart.upsert(leaf.clone(), false).unwrap();

        let mut renamed = leaf.clone();
        renamed.description = "Product sales".into();
        renamed.active = false;
        chart.upsert(renamed, true).unwrap();
        assert_eq!(chart.get(leaf.id).map(|n| n.description.as_str()), Some("Product sales"));

        let mut regrouped = leaf.clone();
        regrouped.plan_type = PlanType::Synthetic;
        assert_eq!(chart.upsert(regrouped.clone(), true), Err(ChartError::InUse("3.1".to_string())));
        chart.upsert(regrouped, false).unwrap();

        let mut moved = leaf;
        moved.parent_id = None;
        assert_eq!(chart.upsert(moved, true), Err(ChartError::InUse("3.1".to_string())));
    }
}
