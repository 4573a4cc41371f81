//! Tenant-resolved view of the chart of accounts.
//!
//! Computed once per request: the tenant's own nodes plus global nodes, with a children
//! index ordered by code. Engines only ever see this view, never raw ownership.

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use cashbook_core::{ChartAccountId, TenantId};

use crate::account::ChartAccount;

/// Why a chart node cannot receive a split.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PostingTargetError {
    #[error("chart account {0} is not visible to this tenant")]
    NotVisible(ChartAccountId),

    #[error("chart account '{0}' is inactive")]
    Inactive(String),

    #[error("chart account '{0}' is synthetic and cannot receive postings")]
    Synthetic(String),

    #[error("chart account '{0}' is aggregation-only")]
    SuperOnly(String),
}

#[derive(Debug, Clone)]
pub struct VisibleChart {
    tenant_id: TenantId,
    nodes: HashMap<ChartAccountId, ChartAccount>,
    children: HashMap<ChartAccountId, Vec<ChartAccountId>>,
    roots: Vec<ChartAccountId>,
}

impl VisibleChart {
    /// Build the view. Nodes not visible to `tenant_id` are dropped; a node whose parent is
    /// absent from the view is treated as a root.
    pub fn new(tenant_id: TenantId, nodes: impl IntoIterator<Item = ChartAccount>) -> Self {
        let nodes: HashMap<ChartAccountId, ChartAccount> = nodes
            .into_iter()
            .filter(|n| n.owner.is_visible_to(tenant_id))
            .map(|n| (n.id, n))
            .collect();

        let mut children: HashMap<ChartAccountId, Vec<ChartAccountId>> = HashMap::new();
        let mut roots = Vec::new();

        for node in nodes.values() {
            match node.parent_id.filter(|p| nodes.contains_key(p) && *p != node.id) {
                Some(parent) => children.entry(parent).or_default().push(node.id),
                None => roots.push(node.id),
            }
        }

        let by_code = |a: &ChartAccountId, b: &ChartAccountId| {
            let (na, nb) = (&nodes[a], &nodes[b]);
            na.code.cmp(&nb.code).then_with(|| a.cmp(b))
        };
        roots.sort_by(by_code);
        for list in children.values_mut() {
            list.sort_by(by_code);
        }

        Self {
            tenant_id,
            nodes,
            children,
            roots,
        }
    }

    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
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

    pub fn roots(&self) -> &[ChartAccountId] {
        &self.roots
    }

    pub fn children(&self, id: ChartAccountId) -> &[ChartAccountId] {
        self.children.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Parent within this view, if any.
    pub fn parent(&self, id: ChartAccountId) -> Option<&ChartAccount> {
        self.nodes
            .get(&id)
            .and_then(|n| n.parent_id)
            .filter(|p| *p != id)
            .and_then(|p| self.nodes.get(&p))
    }

    /// Check that `id` is a valid split target for this tenant.
    pub fn postable(&self, id: ChartAccountId) -> Result<&ChartAccount, PostingTargetError> {
        let node = self.nodes.get(&id).ok_or(PostingTargetError::NotVisible(id))?;
        if !node.active {
            return Err(PostingTargetError::Inactive(node.code.clone()));
        }
        if !node.is_analytic() {
            return Err(PostingTargetError::Synthetic(node.code.clone()));
        }
        if node.is_super {
            return Err(PostingTargetError::SuperOnly(node.code.clone()));
        }
        Ok(node)
    }

    /// All nodes in tree pre-order (roots and siblings ordered by code).
    pub fn pre_order(&self) -> Vec<&ChartAccount> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut visited = HashSet::new();
        let mut stack: Vec<ChartAccountId> = self.roots.iter().rev().copied().collect();

        while let Some(id) = stack.pop() {
            if !visited.insert(id) {
                continue;
            }
            if let Some(node) = self.nodes.get(&id) {
                out.push(node);
            }
            stack.extend(self.children(id).iter().rev().copied());
        }

        out
    }

    /// A copy of the view without the nodes matching `hide` and everything below them.
    pub fn prune(&self, hide: impl Fn(&ChartAccount) -> bool) -> VisibleChart {
        let mut kept = Vec::with_capacity(self.nodes.len());
        let mut visited = HashSet::new();
        let mut stack: Vec<ChartAccountId> = self.roots.clone();

        while let Some(id) = stack.pop() {
            if !visited.insert(id) {
                continue;
            }
            let Some(node) = self.nodes.get(&id) else {
                continue;
            };
            if hide(node) {
                continue;
            }
            kept.push(node.clone());
            stack.extend(self.children(id).iter().copied());
        }

        VisibleChart::new(self.tenant_id, kept)
    }
}
