//! Pre-commit checks for ledger mutations.
//!
//! Each check returns a [`PostingCheck`] instead of failing fast, so a rejected draft
//! reports every problem at once and callers can branch on the outcome without treating
//! expected rejections as errors.

use std::collections::HashMap;

use thiserror::Error;

use cashbook_chart::{PostingTargetError, VisibleChart};
use cashbook_core::{CostCenterId, DomainError, DomainResult, ExpectedVersion, Money};

use crate::account::{Account, CostCenter};
use crate::entry::{EntryDraft, LedgerEntry};

/// A single reason a draft or confirmation was rejected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Violation {
    #[error("amount must be positive (got {0})")]
    NonPositiveAmount(Money),

    #[error("entry must have at least one split")]
    NoSplits,

    #[error("split #{index}: amount must be positive (got {amount})")]
    NonPositiveSplit { index: usize, amount: Money },

    #[error("account '{0}' is inactive")]
    InactiveAccount(String),

    #[error("split #{index}: {source}")]
    ChartTarget {
        index: usize,
        source: PostingTargetError,
    },

    #[error("split #{index}: cost center {id} does not exist for this tenant")]
    UnknownCostCenter { index: usize, id: CostCenterId },

    #[error("split #{index}: cost center '{code}' is inactive")]
    InactiveCostCenter { index: usize, code: String },

    #[error("amount {0} exceeds the per-entry limit of {max}", max = Money::MAX_AMOUNT)]
    AmountOutOfRange(Money),

    #[error("split #{index}: amount {amount} exceeds the per-entry limit of {max}", max = Money::MAX_AMOUNT)]
    SplitOutOfRange { index: usize, amount: Money },

    #[error("split amounts overflow when added together")]
    SplitSumOverflow,

    #[error("confirmed entries need splits summing to {amount} (splits sum to {split_total})")]
    SplitSumMismatch { amount: Money, split_total: Money },
}

/// Outcome of a pre-commit check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostingCheck {
    Accepted,
    Invalid(Vec<Violation>),
    Conflict { expected: ExpectedVersion, actual: u64 },
}

impl PostingCheck {
    fn from_violations(violations: Vec<Violation>) -> Self {
        if violations.is_empty() {
            PostingCheck::Accepted
        } else {
            PostingCheck::Invalid(violations)
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, PostingCheck::Accepted)
    }

    pub fn into_result(self) -> DomainResult<()> {
        match self {
            PostingCheck::Accepted => Ok(()),
            PostingCheck::Invalid(violations) => Err(DomainError::validation(
                violations
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("; "),
            )),
            PostingCheck::Conflict { expected, actual } => Err(DomainError::conflict(format!(
                "entry changed concurrently (expected {expected:?}, current version {actual})"
            ))),
        }
    }
}

/// Registration data a draft is checked against, already resolved for the tenant.
#[derive(Debug, Clone, Copy)]
pub struct PostingRefs<'a> {
    pub account: &'a Account,
    pub chart: &'a VisibleChart,
    /// The tenant's cost centers referenced by the draft (missing ids are unknown).
    pub cost_centers: &'a HashMap<CostCenterId, CostCenter>,
}

/// Validate a draft for `post`/`update`. `confirmed` is the effective confirmation state
/// (draft value or the account default).
pub fn check_draft(draft: &EntryDraft, confirmed: bool, refs: PostingRefs<'_>) -> PostingCheck {
    let mut violations = Vec::new();

    if !draft.amount.is_positive() {
        violations.push(Violation::NonPositiveAmount(draft.amount));
    } else if !draft.amount.is_within_limit() {
        violations.push(Violation::AmountOutOfRange(draft.amount));
    }
    if !refs.account.active {
        violations.push(Violation::InactiveAccount(refs.account.code.clone()));
    }
    if draft.splits.is_empty() {
        violations.push(Violation::NoSplits);
    }

    for (index, split) in draft.splits.iter().enumerate() {
        if !split.amount.is_positive() {
            violations.push(Violation::NonPositiveSplit {
                index,
                amount: split.amount,
            });
        } else if !split.amount.is_within_limit() {
            violations.push(Violation::SplitOutOfRange {
                index,
                amount: split.amount,
            });
        }

        if let Err(source) = refs.chart.postable(split.chart_account_id) {
            violations.push(Violation::ChartTarget { index, source });
        }

        if let Some(id) = split.cost_center_id {
            match refs.cost_centers.get(&id) {
                Some(cc) if cc.tenant_id != refs.account.tenant_id => {
                    violations.push(Violation::UnknownCostCenter { index, id });
                }
                Some(cc) if !cc.active => {
                    violations.push(Violation::InactiveCostCenter {
                        index,
                        code: cc.code.clone(),
                    });
                }
                Some(_) => {}
                None => violations.push(Violation::UnknownCostCenter { index, id }),
            }
        }
    }

    if confirmed && !draft.splits.is_empty() {
        match draft.split_total() {
            Some(split_total) if split_total == draft.amount => {}
            Some(split_total) => violations.push(Violation::SplitSumMismatch {
                amount: draft.amount,
                split_total,
            }),
            None => violations.push(Violation::SplitSumOverflow),
        }
    }

    PostingCheck::from_violations(violations)
}

/// Validate that a stored entry may be confirmed.
pub fn check_confirmation(entry: &LedgerEntry) -> PostingCheck {
    match entry.split_total() {
        Some(split_total) if split_total == entry.amount => PostingCheck::Accepted,
        Some(split_total) => PostingCheck::Invalid(vec![Violation::SplitSumMismatch {
            amount: entry.amount,
            split_total,
        }]),
        None => PostingCheck::Invalid(vec![Violation::SplitSumOverflow]),
    }
}

/// Optimistic concurrency check against the stored version.
pub fn check_version(expected: ExpectedVersion, actual: u64) -> PostingCheck {
    if expected.matches(actual) {
        PostingCheck::Accepted
    } else {
        PostingCheck::Conflict { expected, actual }
    }
}
