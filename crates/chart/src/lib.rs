//! Chart of accounts: the hierarchical classification tree that splits are tagged against
//! and that the DRE report aggregates through.
//!
//! Pure domain logic only: no IO, no persistence concerns.

pub mod account;
pub mod tree;
pub mod visible;

pub use account::{
    ChartAccount, CostExpense, DebitCredit, DreFlags, FixedVariable, Owner, PlanType,
    RevenueExpense,
};
pub use tree::{ChartError, ChartOfAccounts};
pub use visible::{PostingTargetError, VisibleChart};
