//! Read-side reports derived from the ledger.
//!
//! Both engines are pure functions over entries the caller already scoped to one tenant:
//! they never fetch, filter by tenant, or mutate anything.

pub mod balance;
pub mod dre;

pub use balance::{AccountBalance, Statement, StatementLine, StatementTotals, account_balances, statement};
pub use dre::{DreLine, DreOptions, DreReport, DreSummary, LineKind, Section, run};
