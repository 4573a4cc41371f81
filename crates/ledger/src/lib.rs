//! Ledger module: cash accounts, entries and their analytic splits.
//!
//! Pure domain logic only: no IO, no HTTP, no persistence concerns. The pre-commit
//! checks in [`posting`] are the single source of truth for whether an entry may be
//! stored or confirmed.

pub mod account;
pub mod actor;
pub mod entry;
pub mod filter;
pub mod posting;

pub use account::{Account, CostCenter};
pub use actor::Actor;
pub use entry::{DocumentInfo, EntryDraft, LedgerEntry, LedgerSplit, Operation, SplitDraft};
pub use filter::{DateRange, EntryFilter, sort_entries};
pub use posting::{PostingCheck, PostingRefs, Violation, check_confirmation, check_draft, check_version};
