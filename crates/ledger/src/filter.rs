use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use cashbook_core::{AccountId, DomainError, DomainResult};

use crate::entry::{LedgerEntry, Operation};

/// Inclusive issue-date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> DomainResult<Self> {
        if from > to {
            return Err(DomainError::validation(format!(
                "date range start {from} is after its end {to}"
            )));
        }
        Ok(Self { from, to })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }
}

/// Listing filter. The tenant is not part of it: it always comes from the actor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntryFilter {
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub account_id: Option<AccountId>,
    pub operation: Option<Operation>,
    pub confirmed: Option<bool>,
    pub include_deleted: bool,
}

impl EntryFilter {
    pub fn matches(&self, entry: &LedgerEntry) -> bool {
        if entry.is_deleted() && !self.include_deleted {
            return false;
        }
        if self.date_from.is_some_and(|d| entry.issue_date < d) {
            return false;
        }
        if self.date_to.is_some_and(|d| entry.issue_date > d) {
            return false;
        }
        if self.account_id.is_some_and(|a| entry.account_id != a) {
            return false;
        }
        if self.operation.is_some_and(|op| entry.operation != op) {
            return false;
        }
        if self.confirmed.is_some_and(|c| entry.confirmed != c) {
            return false;
        }
        true
    }
}

/// Sort entries into statement order: issue date ascending, then code ascending.
pub fn sort_entries(entries: &mut [LedgerEntry]) {
    entries.sort_by_key(LedgerEntry::ordering_key);
}

#[cfg(test)]
mod tests {
    use super::*;
    use cashbook_core::{Money, TenantId};
    use chrono::Utc;

    use crate::entry::{DocumentInfo, EntryDraft};

    fn entry(day: u32, code: u64, operation: Operation, confirmed: bool) -> LedgerEntry {
        let draft = EntryDraft {
            issue_date: NaiveDate::from_ymd_opt(2026, 3, day).unwrap(),
            payment_date: None,
            account_id: AccountId::new(),
            document: DocumentInfo::default(),
            amount: Money::from_cents(100),
            operation,
            history: None,
            confirmed: None,
            print_on_close: false,
            splits: vec![],
        };
        LedgerEntry::from_draft(TenantId::new(), code, draft, confirmed, Utc::now())
    }

    #[test]
    fn range_rejects_inverted_bounds() {
        let a = NaiveDate::from_ymd_opt(2026, 2, 1).unwrap();
        let b = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        assert!(DateRange::new(a, b).is_err());
        assert!(DateRange::new(b, a).unwrap().contains(a));
    }

    #[test]
    fn deleted_entries_need_explicit_inclusion() {
        let mut e = entry(10, 1, Operation::Credit, true);
        e.deleted_at = Some(Utc::now());

        assert!(!EntryFilter::default().matches(&e));
        let with_deleted = EntryFilter {
            include_deleted: true,
            ..EntryFilter::default()
        };
        assert!(with_deleted.matches(&e));
    }

    #[test]
    fn filters_combine() {
        let e = entry(10, 1, Operation::Debit, false);
        let filter = EntryFilter {
            date_from: NaiveDate::from_ymd_opt(2026, 3, 1),
            date_to: NaiveDate::from_ymd_opt(2026, 3, 10),
            operation: Some(Operation::Debit),
            confirmed: Some(false),
            ..EntryFilter::default()
        };
        assert!(filter.matches(&e));

        let other_account = EntryFilter {
            account_id: Some(AccountId::new()),
            ..EntryFilter::default()
        };
        assert!(!other_account.matches(&e));
    }

    #[test]
    fn same_day_entries_sort_by_code() {
        let mut entries = vec![
            entry(5, 11, Operation::Credit, true),
            entry(5, 10, Operation::Credit, true),
            entry(4, 12, Operation::Credit, true),
        ];
        sort_entries(&mut entries);
        let codes: Vec<u64> = entries.iter().map(|e| e.code).collect();
        assert_eq!(codes, vec![12, 10, 11]);
    }
}
