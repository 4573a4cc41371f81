use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use cashbook_core::{AccountId, ChartAccountId, CostCenterId, Entity, EntryId, Money, SplitId, TenantId};

/// Direction of an entry against its cash account.
///
/// Credits are money coming in and increase the account balance; debits are money going
/// out and decrease it. Statements and the DRE both rely on [`Operation::signed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Debit,
    Credit,
}

impl Operation {
    /// Signed cash effect of `amount` under this operation.
    pub fn signed(self, amount: Money) -> Money {
        match self {
            Operation::Credit => amount,
            Operation::Debit => -amount,
        }
    }
}

/// Optional document metadata carried by an entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentInfo {
    pub document_type: Option<String>,
    pub document_number: Option<String>,
    pub check_number: Option<String>,
    /// Counterparty entity code (supplier/customer), owned by the registration layer.
    pub entity_code: Option<String>,
}

/// One analytic slice of an entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSplit {
    pub id: SplitId,
    pub entry_id: EntryId,
    pub chart_account_id: ChartAccountId,
    pub cost_center_id: Option<CostCenterId>,
    pub amount: Money,
}

/// The atomic postable unit: an entry and its full split set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: EntryId,
    pub tenant_id: TenantId,
    /// Per-tenant sequence number, assigned on first save.
    pub code: u64,
    pub issue_date: NaiveDate,
    pub payment_date: Option<NaiveDate>,
    pub account_id: AccountId,
    pub document: DocumentInfo,
    pub amount: Money,
    pub operation: Operation,
    pub history: Option<String>,
    pub confirmed: bool,
    pub print_on_close: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
    /// Optimistic concurrency version, bumped by every mutation.
    pub version: u64,
    pub splits: Vec<LedgerSplit>,
}

impl LedgerEntry {
    /// Materialize a validated draft as a new entry (version 1).
    pub fn from_draft(
        tenant_id: TenantId,
        code: u64,
        draft: EntryDraft,
        confirmed: bool,
        now: DateTime<Utc>,
    ) -> Self {
        let id = EntryId::new();
        let splits = draft.build_splits(id);

        Self {
            id,
            tenant_id,
            code,
            issue_date: draft.issue_date,
            payment_date: draft.payment_date,
            account_id: draft.account_id,
            document: draft.document,
            amount: draft.amount,
            operation: draft.operation,
            history: draft.history,
            confirmed,
            print_on_close: draft.print_on_close,
            created_at: now,
            updated_at: now,
            deleted_at: None,
            version: 1,
            splits,
        }
    }

    /// Full replace from a validated draft. Identity, code and creation time survive;
    /// the split set is rebuilt from scratch.
    pub fn replaced_by(&self, draft: EntryDraft, confirmed: bool, now: DateTime<Utc>) -> Self {
        let splits = draft.build_splits(self.id);

        Self {
            id: self.id,
            tenant_id: self.tenant_id,
            code: self.code,
            issue_date: draft.issue_date,
            payment_date: draft.payment_date,
            account_id: draft.account_id,
            document: draft.document,
            amount: draft.amount,
            operation: draft.operation,
            history: draft.history,
            confirmed,
            print_on_close: draft.print_on_close,
            created_at: self.created_at,
            updated_at: now,
            deleted_at: None,
            version: self.version + 1,
            splits,
        }
    }

    /// Sum of the split amounts; `None` when it does not fit in an `i64`.
    pub fn split_total(&self) -> Option<Money> {
        Money::checked_sum(self.splits.iter().map(|s| s.amount))
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Signed cash effect of the entry (credit positive).
    pub fn signed_amount(&self) -> Money {
        self.operation.signed(self.amount)
    }

    /// Statement ordering key: issue date, then code.
    pub fn ordering_key(&self) -> (NaiveDate, u64) {
        (self.issue_date, self.code)
    }
}

impl Entity for LedgerEntry {
    const KIND: &'static str = "LedgerEntry";
    type Id = EntryId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Caller input for a split.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitDraft {
    pub chart_account_id: ChartAccountId,
    pub cost_center_id: Option<CostCenterId>,
    pub amount: Money,
}

/// Caller input for `post` and `update`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryDraft {
    pub issue_date: NaiveDate,
    pub payment_date: Option<NaiveDate>,
    pub account_id: AccountId,
    #[serde(default)]
    pub document: DocumentInfo,
    pub amount: Money,
    pub operation: Operation,
    pub history: Option<String>,
    /// `None` defers to the account's `default_confirmed` flag.
    pub confirmed: Option<bool>,
    #[serde(default)]
    pub print_on_close: bool,
    pub splits: Vec<SplitDraft>,
}

impl EntryDraft {
    /// Sum of the split amounts; `None` when it does not fit in an `i64`.
    pub fn split_total(&self) -> Option<Money> {
        Money::checked_sum(self.splits.iter().map(|s| s.amount))
    }

    fn build_splits(&self, entry_id: EntryId) -> Vec<LedgerSplit> {
        self.splits
            .iter()
            .map(|s| LedgerSplit {
                id: SplitId::new(),
                entry_id,
                chart_account_id: s.chart_account_id,
                cost_center_id: s.cost_center_id,
                amount: s.amount,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(amount: i64, splits: &[i64]) -> EntryDraft {
        EntryDraft {
            issue_date: NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
            payment_date: None,
            account_id: AccountId::new(),
            document: DocumentInfo::default(),
            amount: Money::from_cents(amount),
            operation: Operation::Credit,
            history: Some("sale".into()),
            confirmed: None,
            print_on_close: false,
            splits: splits
                .iter()
                .map(|c| SplitDraft {
                    chart_account_id: ChartAccountId::new(),
                    cost_center_id: None,
                    amount: Money::from_cents(*c),
                })
                .collect(),
        }
    }

    #[test]
    fn credit_adds_and_debit_subtracts() {
        let amount = Money::from_cents(1_000);
        assert_eq!(Operation::Credit.signed(amount), amount);
        assert_eq!(Operation::Debit.signed(amount), -amount);
    }

    #[test]
    fn replace_rebuilds_splits_and_keeps_identity() {
        let now = Utc::now();
        let entry = LedgerEntry::from_draft(TenantId::new(), 7, draft(1_000, &[600, 400]), true, now);
        assert_eq!(entry.version, 1);
        assert_eq!(entry.split_total(), Some(Money::from_cents(1_000)));
        assert!(entry.splits.iter().all(|s| s.entry_id == entry.id));

        let later = now + chrono::Duration::minutes(5);
        let edited = entry.replaced_by(draft(500, &[500]), false, later);

        assert_eq!(edited.id, entry.id);
        assert_eq!(edited.code, 7);
        assert_eq!(edited.created_at, now);
        assert_eq!(edited.updated_at, later);
        assert_eq!(edited.version, 2);
        assert_eq!(edited.splits.len(), 1);
        assert_ne!(edited.splits[0].id, entry.splits[0].id);
    }
}
