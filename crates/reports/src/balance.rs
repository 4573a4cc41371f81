//! Running-balance bank statement.
//!
//! Credits are inputs and raise the balance, debits are outputs and lower it. Deleted
//! entries may be shown but never move a balance or a total.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use cashbook_core::{AccountId, EntryId, Money};
use cashbook_ledger::{DateRange, DocumentInfo, LedgerEntry, Operation};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatementLine {
    pub entry_id: EntryId,
    pub code: u64,
    pub issue_date: NaiveDate,
    pub payment_date: Option<NaiveDate>,
    pub account_id: AccountId,
    pub operation: Operation,
    pub amount: Money,
    pub history: Option<String>,
    pub document: DocumentInfo,
    pub confirmed: bool,
    pub deleted: bool,
    pub balance_after: Money,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatementTotals {
    pub opening_balance: Money,
    pub inputs: Money,
    pub outputs: Money,
    pub closing_balance: Money,
    pub to_confirm_qty: u64,
    pub to_confirm_value: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Statement {
    pub range: DateRange,
    pub lines: Vec<StatementLine>,
    pub totals: StatementTotals,
}

/// Build the statement for `range` from entries already scoped by tenant, account and
/// confirmation state. Entries after the range are ignored; entries before it only feed
/// the opening balance.
pub fn statement(entries: &[LedgerEntry], range: DateRange) -> Statement {
    let mut ordered: Vec<&LedgerEntry> = entries
        .iter()
        .filter(|e| e.issue_date <= range.to)
        .collect();
    ordered.sort_by_key(|e| e.ordering_key());

    let mut totals = StatementTotals::default();
    let mut lines = Vec::new();
    let mut running = Money::ZERO;

    for entry in ordered {
        let deleted = entry.is_deleted();

        if entry.issue_date < range.from {
            if !deleted {
                running += entry.signed_amount();
            }
            continue;
        }

        if lines.is_empty() {
            totals.opening_balance = running;
        }

        if !deleted {
            running += entry.signed_amount();
            match entry.operation {
                Operation::Credit => totals.inputs += entry.amount,
                Operation::Debit => totals.outputs += entry.amount,
            }
            if !entry.confirmed {
                totals.to_confirm_qty += 1;
                totals.to_confirm_value += entry.signed_amount();
            }
        }

        lines.push(StatementLine {
            entry_id: entry.id,
            code: entry.code,
            issue_date: entry.issue_date,
            payment_date: entry.payment_date,
            account_id: entry.account_id,
            operation: entry.operation,
            amount: entry.amount,
            history: entry.history.clone(),
            document: entry.document.clone(),
            confirmed: entry.confirmed,
            deleted,
            balance_after: running,
        });
    }

    if lines.is_empty() {
        totals.opening_balance = running;
    }
    totals.closing_balance = running;

    Statement {
        range,
        lines,
        totals,
    }
}

/// Balance of one cash account at a date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AccountBalance {
    pub account_id: AccountId,
    pub balance: Money,
    /// Same balance counting confirmed entries only.
    pub confirmed_balance: Money,
    pub last_movement: Option<NaiveDate>,
}

/// Per-account balances of non-deleted entries issued on or before `as_of`, ordered by
/// account id.
pub fn account_balances(entries: &[LedgerEntry], as_of: NaiveDate) -> Vec<AccountBalance> {
    let mut by_account: BTreeMap<AccountId, AccountBalance> = BTreeMap::new();

    for entry in entries
        .iter()
        .filter(|e| !e.is_deleted() && e.issue_date <= as_of)
    {
        let slot = by_account
            .entry(entry.account_id)
            .or_insert_with(|| AccountBalance {
                account_id: entry.account_id,
                balance: Money::ZERO,
                confirmed_balance: Money::ZERO,
                last_movement: None,
            });

        slot.balance += entry.signed_amount();
        if entry.confirmed {
            slot.confirmed_balance += entry.signed_amount();
        }
        slot.last_movement = slot.last_movement.max(Some(entry.issue_date));
    }

    by_account.into_values().collect()
}
