use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;

use cashbook_chart::{
    ChartAccount, CostExpense, DebitCredit, DreFlags, FixedVariable, Owner, PlanType, RevenueExpense,
};
use cashbook_core::{AccountId, ChartAccountId, CostCenterId, DomainResult, Money, TenantId};
use cashbook_ledger::{Account, CostCenter, DocumentInfo, EntryDraft, LedgerEntry, Operation, SplitDraft};
use cashbook_reports::{AccountBalance, DreReport, Statement};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct SplitRequest {
    pub chart_account_id: ChartAccountId,
    pub cost_center_id: Option<CostCenterId>,
    pub amount: Decimal,
}

/// Body of `POST /entries` and `PUT /entries/:id`. `version` is only read by `PUT`.
#[derive(Debug, Deserialize)]
pub struct EntryRequest {
    pub issue_date: NaiveDate,
    pub payment_date: Option<NaiveDate>,
    pub account_id: AccountId,
    #[serde(default)]
    pub document: DocumentInfo,
    pub amount: Decimal,
    pub operation: Operation,
    pub history: Option<String>,
    pub confirmed: Option<bool>,
    #[serde(default)]
    pub print_on_close: bool,
    #[serde(default)]
    pub splits: Vec<SplitRequest>,
    pub version: Option<u64>,
}

impl EntryRequest {
    pub fn into_draft(self) -> DomainResult<EntryDraft> {
        let splits = self
            .splits
            .into_iter()
            .map(|s| {
                Ok(SplitDraft {
                    chart_account_id: s.chart_account_id,
                    cost_center_id: s.cost_center_id,
                    amount: Money::from_decimal(s.amount)?,
                })
            })
            .collect::<DomainResult<Vec<_>>>()?;

        Ok(EntryDraft {
            issue_date: self.issue_date,
            payment_date: self.payment_date,
            account_id: self.account_id,
            document: self.document,
            amount: Money::from_decimal(self.amount)?,
            operation: self.operation,
            history: self.history,
            confirmed: self.confirmed,
            print_on_close: self.print_on_close,
            splits,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct ConfirmRequest {
    pub confirmed: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ListEntriesQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub account_id: Option<String>,
    pub operation: Option<Operation>,
    pub confirmed: Option<bool>,
    pub include_deleted: bool,
}

#[derive(Debug, Deserialize)]
pub struct StatementParams {
    pub account_id: String,
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub confirmed: Option<bool>,
    #[serde(default)]
    pub include_deleted: bool,
}

#[derive(Debug, Deserialize)]
pub struct DreParams {
    pub from: NaiveDate,
    pub to: NaiveDate,
    #[serde(default)]
    pub include_empty: bool,
}

#[derive(Debug, Deserialize)]
pub struct BalancesParams {
    pub as_of: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct CreateAccountRequest {
    pub code: String,
    pub description: String,
    #[serde(default)]
    pub super_only: bool,
    #[serde(default)]
    pub default_confirmed: bool,
    pub use_in_cash_flow: Option<bool>,
}

impl CreateAccountRequest {
    pub fn into_account(self, tenant_id: TenantId) -> Account {
        let mut account = Account::new(tenant_id, self.code, self.description);
        account.super_only = self.super_only;
        account.default_confirmed = self.default_confirmed;
        if let Some(v) = self.use_in_cash_flow {
            account.use_in_cash_flow = v;
        }
        account
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateCostCenterRequest {
    pub code: String,
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateChartAccountRequest {
    pub code: String,
    pub description: String,
    pub plan_type: PlanType,
    pub revenue_expense: RevenueExpense,
    pub parent_id: Option<ChartAccountId>,
    pub debit_credit: Option<DebitCredit>,
    pub fixed_variable: Option<FixedVariable>,
    pub cost_expense: Option<CostExpense>,
    #[serde(default)]
    pub is_super: bool,
    #[serde(default)]
    pub flags: DreFlags,
}

impl CreateChartAccountRequest {
    /// A tenant-owned node; global nodes are not writable over HTTP.
    pub fn into_chart_account(self, tenant_id: TenantId) -> ChartAccount {
        let mut node = ChartAccount::new(
            Owner::Tenant(tenant_id),
            self.code,
            self.description,
            self.plan_type,
            self.revenue_expense,
        )
        .with_flags(self.flags);
        node.parent_id = self.parent_id;
        node.is_super = self.is_super;
        if let Some(v) = self.debit_credit {
            node.debit_credit = v;
        }
        if let Some(v) = self.fixed_variable {
            node.fixed_variable = v;
        }
        if let Some(v) = self.cost_expense {
            node.cost_expense = v;
        }
        node
    }
}

// -------------------------
// JSON mapping helpers
// -------------------------

fn amount(m: Money) -> Decimal {
    m.to_decimal()
}

pub fn entry_to_json(e: &LedgerEntry) -> serde_json::Value {
    serde_json::json!({
        "id": e.id.to_string(),
        "code": e.code,
        "issue_date": e.issue_date,
        "payment_date": e.payment_date,
        "account_id": e.account_id.to_string(),
        "document": e.document,
        "amount": amount(e.amount),
        "operation": e.operation,
        "history": e.history,
        "confirmed": e.confirmed,
        "print_on_close": e.print_on_close,
        "deleted": e.is_deleted(),
        "version": e.version,
        "created_at": e.created_at.to_rfc3339(),
        "updated_at": e.updated_at.to_rfc3339(),
        "splits": e.splits.iter().map(|s| serde_json::json!({
            "id": s.id.to_string(),
            "chart_account_id": s.chart_account_id.to_string(),
            "cost_center_id": s.cost_center_id.map(|c| c.to_string()),
            "amount": amount(s.amount),
        })).collect::<Vec<_>>(),
    })
}

pub fn statement_to_json(st: &Statement) -> serde_json::Value {
    let t = &st.totals;
    serde_json::json!({
        "from": st.range.from,
        "to": st.range.to,
        "lines": st.lines.iter().map(|l| serde_json::json!({
            "entry_id": l.entry_id.to_string(),
            "code": l.code,
            "issue_date": l.issue_date,
            "payment_date": l.payment_date,
            "operation": l.operation,
            "amount": amount(l.amount),
            "history": l.history,
            "document": l.document,
            "confirmed": l.confirmed,
            "deleted": l.deleted,
            "balance": amount(l.balance_after),
        })).collect::<Vec<_>>(),
        "totals": {
            "opening_balance": amount(t.opening_balance),
            "inputs": amount(t.inputs),
            "outputs": amount(t.outputs),
            "closing_balance": amount(t.closing_balance),
            "to_confirm_qty": t.to_confirm_qty,
            "to_confirm_value": amount(t.to_confirm_value),
        },
    })
}

pub fn dre_to_json(r: &DreReport) -> serde_json::Value {
    serde_json::json!({
        "from": r.range.from,
        "to": r.range.to,
        "lines": r.lines.iter().map(|l| serde_json::json!({
            "kind": l.kind,
            "section": l.section,
            "chart_account_id": l.chart_account_id.map(|c| c.to_string()),
            "code": l.code,
            "description": l.description,
            "amount": amount(l.amount),
            "revenue_share": l.revenue_share,
            "depth": l.depth,
        })).collect::<Vec<_>>(),
        "summary": {
            "gross_revenue": amount(r.summary.gross_revenue),
            "total_expenses": amount(r.summary.total_expenses),
            "net_profit": amount(r.summary.net_profit),
            "margin": r.summary.margin,
        },
    })
}

pub fn balance_to_json(b: &AccountBalance) -> serde_json::Value {
    serde_json::json!({
        "account_id": b.account_id.to_string(),
        "balance": amount(b.balance),
        "confirmed_balance": amount(b.confirmed_balance),
        "last_movement": b.last_movement,
    })
}

pub fn account_to_json(a: &Account) -> serde_json::Value {
    serde_json::json!({
        "id": a.id.to_string(),
        "code": a.code,
        "description": a.description,
        "active": a.active,
        "use_in_cash_flow": a.use_in_cash_flow,
        "super_only": a.super_only,
        "default_confirmed": a.default_confirmed,
    })
}

pub fn cost_center_to_json(c: &CostCenter) -> serde_json::Value {
    serde_json::json!({
        "id": c.id.to_string(),
        "code": c.code,
        "description": c.description,
        "active": c.active,
    })
}

pub fn chart_account_to_json(n: &ChartAccount) -> serde_json::Value {
    serde_json::json!({
        "id": n.id.to_string(),
        "owner": n.owner,
        "code": n.code,
        "description": n.description,
        "active": n.active,
        "is_super": n.is_super,
        "plan_type": n.plan_type,
        "parent_id": n.parent_id.map(|p| p.to_string()),
        "revenue_expense": n.revenue_expense,
        "debit_credit": n.debit_credit,
        "fixed_variable": n.fixed_variable,
        "cost_expense": n.cost_expense,
        "flags": n.flags,
    })
}
