//! DRE (income statement) aggregated through the chart of accounts.
//!
//! Only confirmed, non-deleted entries issued inside the range count. Every value is
//! expressed on the natural side of the section it lands in: revenue-like sections (gross
//! revenue, deductions, other financial income) show inflows as positive amounts, the
//! expense-like ones show outflows as positive amounts. For a node whose own
//! `debit_credit` matches its section, that is its natural sign; a refund shows as a
//! negative amount.
//!
//! Nodes are grouped into fixed sections. Inside a section the chart hierarchy is kept, but
//! a parent link that crosses sections is cut: the child becomes a root of its own section.

use std::collections::{HashMap, HashSet};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use cashbook_chart::{ChartAccount, DebitCredit, FixedVariable, RevenueExpense, VisibleChart};
use cashbook_core::{ChartAccountId, Money};
use cashbook_ledger::{DateRange, LedgerEntry};

const SHARE_DP: u32 = 4;

/// Report sections, in output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    GrossRevenue,
    Deductions,
    VariableCosts,
    FixedExpenses,
    SalesMarketing,
    OtherFinancialIncome,
    Investments,
    ProfitSharing,
}

impl Section {
    pub const ALL: [Section; 8] = [
        Section::GrossRevenue,
        Section::Deductions,
        Section::VariableCosts,
        Section::FixedExpenses,
        Section::SalesMarketing,
        Section::OtherFinancialIncome,
        Section::Investments,
        Section::ProfitSharing,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Section::GrossRevenue => "Gross revenue",
            Section::Deductions => "Deductions and taxes",
            Section::VariableCosts => "Variable costs",
            Section::FixedExpenses => "Fixed expenses",
            Section::SalesMarketing => "Sales and marketing",
            Section::OtherFinancialIncome => "Other financial income",
            Section::Investments => "Investments",
            Section::ProfitSharing => "Profit sharing",
        }
    }

    /// Section claimed by a node's own flags, highest precedence first.
    fn from_flags(node: &ChartAccount) -> Option<Section> {
        let f = &node.flags;
        if f.deductions_taxes {
            Some(Section::Deductions)
        } else if f.other_financial_income {
            Some(Section::OtherFinancialIncome)
        } else if f.investments {
            Some(Section::Investments)
        } else if f.sales_marketing {
            Some(Section::SalesMarketing)
        } else if f.profit_sharing {
            Some(Section::ProfitSharing)
        } else {
            None
        }
    }

    fn from_kind(node: &ChartAccount) -> Section {
        match (node.revenue_expense, node.fixed_variable) {
            (RevenueExpense::Revenue, _) => Section::GrossRevenue,
            (RevenueExpense::Expense, FixedVariable::Variable) => Section::VariableCosts,
            (RevenueExpense::Expense, FixedVariable::Fixed) => Section::FixedExpenses,
        }
    }

    /// Side on which the section's amounts are positive. Deductions sit on the revenue side,
    /// so they read as negative amounts taken off gross revenue.
    pub fn side(self) -> DebitCredit {
        match self {
            Section::GrossRevenue | Section::Deductions | Section::OtherFinancialIncome => DebitCredit::Credit,
            Section::VariableCosts
            | Section::FixedExpenses
            | Section::SalesMarketing
            | Section::Investments
            | Section::ProfitSharing => DebitCredit::Debit,
        }
    }

    /// Express a cash effect (inflow positive) on this section's side.
    fn express(self, cash: Money) -> Money {
        match self.side() {
            DebitCredit::Credit => cash,
            DebitCredit::Debit => -cash,
        }
    }

    /// Subtotal printed after this section, if any.
    fn subtotal(self) -> Option<&'static str> {
        match self {
            Section::Deductions => Some("Net revenue"),
            Section::VariableCosts => Some("Contribution margin"),
            Section::SalesMarketing => Some("Operating result"),
            Section::ProfitSharing => Some("Net profit"),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineKind {
    Group,
    Account,
    Total,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DreLine {
    pub kind: LineKind,
    pub section: Section,
    pub chart_account_id: Option<ChartAccountId>,
    pub code: Option<String>,
    pub description: String,
    pub amount: Money,
    /// `amount / gross_revenue`.
    pub revenue_share: Decimal,
    pub depth: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DreSummary {
    pub gross_revenue: Money,
    pub total_expenses: Money,
    pub net_profit: Money,
    pub margin: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DreReport {
    pub range: DateRange,
    pub lines: Vec<DreLine>,
    pub summary: DreSummary,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct DreOptions {
    /// Keep chart subtrees that had no postings in the range.
    #[serde(default)]
    pub include_empty: bool,
}

/// Per-node state gathered before emitting lines.
struct Layout<'a> {
    chart: &'a VisibleChart,
    section: HashMap<ChartAccountId, Section>,
    children: HashMap<ChartAccountId, Vec<ChartAccountId>>,
    roots: HashMap<Section, Vec<ChartAccountId>>,
    /// Cash effect (inflow positive) of the splits posted directly on each node.
    posted: HashMap<ChartAccountId, Money>,
    /// Node totals on their section's side, children included.
    total: HashMap<ChartAccountId, Money>,
    touched: HashSet<ChartAccountId>,
}

/// Build the DRE for the tenant view `chart` over `entries` (already scoped to the same
/// tenant).
pub fn run(chart: &VisibleChart, entries: &[LedgerEntry], range: DateRange, options: DreOptions) -> DreReport {
    let chart = chart.prune(|n| n.flags.dre_hide);
    let order = chart.pre_order();

    let mut layout = Layout {
        chart: &chart,
        section: HashMap::with_capacity(order.len()),
        children: HashMap::new(),
        roots: HashMap::new(),
        posted: HashMap::new(),
        total: HashMap::new(),
        touched: HashSet::new(),
    };

    // Parents come before children in pre-order, so the nearest flagged ancestor is
    // already resolved when a node is reached.
    let mut flagged: HashMap<ChartAccountId, Option<Section>> = HashMap::with_capacity(order.len());
    for node in &order {
        let inherited = chart
            .parent(node.id)
            .and_then(|p| flagged.get(&p.id).copied().flatten());
        let flag = Section::from_flags(node).or(inherited);
        flagged.insert(node.id, flag);
        layout
            .section
            .insert(node.id, flag.unwrap_or_else(|| Section::from_kind(node)));
    }

    for node in &order {
        let section = layout.section[&node.id];
        let report_parent = chart
            .parent(node.id)
            .filter(|p| layout.section.get(&p.id) == Some(&section));
        match report_parent {
            Some(p) => layout.children.entry(p.id).or_default().push(node.id),
            None => layout.roots.entry(section).or_default().push(node.id),
        }
    }

    for entry in entries
        .iter()
        .filter(|e| e.confirmed && !e.is_deleted() && range.contains(e.issue_date))
    {
        for split in &entry.splits {
            if chart.get(split.chart_account_id).is_none() {
                continue;
            }
            *layout.posted.entry(split.chart_account_id).or_default() += entry.operation.signed(split.amount);
            layout.touched.insert(split.chart_account_id);
        }
    }

    // Reverse pre-order visits children before their parents. Amounts posted directly on a
    // node stay in its total even if the node is no longer analytic.
    for node in order.iter().rev() {
        let section = layout.section[&node.id];
        let own = layout.posted.get(&node.id).map(|cash| section.express(*cash));
        let kids = layout.children.get(&node.id).map(Vec::as_slice).unwrap_or(&[]);
        let from_kids: Money = kids.iter().filter_map(|k| layout.total.get(k)).sum();
        let touched = kids.iter().any(|k| layout.touched.contains(k));

        layout.total.insert(node.id, own.unwrap_or_default() + from_kids);
        if touched {
            layout.touched.insert(node.id);
        }
    }

    let summary = summarize(&layout, &order);
    let lines = emit_lines(&layout, &summary, options);

    DreReport {
        range,
        lines,
        summary,
    }
}

fn summarize(layout: &Layout<'_>, order: &[&ChartAccount]) -> DreSummary {
    let mut gross_revenue = Money::ZERO;
    let mut total_expenses = Money::ZERO;

    for node in order {
        let Some(cash) = layout.posted.get(&node.id).copied() else {
            continue;
        };
        let section = layout.section[&node.id];
        if section == Section::Deductions || node.revenue_expense == RevenueExpense::Expense {
            total_expenses -= cash;
        } else {
            gross_revenue += cash;
        }
    }

    let net_profit = gross_revenue - total_expenses;
    DreSummary {
        gross_revenue,
        total_expenses,
        net_profit,
        margin: net_profit.ratio(gross_revenue, SHARE_DP),
    }
}

fn emit_lines(layout: &Layout<'_>, summary: &DreSummary, options: DreOptions) -> Vec<DreLine> {
    let share = |amount: Money| amount.ratio(summary.gross_revenue, SHARE_DP);
    let visible = |id: &ChartAccountId| options.include_empty || layout.touched.contains(id);

    let mut lines = Vec::new();
    let mut running_result = Money::ZERO;

    for section in Section::ALL {
        let roots: Vec<ChartAccountId> = layout
            .roots
            .get(&section)
            .map(|r| r.iter().copied().filter(|id| visible(id)).collect())
            .unwrap_or_default();

        let section_total: Money = roots.iter().filter_map(|id| layout.total.get(id)).sum();
        running_result += section_effect(layout, section);

        if !roots.is_empty() {
            lines.push(DreLine {
                kind: LineKind::Group,
                section,
                chart_account_id: None,
                code: None,
                description: section.label().to_string(),
                amount: section_total,
                revenue_share: share(section_total),
                depth: 0,
            });

            let mut stack: Vec<(ChartAccountId, usize)> = roots.iter().rev().map(|id| (*id, 1)).collect();
            let mut seen = HashSet::new();
            while let Some((id, depth)) = stack.pop() {
                if !seen.insert(id) {
                    continue;
                }
                let Some(node) = layout.chart.get(id) else {
                    continue;
                };
                let amount = layout.total.get(&id).copied().unwrap_or_default();
                lines.push(DreLine {
                    kind: if node.is_analytic() { LineKind::Account } else { LineKind::Group },
                    section,
                    chart_account_id: Some(id),
                    code: Some(node.code.clone()),
                    description: node.description.clone(),
                    amount,
                    revenue_share: share(amount),
                    depth,
                });
                if let Some(kids) = layout.children.get(&id) {
                    stack.extend(kids.iter().rev().filter(|k| visible(k)).map(|k| (*k, depth + 1)));
                }
            }
        }

        if let Some(label) = section.subtotal() {
            lines.push(DreLine {
                kind: LineKind::Total,
                section,
                chart_account_id: None,
                code: None,
                description: label.to_string(),
                amount: running_result,
                revenue_share: share(running_result),
                depth: 0,
            });
        }
    }

    lines
}

/// Net cash effect of everything posted on nodes of `section`.
fn section_effect(layout: &Layout<'_>, section: Section) -> Money {
    layout
        .posted
        .iter()
        .filter(|(id, _)| layout.section.get(*id) == Some(&section))
        .map(|(_, cash)| *cash)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cashbook_chart::{DreFlags, Owner, PlanType};
    use cashbook_core::{AccountId, TenantId};
    use cashbook_ledger::{DocumentInfo, EntryDraft, Operation, SplitDraft};
    use chrono::{NaiveDate, Utc};
    use proptest::prelude::*;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, day).unwrap()
    }

    fn january() -> DateRange {
        DateRange::new(date(1), date(28)).unwrap()
    }

    fn synthetic(code: &str, kind: RevenueExpense) -> ChartAccount {
        ChartAccount::new(Owner::Global, code, format!("Group {code}"), PlanType::Synthetic, kind)
    }

    fn analytic(code: &str, kind: RevenueExpense, parent: &ChartAccount) -> ChartAccount {
        ChartAccount::new(Owner::Global, code, format!("Account {code}"), PlanType::Analytic, kind)
            .with_parent(parent.id)
            .with_fixed_variable(parent.fixed_variable)
    }

    fn posting(day: u32, op: Operation, confirmed: bool, splits: &[(&ChartAccount, i64)]) -> LedgerEntry {
        let amount: i64 = splits.iter().map(|(_, c)| c).sum();
        let draft = EntryDraft {
            issue_date: date(day),
            payment_date: None,
            account_id: AccountId::new(),
            document: DocumentInfo::default(),
            amount: Money::from_cents(amount),
            operation: op,
            history: None,
            confirmed: Some(confirmed),
            print_on_close: false,
            splits: splits
                .iter()
                .map(|(n, c)| SplitDraft {
                    chart_account_id: n.id,
                    cost_center_id: None,
                    amount: Money::from_cents(*c),
                })
                .collect(),
        };
        LedgerEntry::from_draft(TenantId::new(), 1, draft, confirmed, Utc::now())
    }

    fn line<'a>(report: &'a DreReport, code: &str) -> Option<&'a DreLine> {
        report.lines.iter().find(|l| l.code.as_deref() == Some(code))
    }

    fn total<'a>(report: &'a DreReport, description: &str) -> &'a DreLine {
        report
            .lines
            .iter()
            .find(|l| l.kind == LineKind::Total && l.description == description)
            .unwrap()
    }

    #[test]
    fn revenue_and_expense_roll_up_with_natural_signs() {
        let revenue = synthetic("3", RevenueExpense::Revenue);
        let sales = analytic("3.1", RevenueExpense::Revenue, &revenue);
        let services = analytic("3.2", RevenueExpense::Revenue, &revenue);
        let expenses = synthetic("4", RevenueExpense::Expense);
        let rent = analytic("4.1", RevenueExpense::Expense, &expenses);
        let chart = VisibleChart::new(
            TenantId::new(),
            vec![revenue.clone(), sales.clone(), services.clone(), expenses.clone(), rent.clone()],
        );

        let entries = vec![
            posting(3, Operation::Credit, true, &[(&sales, 60_000), (&services, 40_000)]),
            posting(4, Operation::Debit, true, &[(&rent, 25_000)]),
            // Refund of a sale lowers revenue.
            posting(5, Operation::Debit, true, &[(&sales, 10_000)]),
            // Unconfirmed entries never count.
            posting(6, Operation::Credit, false, &[(&sales, 99_999)]),
        ];

        let report = run(&chart, &entries, january(), DreOptions::default());

        assert_eq!(line(&report, "3").unwrap().amount, Money::from_cents(90_000));
        assert_eq!(line(&report, "3.1").unwrap().amount, Money::from_cents(50_000));
        assert_eq!(line(&report, "4.1").unwrap().amount, Money::from_cents(25_000));
        assert_eq!(report.summary.gross_revenue, Money::from_cents(90_000));
        assert_eq!(report.summary.total_expenses, Money::from_cents(25_000));
        assert_eq!(report.summary.net_profit, Money::from_cents(65_000));
        assert_eq!(report.summary.margin, Decimal::new(7222, 4));
        assert_eq!(total(&report, "Net profit").amount, Money::from_cents(65_000));
        assert_eq!(line(&report, "3.1").unwrap().revenue_share, Decimal::new(5556, 4));
    }

    #[test]
    fn flagged_subtree_forms_its_own_section() {
        let revenue = synthetic("3", RevenueExpense::Revenue);
        let sales = analytic("3.1", RevenueExpense::Revenue, &revenue);
        let taxes = synthetic("3.9", RevenueExpense::Revenue)
            .with_parent(revenue.id)
            .with_flags(DreFlags {
                deductions_taxes: true,
                ..DreFlags::default()
            });
        let vat = analytic("3.9.1", RevenueExpense::Revenue, &taxes);

        let chart = VisibleChart::new(
            TenantId::new(),
            vec![revenue.clone(), sales.clone(), taxes.clone(), vat.clone()],
        );
        let entries = vec![
            posting(2, Operation::Credit, true, &[(&sales, 100_000)]),
            posting(3, Operation::Debit, true, &[(&vat, 9_000)]),
        ];

        let report = run(&chart, &entries, january(), DreOptions::default());

        let taxes_line = line(&report, "3.9").unwrap();
        assert_eq!(taxes_line.section, Section::Deductions);
        assert_eq!(taxes_line.depth, 1);
        let vat_line = line(&report, "3.9.1").unwrap();
        assert_eq!(vat_line.section, Section::Deductions);
        // Deductions read on the revenue side: a tax paid is negative.
        assert_eq!(vat_line.amount, Money::from_cents(-9_000));
        // The deduction subtree no longer rolls into gross revenue.
        assert_eq!(line(&report, "3").unwrap().amount, Money::from_cents(100_000));
        assert_eq!(report.summary.gross_revenue, Money::from_cents(100_000));
        assert_eq!(report.summary.total_expenses, Money::from_cents(9_000));
        assert_eq!(total(&report, "Net revenue").amount, Money::from_cents(91_000));
    }

    #[test]
    fn deductions_of_either_nature_share_one_sign() {
        let deductions = DreFlags {
            deductions_taxes: true,
            ..DreFlags::default()
        };
        let revenue = synthetic("3", RevenueExpense::Revenue);
        let sales = analytic("3.1", RevenueExpense::Revenue, &revenue);
        let vat_group = synthetic("3.9", RevenueExpense::Revenue)
            .with_parent(revenue.id)
            .with_flags(deductions);
        let vat = analytic("3.9.1", RevenueExpense::Revenue, &vat_group);
        let expenses = synthetic("4", RevenueExpense::Expense);
        let tax_group = synthetic("4.7", RevenueExpense::Expense)
            .with_parent(expenses.id)
            .with_flags(deductions);
        let tax = analytic("4.7.1", RevenueExpense::Expense, &tax_group);

        let chart = VisibleChart::new(
            TenantId::new(),
            vec![
                revenue.clone(),
                sales.clone(),
                vat_group,
                vat.clone(),
                expenses,
                tax_group,
                tax.clone(),
            ],
        );
        let entries = vec![
            posting(2, Operation::Credit, true, &[(&sales, 100_000)]),
            posting(3, Operation::Debit, true, &[(&vat, 9_000)]),
            posting(3, Operation::Debit, true, &[(&tax, 5_000)]),
        ];

        let report = run(&chart, &entries, january(), DreOptions::default());

        let header = report
            .lines
            .iter()
            .find(|l| l.kind == LineKind::Group && l.depth == 0 && l.section == Section::Deductions)
            .unwrap();
        assert_eq!(header.amount, Money::from_cents(-14_000));
        assert_eq!(line(&report, "3.9.1").unwrap().amount, Money::from_cents(-9_000));
        assert_eq!(line(&report, "4.7.1").unwrap().amount, Money::from_cents(-5_000));
        assert_eq!(line(&report, "4.7").unwrap().section, Section::Deductions);
        assert_eq!(total(&report, "Net revenue").amount, Money::from_cents(86_000));
        assert_eq!(report.summary.gross_revenue, Money::from_cents(100_000));
        assert_eq!(report.summary.total_expenses, Money::from_cents(14_000));
        assert_eq!(report.summary.net_profit, Money::from_cents(86_000));
    }

    #[test]
    fn amounts_posted_on_a_synthetic_node_still_count() {
        let revenue = synthetic("3", RevenueExpense::Revenue);
        let sales = analytic("3.1", RevenueExpense::Revenue, &revenue);
        // Posted while the node was still analytic, before it was regrouped.
        let legacy = synthetic("3.5", RevenueExpense::Revenue).with_parent(revenue.id);
        let chart = VisibleChart::new(
            TenantId::new(),
            vec![revenue.clone(), sales.clone(), legacy.clone()],
        );
        let entries = vec![
            posting(2, Operation::Credit, true, &[(&sales, 1_000)]),
            posting(3, Operation::Credit, true, &[(&legacy, 500)]),
        ];

        let report = run(&chart, &entries, january(), DreOptions::default());
        assert_eq!(line(&report, "3.5").unwrap().amount, Money::from_cents(500));
        assert_eq!(line(&report, "3").unwrap().amount, Money::from_cents(1_500));
        assert_eq!(report.summary.gross_revenue, Money::from_cents(1_500));
        assert_eq!(total(&report, "Net profit").amount, Money::from_cents(1_500));
    }

    #[test]
    fn hidden_nodes_take_their_subtree_with_them() {
        let expenses = synthetic("4", RevenueExpense::Expense);
        let internal = synthetic("4.8", RevenueExpense::Expense)
            .with_parent(expenses.id)
            .with_flags(DreFlags {
                dre_hide: true,
                ..DreFlags::default()
            });
        let transfer = analytic("4.8.1", RevenueExpense::Expense, &internal);
        let rent = analytic("4.1", RevenueExpense::Expense, &expenses);
        let chart = VisibleChart::new(
            TenantId::new(),
            vec![expenses.clone(), internal, transfer.clone(), rent.clone()],
        );
        let entries = vec![
            posting(2, Operation::Debit, true, &[(&transfer, 50_000)]),
            posting(2, Operation::Debit, true, &[(&rent, 1_000)]),
        ];

        let report = run(&chart, &entries, january(), DreOptions::default());
        assert!(line(&report, "4.8").is_none());
        assert!(line(&report, "4.8.1").is_none());
        assert_eq!(line(&report, "4").unwrap().amount, Money::from_cents(1_000));
        assert_eq!(report.summary.total_expenses, Money::from_cents(1_000));
    }

    #[test]
    fn empty_subtrees_are_omitted_unless_requested() {
        let revenue = synthetic("3", RevenueExpense::Revenue);
        let sales = analytic("3.1", RevenueExpense::Revenue, &revenue);
        let expenses = synthetic("4", RevenueExpense::Expense);
        let rent = analytic("4.1", RevenueExpense::Expense, &expenses);
        let chart = VisibleChart::new(
            TenantId::new(),
            vec![revenue, sales.clone(), expenses, rent],
        );
        let entries = vec![posting(2, Operation::Credit, true, &[(&sales, 500)])];

        let compact = run(&chart, &entries, january(), DreOptions::default());
        assert!(line(&compact, "4").is_none());
        assert_eq!(compact.summary.margin, Decimal::ONE);

        let full = run(&chart, &entries, january(), DreOptions { include_empty: true });
        assert_eq!(line(&full, "4.1").unwrap().amount, Money::ZERO);
    }

    #[test]
    fn no_revenue_means_zero_margin_and_shares() {
        let expenses = synthetic("4", RevenueExpense::Expense);
        let rent = analytic("4.1", RevenueExpense::Expense, &expenses);
        let chart = VisibleChart::new(TenantId::new(), vec![expenses, rent.clone()]);
        let entries = vec![posting(2, Operation::Debit, true, &[(&rent, 700)])];

        let report = run(&chart, &entries, january(), DreOptions::default());
        assert_eq!(report.summary.margin, Decimal::ZERO);
        assert!(report.lines.iter().all(|l| l.revenue_share == Decimal::ZERO));
        assert_eq!(report.summary.net_profit, Money::from_cents(-700));
    }

    #[test]
    fn sections_follow_fixed_order() {
        let variable = synthetic("5", RevenueExpense::Expense).with_fixed_variable(FixedVariable::Variable);
        let goods = analytic("5.1", RevenueExpense::Expense, &variable);
        let revenue = synthetic("3", RevenueExpense::Revenue);
        let sales = analytic("3.1", RevenueExpense::Revenue, &revenue);
        let chart = VisibleChart::new(
            TenantId::new(),
            vec![variable, goods.clone(), revenue, sales.clone()],
        );
        let entries = vec![
            posting(2, Operation::Debit, true, &[(&goods, 300)]),
            posting(2, Operation::Credit, true, &[(&sales, 1_000)]),
        ];

        let report = run(&chart, &entries, january(), DreOptions::default());
        let groups: Vec<Section> = report
            .lines
            .iter()
            .filter(|l| l.kind == LineKind::Group && l.depth == 0)
            .map(|l| l.section)
            .collect();
        assert_eq!(groups, vec![Section::GrossRevenue, Section::VariableCosts]);
        assert_eq!(total(&report, "Contribution margin").amount, Money::from_cents(700));
    }

    fn flag(pick: usize) -> DreFlags {
        let mut flags = DreFlags::default();
        match pick {
            1 => flags.deductions_taxes = true,
            2 => flags.other_financial_income = true,
            3 => flags.investments = true,
            4 => flags.sales_marketing = true,
            5 => flags.profit_sharing = true,
            _ => {}
        }
        flags
    }

    proptest! {
        /// Whatever sections the flagged groups land in: a chart line equals the sum of its
        /// children in the same section, a section header equals the sum of its roots, and
        /// the headers, the closing subtotal and the summary all agree on the net result.
        #[test]
        fn roll_up_matches_leaves(
            revenue_flag in 0usize..6,
            expense_flag in 0usize..6,
            variable in any::<bool>(),
            postings in prop::collection::vec((0usize..5, any::<bool>(), 1i64..100_000), 0..30),
        ) {
            let revenue = synthetic("3", RevenueExpense::Revenue);
            let revenue_group = synthetic("3.9", RevenueExpense::Revenue)
                .with_parent(revenue.id)
                .with_flags(flag(revenue_flag));
            let expenses = synthetic("4", RevenueExpense::Expense);
            let expense_group = synthetic("4.9", RevenueExpense::Expense)
                .with_parent(expenses.id)
                .with_fixed_variable(if variable { FixedVariable::Variable } else { FixedVariable::Fixed })
                .with_flags(flag(expense_flag));
            let leaves = vec![
                analytic("3.1", RevenueExpense::Revenue, &revenue),
                analytic("3.2", RevenueExpense::Revenue, &revenue),
                analytic("3.9.1", RevenueExpense::Revenue, &revenue_group),
                analytic("4.1", RevenueExpense::Expense, &expenses),
                analytic("4.9.1", RevenueExpense::Expense, &expense_group),
            ];
            let mut nodes = vec![revenue, revenue_group, expenses, expense_group];
            nodes.extend(leaves.iter().cloned());
            let chart = VisibleChart::new(TenantId::new(), nodes);

            let entries: Vec<LedgerEntry> = postings
                .iter()
                .map(|(leaf, credit, cents)| {
                    let op = if *credit { Operation::Credit } else { Operation::Debit };
                    posting(10, op, true, &[(&leaves[*leaf], *cents)])
                })
                .collect();

            let report = run(&chart, &entries, january(), DreOptions { include_empty: true });

            for parent in report.lines.iter().filter(|l| l.kind == LineKind::Group) {
                let kids: Money = match parent.chart_account_id {
                    Some(id) => report
                        .lines
                        .iter()
                        .filter(|l| l.section == parent.section)
                        .filter(|l| {
                            l.chart_account_id
                                .and_then(|kid| chart.parent(kid))
                                .is_some_and(|p| p.id == id)
                        })
                        .map(|l| l.amount)
                        .sum(),
                    None => report
                        .lines
                        .iter()
                        .filter(|l| l.section == parent.section && l.depth == 1)
                        .map(|l| l.amount)
                        .sum(),
                };
                prop_assert_eq!(parent.amount, kids);
            }

            let from_headers: Money = report
                .lines
                .iter()
                .filter(|l| l.kind == LineKind::Group && l.depth == 0)
                .map(|l| match l.section.side() {
                    DebitCredit::Credit => l.amount,
                    DebitCredit::Debit => -l.amount,
                })
                .sum();
            let s = report.summary;
            prop_assert_eq!(from_headers, s.net_profit);
            prop_assert_eq!(total(&report, "Net profit").amount, s.net_profit);
            prop_assert_eq!(s.gross_revenue - s.total_expenses, s.net_profit);
        }
    }
}
