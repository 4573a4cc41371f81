use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use cashbook_chart::{ChartAccount, Owner, PlanType, RevenueExpense, VisibleChart};
use cashbook_core::{AccountId, Money, TenantId};
use cashbook_ledger::{DateRange, DocumentInfo, EntryDraft, LedgerEntry, Operation, SplitDraft};
use cashbook_reports::{DreOptions, dre, statement};
use chrono::{Duration, NaiveDate, Utc};

struct Fixture {
    chart: VisibleChart,
    entries: Vec<LedgerEntry>,
    range: DateRange,
}

fn fixture(count: usize) -> Fixture {
    let tenant_id = TenantId::new();
    let account_id = AccountId::new();
    let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();

    let revenue = ChartAccount::new(Owner::Global, "3", "Revenue", PlanType::Synthetic, RevenueExpense::Revenue);
    let expenses = ChartAccount::new(Owner::Global, "4", "Expenses", PlanType::Synthetic, RevenueExpense::Expense);
    let sales = ChartAccount::new(Owner::Global, "3.1", "Sales", PlanType::Analytic, RevenueExpense::Revenue)
        .with_parent(revenue.id);
    let rent = ChartAccount::new(Owner::Global, "4.1", "Rent", PlanType::Analytic, RevenueExpense::Expense)
        .with_parent(expenses.id);

    let entries = (0..count)
        .map(|i| {
            let credit = i % 3 != 0;
            let target = if credit { sales.id } else { rent.id };
            let amount = Money::from_cents(1_000 + (i as i64 % 97) * 13);
            let draft = EntryDraft {
                issue_date: start + Duration::days((i % 365) as i64),
                payment_date: None,
                account_id,
                document: DocumentInfo::default(),
                amount,
                operation: if credit { Operation::Credit } else { Operation::Debit },
                history: None,
                confirmed: Some(true),
                print_on_close: false,
                splits: vec![SplitDraft {
                    chart_account_id: target,
                    cost_center_id: None,
                    amount,
                }],
            };
            LedgerEntry::from_draft(tenant_id, i as u64 + 1, draft, true, Utc::now())
        })
        .collect();

    Fixture {
        chart: VisibleChart::new(tenant_id, vec![revenue, expenses, sales, rent]),
        entries,
        range: DateRange::new(start + Duration::days(90), start + Duration::days(180)).unwrap(),
    }
}

fn bench_reports(c: &mut Criterion) {
    let mut group = c.benchmark_group("reports");

    for count in [1_000usize, 10_000, 50_000] {
        let fx = fixture(count);
        group.throughput(Throughput::Elements(count as u64));

        group.bench_with_input(BenchmarkId::new("statement", count), &fx, |b, fx| {
            b.iter(|| statement(black_box(&fx.entries), fx.range))
        });

        group.bench_with_input(BenchmarkId::new("dre", count), &fx, |b, fx| {
            b.iter(|| dre::run(&fx.chart, black_box(&fx.entries), fx.range, DreOptions::default()))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_reports);
criterion_main!(benches);
