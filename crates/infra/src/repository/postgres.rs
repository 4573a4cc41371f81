//! Postgres-backed ledger repository.
//!
//! Entries live in `ledger_entries`, their splits in `ledger_splits`. Every write runs in
//! one transaction:
//!
//! - `insert` bumps the tenant's row in `ledger_sequences` (row lock serializes concurrent
//!   posts of one tenant) and inserts the entry plus splits.
//! - `replace` updates the entry guarded by its `version` column, then rewrites the split
//!   set.
//!
//! ## Error Mapping
//!
//! | SQLx error | PostgreSQL code | StorageError |
//! |------------|-----------------|--------------|
//! | Database (unique violation) | `23505` | `Conflict` |
//! | Database (other) | any | `Backend` |
//! | PoolClosed / Io / other | N/A | `Backend` |

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{Postgres, QueryBuilder, Row, Transaction};
use tracing::instrument;
use uuid::Uuid;

use cashbook_core::{
    AccountId, ChartAccountId, CostCenterId, EntryId, ExpectedVersion, Money, SplitId, TenantId,
};
use cashbook_ledger::{DocumentInfo, EntryFilter, LedgerEntry, LedgerSplit, Operation};

use super::LedgerRepository;
use crate::error::StorageError;

const SCHEMA: &str = include_str!("../../migrations/0001_ledger.sql");

#[derive(Debug, Clone)]
pub struct PostgresLedgerRepository {
    pool: Arc<PgPool>,
}

impl PostgresLedgerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Open a pool against `database_url`.
    pub async fn connect(database_url: &str) -> Result<Self, StorageError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Apply the schema. Idempotent.
    #[instrument(skip(self), err)]
    pub async fn migrate(&self) -> Result<(), StorageError> {
        sqlx::raw_sql(SCHEMA)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("migrate", e))?;
        Ok(())
    }
}

#[async_trait]
impl LedgerRepository for PostgresLedgerRepository {
    #[instrument(
        skip(self, entry),
        fields(tenant_id = %entry.tenant_id, entry_id = %entry.id, split_count = entry.splits.len()),
        err
    )]
    async fn insert(&self, mut entry: LedgerEntry) -> Result<LedgerEntry, StorageError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let code: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO ledger_sequences (tenant_id, last_code)
            VALUES ($1, 1)
            ON CONFLICT (tenant_id)
            DO UPDATE SET last_code = ledger_sequences.last_code + 1
            RETURNING last_code
            "#,
        )
        .bind(entry.tenant_id.as_uuid())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("next_code", e))?;
        entry.code = code as u64;

        sqlx::query(
            r#"
            INSERT INTO ledger_entries (
                id, tenant_id, code, issue_date, payment_date, account_id,
                document_type, document_number, check_number, entity_code,
                amount_cents, operation, history, confirmed, print_on_close,
                created_at, updated_at, deleted_at, version
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)
            "#,
        )
        .bind(entry.id.as_uuid())
        .bind(entry.tenant_id.as_uuid())
        .bind(code)
        .bind(entry.issue_date)
        .bind(entry.payment_date)
        .bind(entry.account_id.as_uuid())
        .bind(&entry.document.document_type)
        .bind(&entry.document.document_number)
        .bind(&entry.document.check_number)
        .bind(&entry.document.entity_code)
        .bind(entry.amount.cents())
        .bind(operation_to_sql(entry.operation))
        .bind(&entry.history)
        .bind(entry.confirmed)
        .bind(entry.print_on_close)
        .bind(entry.created_at)
        .bind(entry.updated_at)
        .bind(entry.deleted_at)
        .bind(entry.version as i64)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("insert_entry", e))?;

        insert_splits(&mut tx, &entry).await?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        Ok(entry)
    }

    #[instrument(skip(self), fields(tenant_id = %tenant_id, entry_id = %id), err)]
    async fn get(&self, tenant_id: TenantId, id: EntryId) -> Result<Option<LedgerEntry>, StorageError> {
        let row = sqlx::query(&format!("{SELECT_ENTRIES} WHERE tenant_id = $1 AND id = $2"))
            .bind(tenant_id.as_uuid())
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_entry", e))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let mut entries = vec![entry_from_row(&row)?];
        self.attach_splits(tenant_id, &mut entries).await?;
        Ok(entries.pop())
    }

    #[instrument(
        skip(self, entry),
        fields(tenant_id = %entry.tenant_id, entry_id = %entry.id, expected = ?expected),
        err
    )]
    async fn replace(&self, entry: &LedgerEntry, expected: ExpectedVersion) -> Result<(), StorageError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let current: Option<i64> = sqlx::query_scalar(
            "SELECT version FROM ledger_entries WHERE tenant_id = $1 AND id = $2 FOR UPDATE",
        )
        .bind(entry.tenant_id.as_uuid())
        .bind(entry.id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("lock_entry", e))?;

        let Some(current) = current else {
            tx.rollback().await.map_err(|e| map_sqlx_error("rollback", e))?;
            return Err(StorageError::NotFound(format!("entry {}", entry.id)));
        };

        if !expected.matches(current as u64) {
            tx.rollback().await.map_err(|e| map_sqlx_error("rollback", e))?;
            return Err(StorageError::Conflict(format!(
                "entry {} is at version {}, expected {:?}",
                entry.id, current, expected
            )));
        }

        sqlx::query(
            r#"
            UPDATE ledger_entries SET
                issue_date = $3, payment_date = $4, account_id = $5,
                document_type = $6, document_number = $7, check_number = $8, entity_code = $9,
                amount_cents = $10, operation = $11, history = $12, confirmed = $13,
                print_on_close = $14, updated_at = $15, deleted_at = $16, version = $17
            WHERE tenant_id = $1 AND id = $2
            "#,
        )
        .bind(entry.tenant_id.as_uuid())
        .bind(entry.id.as_uuid())
        .bind(entry.issue_date)
        .bind(entry.payment_date)
        .bind(entry.account_id.as_uuid())
        .bind(&entry.document.document_type)
        .bind(&entry.document.document_number)
        .bind(&entry.document.check_number)
        .bind(&entry.document.entity_code)
        .bind(entry.amount.cents())
        .bind(operation_to_sql(entry.operation))
        .bind(&entry.history)
        .bind(entry.confirmed)
        .bind(entry.print_on_close)
        .bind(entry.updated_at)
        .bind(entry.deleted_at)
        .bind(entry.version as i64)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("update_entry", e))?;

        sqlx::query("DELETE FROM ledger_splits WHERE tenant_id = $1 AND entry_id = $2")
            .bind(entry.tenant_id.as_uuid())
            .bind(entry.id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_splits", e))?;

        insert_splits(&mut tx, entry).await?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;
        Ok(())
    }

    #[instrument(skip(self, filter), fields(tenant_id = %tenant_id), err)]
    async fn list(&self, tenant_id: TenantId, filter: &EntryFilter) -> Result<Vec<LedgerEntry>, StorageError> {
        let mut qb: QueryBuilder<'_, Postgres> = QueryBuilder::new(SELECT_ENTRIES);
        qb.push(" WHERE tenant_id = ").push_bind(*tenant_id.as_uuid());

        if !filter.include_deleted {
            qb.push(" AND deleted_at IS NULL");
        }
        if let Some(from) = filter.date_from {
            qb.push(" AND issue_date >= ").push_bind(from);
        }
        if let Some(to) = filter.date_to {
            qb.push(" AND issue_date <= ").push_bind(to);
        }
        if let Some(account_id) = filter.account_id {
            qb.push(" AND account_id = ").push_bind(*account_id.as_uuid());
        }
        if let Some(operation) = filter.operation {
            qb.push(" AND operation = ").push_bind(operation_to_sql(operation));
        }
        if let Some(confirmed) = filter.confirmed {
            qb.push(" AND confirmed = ").push_bind(confirmed);
        }
        qb.push(" ORDER BY issue_date ASC, code ASC");

        let rows = qb
            .build()
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_entries", e))?;

        let mut entries = rows.iter().map(entry_from_row).collect::<Result<Vec<_>, _>>()?;
        self.attach_splits(tenant_id, &mut entries).await?;
        Ok(entries)
    }

    #[instrument(skip(self), fields(chart_account_id = %id), err)]
    async fn chart_account_in_use(&self, id: ChartAccountId) -> Result<bool, StorageError> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM ledger_splits s JOIN ledger_entries e ON e.id = s.entry_id \
             WHERE s.chart_account_id = $1 AND e.deleted_at IS NULL)",
        )
        .bind(id.as_uuid())
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("chart_account_in_use", e))
    }
}

impl PostgresLedgerRepository {
    async fn attach_splits(&self, tenant_id: TenantId, entries: &mut [LedgerEntry]) -> Result<(), StorageError> {
        if entries.is_empty() {
            return Ok(());
        }

        let ids: Vec<Uuid> = entries.iter().map(|e| *e.id.as_uuid()).collect();
        let rows = sqlx::query(
            r#"
            SELECT id, entry_id, chart_account_id, cost_center_id, amount_cents
            FROM ledger_splits
            WHERE tenant_id = $1 AND entry_id = ANY($2)
            ORDER BY entry_id, position
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(&ids)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("load_splits", e))?;

        let mut by_entry: HashMap<EntryId, Vec<LedgerSplit>> = HashMap::new();
        for row in &rows {
            let split = split_from_row(row)?;
            by_entry.entry(split.entry_id).or_default().push(split);
        }
        for entry in entries.iter_mut() {
            entry.splits = by_entry.remove(&entry.id).unwrap_or_default();
        }
        Ok(())
    }
}

const SELECT_ENTRIES: &str = r#"
    SELECT
        id, tenant_id, code, issue_date, payment_date, account_id,
        document_type, document_number, check_number, entity_code,
        amount_cents, operation, history, confirmed, print_on_close,
        created_at, updated_at, deleted_at, version
    FROM ledger_entries"#;

async fn insert_splits(tx: &mut Transaction<'_, Postgres>, entry: &LedgerEntry) -> Result<(), StorageError> {
    for (position, split) in entry.splits.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO ledger_splits (
                id, tenant_id, entry_id, position, chart_account_id, cost_center_id, amount_cents
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(split.id.as_uuid())
        .bind(entry.tenant_id.as_uuid())
        .bind(entry.id.as_uuid())
        .bind(position as i32)
        .bind(split.chart_account_id.as_uuid())
        .bind(split.cost_center_id.map(|c| *c.as_uuid()))
        .bind(split.amount.cents())
        .execute(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("insert_split", e))?;
    }
    Ok(())
}

fn operation_to_sql(op: Operation) -> &'static str {
    match op {
        Operation::Debit => "debit",
        Operation::Credit => "credit",
    }
}

fn operation_from_sql(s: &str) -> Result<Operation, StorageError> {
    match s {
        "debit" => Ok(Operation::Debit),
        "credit" => Ok(Operation::Credit),
        other => Err(StorageError::Backend(format!("unknown operation '{other}' in ledger_entries"))),
    }
}

fn entry_from_row(row: &PgRow) -> Result<LedgerEntry, StorageError> {
    let get = |e: sqlx::Error| StorageError::Backend(format!("failed to decode entry row: {e}"));

    let code: i64 = row.try_get("code").map_err(get)?;
    let amount: i64 = row.try_get("amount_cents").map_err(get)?;
    let version: i64 = row.try_get("version").map_err(get)?;
    let operation: String = row.try_get("operation").map_err(get)?;

    Ok(LedgerEntry {
        id: EntryId::from_uuid(row.try_get("id").map_err(get)?),
        tenant_id: TenantId::from_uuid(row.try_get("tenant_id").map_err(get)?),
        code: code as u64,
        issue_date: row.try_get::<NaiveDate, _>("issue_date").map_err(get)?,
        payment_date: row.try_get::<Option<NaiveDate>, _>("payment_date").map_err(get)?,
        account_id: AccountId::from_uuid(row.try_get("account_id").map_err(get)?),
        document: DocumentInfo {
            document_type: row.try_get("document_type").map_err(get)?,
            document_number: row.try_get("document_number").map_err(get)?,
            check_number: row.try_get("check_number").map_err(get)?,
            entity_code: row.try_get("entity_code").map_err(get)?,
        },
        amount: Money::from_cents(amount),
        operation: operation_from_sql(&operation)?,
        history: row.try_get("history").map_err(get)?,
        confirmed: row.try_get("confirmed").map_err(get)?,
        print_on_close: row.try_get("print_on_close").map_err(get)?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at").map_err(get)?,
        updated_at: row.try_get::<DateTime<Utc>, _>("updated_at").map_err(get)?,
        deleted_at: row.try_get::<Option<DateTime<Utc>>, _>("deleted_at").map_err(get)?,
        version: version as u64,
        splits: Vec::new(),
    })
}

fn split_from_row(row: &PgRow) -> Result<LedgerSplit, StorageError> {
    let get = |e: sqlx::Error| StorageError::Backend(format!("failed to decode split row: {e}"));
    let amount: i64 = row.try_get("amount_cents").map_err(get)?;
    let cost_center: Option<Uuid> = row.try_get("cost_center_id").map_err(get)?;

    Ok(LedgerSplit {
        id: SplitId::from_uuid(row.try_get("id").map_err(get)?),
        entry_id: EntryId::from_uuid(row.try_get("entry_id").map_err(get)?),
        chart_account_id: ChartAccountId::from_uuid(row.try_get("chart_account_id").map_err(get)?),
        cost_center_id: cost_center.map(CostCenterId::from_uuid),
        amount: Money::from_cents(amount),
    })
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StorageError {
    if is_unique_violation(&err) {
        return StorageError::Conflict(format!("unique violation in {operation}: {err}"));
    }
    match err {
        sqlx::Error::Database(db_err) => {
            StorageError::Backend(format!("database error in {operation}: {}", db_err.message()))
        }
        sqlx::Error::PoolClosed => StorageError::Backend(format!("connection pool closed in {operation}")),
        other => StorageError::Backend(format!("{operation} failed: {other}")),
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = err {
        if let Some(code) = db_err.code() {
            return code.as_ref() == "23505";
        }
    }
    false
}
