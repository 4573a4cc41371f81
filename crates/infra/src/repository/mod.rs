//! Ledger entry persistence.
//!
//! A repository stores an entry together with its full split set as one unit: every write
//! either lands completely or not at all.

use std::sync::Arc;

use async_trait::async_trait;

use cashbook_core::{ChartAccountId, EntryId, ExpectedVersion, TenantId};
use cashbook_ledger::{EntryFilter, LedgerEntry};

use crate::error::StorageError;

pub mod in_memory;
#[cfg(feature = "postgres")]
pub mod postgres;

pub use in_memory::InMemoryLedgerRepository;
#[cfg(feature = "postgres")]
pub use postgres::PostgresLedgerRepository;

#[async_trait]
pub trait LedgerRepository: Send + Sync {
    /// Store a new entry, assigning the next per-tenant code. The `code` carried by `entry`
    /// is ignored.
    async fn insert(&self, entry: LedgerEntry) -> Result<LedgerEntry, StorageError>;

    /// Fetch one entry, deleted or not.
    async fn get(&self, tenant_id: TenantId, id: EntryId) -> Result<Option<LedgerEntry>, StorageError>;

    /// Replace a stored entry and its splits. `expected` is checked against the version
    /// currently stored, inside the same critical section as the write.
    async fn replace(&self, entry: &LedgerEntry, expected: ExpectedVersion) -> Result<(), StorageError>;

    /// Entries of a tenant matching `filter`, ordered by `(issue_date, code)`.
    async fn list(&self, tenant_id: TenantId, filter: &EntryFilter) -> Result<Vec<LedgerEntry>, StorageError>;

    /// Whether a non-deleted entry of any tenant has a split on `id`. Global chart nodes
    /// are shared, so the check is not tenant-scoped.
    async fn chart_account_in_use(&self, id: ChartAccountId) -> Result<bool, StorageError>;
}

#[async_trait]
impl<R> LedgerRepository for Arc<R>
where
    R: LedgerRepository + ?Sized,
{
    async fn insert(&self, entry: LedgerEntry) -> Result<LedgerEntry, StorageError> {
        (**self).insert(entry).await
    }

    async fn get(&self, tenant_id: TenantId, id: EntryId) -> Result<Option<LedgerEntry>, StorageError> {
        (**self).get(tenant_id, id).await
    }

    async fn replace(&self, entry: &LedgerEntry, expected: ExpectedVersion) -> Result<(), StorageError> {
        (**self).replace(entry, expected).await
    }

    async fn list(&self, tenant_id: TenantId, filter: &EntryFilter) -> Result<Vec<LedgerEntry>, StorageError> {
        (**self).list(tenant_id, filter).await
    }

    async fn chart_account_in_use(&self, id: ChartAccountId) -> Result<bool, StorageError> {
        (**self).chart_account_in_use(id).await
    }
}
