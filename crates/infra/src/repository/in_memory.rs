use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use cashbook_core::{ChartAccountId, EntryId, ExpectedVersion, TenantId};
use cashbook_ledger::{EntryFilter, LedgerEntry, sort_entries};

use super::LedgerRepository;
use crate::error::StorageError;

#[derive(Debug, Default)]
struct State {
    entries: HashMap<(TenantId, EntryId), LedgerEntry>,
    last_code: HashMap<TenantId, u64>,
}

/// In-memory tenant-isolated ledger storage for tests/dev.
///
/// One write lock covers the code counter and the entry map, so code assignment and
/// version checks are atomic with the write they guard.
#[derive(Debug, Default)]
pub struct InMemoryLedgerRepository {
    inner: RwLock<State>,
}

impl InMemoryLedgerRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> StorageError {
    StorageError::Backend("ledger lock poisoned".to_string())
}

#[async_trait]
impl LedgerRepository for InMemoryLedgerRepository {
    async fn insert(&self, mut entry: LedgerEntry) -> Result<LedgerEntry, StorageError> {
        let mut state = self.inner.write().map_err(|_| poisoned())?;

        let key = (entry.tenant_id, entry.id);
        if state.entries.contains_key(&key) {
            return Err(StorageError::Conflict(format!("entry {} already exists", entry.id)));
        }

        let code = state.last_code.entry(entry.tenant_id).or_insert(0);
        *code += 1;
        entry.code = *code;

        state.entries.insert(key, entry.clone());
        Ok(entry)
    }

    async fn get(&self, tenant_id: TenantId, id: EntryId) -> Result<Option<LedgerEntry>, StorageError> {
        let state = self.inner.read().map_err(|_| poisoned())?;
        Ok(state.entries.get(&(tenant_id, id)).cloned())
    }

    async fn replace(&self, entry: &LedgerEntry, expected: ExpectedVersion) -> Result<(), StorageError> {
        let mut state = self.inner.write().map_err(|_| poisoned())?;

        let stored = state
            .entries
            .get_mut(&(entry.tenant_id, entry.id))
            .ok_or_else(|| StorageError::NotFound(format!("entry {}", entry.id)))?;

        if !expected.matches(stored.version) {
            return Err(StorageError::Conflict(format!(
                "entry {} is at version {}, expected {:?}",
                entry.id, stored.version, expected
            )));
        }

        *stored = entry.clone();
        Ok(())
    }

    async fn list(&self, tenant_id: TenantId, filter: &EntryFilter) -> Result<Vec<LedgerEntry>, StorageError> {
        let state = self.inner.read().map_err(|_| poisoned())?;

        let mut out: Vec<LedgerEntry> = state
            .entries
            .iter()
            .filter(|((t, _), e)| *t == tenant_id && filter.matches(e))
            .map(|(_, e)| e.clone())
            .collect();
        drop(state);

        sort_entries(&mut out);
        Ok(out)
    }

    async fn chart_account_in_use(&self, id: ChartAccountId) -> Result<bool, StorageError> {
        let state = self.inner.read().map_err(|_| poisoned())?;
        Ok(state
            .entries
            .values()
            .filter(|e| !e.is_deleted())
            .any(|e| e.splits.iter().any(|s| s.chart_account_id == id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cashbook_core::{AccountId, Money};
    use cashbook_ledger::{DocumentInfo, EntryDraft, Operation};
    use chrono::{NaiveDate, Utc};

    fn entry(tenant_id: TenantId, day: u32) -> LedgerEntry {
        let draft = EntryDraft {
            issue_date: NaiveDate::from_ymd_opt(2026, 5, day).unwrap(),
            payment_date: None,
            account_id: AccountId::new(),
            document: DocumentInfo::default(),
            amount: Money::from_cents(100),
            operation: Operation::Credit,
            history: None,
            confirmed: None,
            print_on_close: false,
            splits: vec![],
        };
        LedgerEntry::from_draft(tenant_id, 0, draft, false, Utc::now())
    }

    #[tokio::test]
    async fn codes_are_sequential_per_tenant() {
        let repo = InMemoryLedgerRepository::new();
        let t1 = TenantId::new();
        let t2 = TenantId::new();

        let a = repo.insert(entry(t1, 1)).await.unwrap();
        let b = repo.insert(entry(t1, 1)).await.unwrap();
        let c = repo.insert(entry(t2, 1)).await.unwrap();

        assert_eq!((a.code, b.code, c.code), (1, 2, 1));
        assert!(repo.get(t2, a.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn replace_checks_the_stored_version() {
        let repo = InMemoryLedgerRepository::new();
        let tenant = TenantId::new();
        let stored = repo.insert(entry(tenant, 2)).await.unwrap();

        let mut next = stored.clone();
        next.confirmed = true;
        next.version = 2;
        repo.replace(&next, ExpectedVersion::Exact(1)).await.unwrap();

        let mut stale = stored.clone();
        stale.version = 2;
        let err = repo.replace(&stale, ExpectedVersion::Exact(1)).await.unwrap_err();
        assert!(matches!(err, StorageError::Conflict(_)));

        let current = repo.get(tenant, stored.id).await.unwrap().unwrap();
        assert!(current.confirmed);
    }

    #[tokio::test]
    async fn list_is_tenant_scoped_and_ordered() {
        let repo = InMemoryLedgerRepository::new();
        let tenant = TenantId::new();
        repo.insert(entry(tenant, 9)).await.unwrap();
        repo.insert(entry(tenant, 3)).await.unwrap();
        repo.insert(entry(TenantId::new(), 1)).await.unwrap();

        let listed = repo.list(tenant, &EntryFilter::default()).await.unwrap();
        let days: Vec<u32> = listed.iter().map(|e| chrono::Datelike::day(&e.issue_date)).collect();
        assert_eq!(days, vec![3, 9]);
    }

    proptest::proptest! {
        #[test]
        fn listing_follows_issue_date_then_code(days in proptest::collection::vec(1u32..=28, 1..30)) {
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let repo = InMemoryLedgerRepository::new();
            let tenant = TenantId::new();

            let listed = rt.block_on(async {
                for day in &days {
                    repo.insert(entry(tenant, *day)).await.unwrap();
                }
                repo.list(tenant, &EntryFilter::default()).await.unwrap()
            });

            proptest::prop_assert_eq!(listed.len(), days.len());
            for pair in listed.windows(2) {
                proptest::prop_assert!(pair[0].ordering_key() < pair[1].ordering_key());
            }
        }
    }
}
