use std::sync::Arc;

use cashbook_core::DomainResult;
use cashbook_infra::audit::{JsonLinesAuditSink, TracingAuditSink};
use cashbook_infra::{
    AuditSink, InMemoryLedgerRepository, InMemoryRegistry, LedgerRepository, LedgerStore, ReportService, Settings,
};

/// Everything the handlers need, shared behind an `Arc`.
#[derive(Clone)]
pub struct AppServices {
    pub ledger: LedgerStore,
    pub reports: ReportService,
    /// Registration data; written through the `/registry` seeding endpoints.
    pub registry: Arc<InMemoryRegistry>,
}

impl AppServices {
    pub fn new(repo: Arc<dyn LedgerRepository>, registry: Arc<InMemoryRegistry>, audit: Arc<dyn AuditSink>) -> Self {
        Self {
            ledger: LedgerStore::new(repo.clone(), registry.clone(), audit),
            reports: ReportService::new(repo, registry.clone()),
            registry,
        }
    }

    /// In-memory wiring (dev/test) with audit records going to the log.
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(InMemoryLedgerRepository::new()),
            Arc::new(InMemoryRegistry::new()),
            Arc::new(TracingAuditSink),
        )
    }
}

/// Wire services from settings: Postgres when a database URL is configured and the
/// `postgres` feature is built in, memory otherwise.
pub async fn build_services(settings: &Settings) -> DomainResult<AppServices> {
    let audit: Arc<dyn AuditSink> = match &settings.audit_log {
        Some(path) => {
            tracing::info!(path = %path.display(), "writing audit records to file");
            Arc::new(JsonLinesAuditSink::new(path.clone()))
        }
        None => Arc::new(TracingAuditSink),
    };

    let repo = ledger_repository(settings).await?;
    Ok(AppServices::new(repo, Arc::new(InMemoryRegistry::new()), audit))
}

#[cfg(feature = "postgres")]
async fn ledger_repository(settings: &Settings) -> DomainResult<Arc<dyn LedgerRepository>> {
    use cashbook_infra::repository::PostgresLedgerRepository;

    match &settings.database_url {
        Some(url) => {
            let repo = PostgresLedgerRepository::connect(url).await?;
            repo.migrate().await?;
            tracing::info!("using postgres ledger repository");
            tracing::warn!("registry is held in memory; accounts, cost centers and chart nodes must be registered again after a restart");
            Ok(Arc::new(repo))
        }
        None => Ok(Arc::new(InMemoryLedgerRepository::new())),
    }
}

#[cfg(not(feature = "postgres"))]
async fn ledger_repository(settings: &Settings) -> DomainResult<Arc<dyn LedgerRepository>> {
    if settings.database_url.is_some() {
        tracing::warn!("DATABASE_URL is set but postgres support is not compiled in; using memory");
    }
    Ok(Arc::new(InMemoryLedgerRepository::new()))
}
