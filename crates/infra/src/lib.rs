//! Infrastructure layer: storage, registration lookups, audit and the services that tie
//! them to the pure ledger/report logic.

pub mod audit;
pub mod config;
pub mod error;
pub mod ledger_store;
pub mod registry;
pub mod report_service;
pub mod repository;


pub use audit::{AuditAction, AuditError, AuditRecord, AuditSink};
pub use config::{ConfigError, Settings};
pub use error::StorageError;
pub use ledger_store::LedgerStore;
pub use registry::{InMemoryRegistry, Registry};
pub use report_service::{ReportService, StatementQuery};
pub use repository::{InMemoryLedgerRepository, LedgerRepository};
