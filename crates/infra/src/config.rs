//! Process configuration, read from the environment.

use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

use cashbook_observability::LogFormat;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEV_JWT_SECRET: &str = "dev-secret";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("CASHBOOK_BIND_ADDR '{0}' is not a socket address")]
    InvalidBindAddr(String),

    #[error("CASHBOOK_LOG_FORMAT: {0}")]
    InvalidLogFormat(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    pub log_format: LogFormat,
    /// Postgres connection string; in-memory storage when unset.
    pub database_url: Option<String>,
    /// JSON-lines audit file; audit goes to the tracing subscriber when unset.
    pub audit_log: Option<PathBuf>,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup (the environment in production).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let raw_addr = non_empty("CASHBOOK_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = raw_addr
            .parse()
            .map_err(|_| ConfigError::InvalidBindAddr(raw_addr.clone()))?;

        let jwt_secret = non_empty("JWT_SECRET").unwrap_or_else(|| DEV_JWT_SECRET.to_string());

        let log_format = match non_empty("CASHBOOK_LOG_FORMAT") {
            Some(v) => v
                .parse()
                .map_err(|e: cashbook_observability::ParseLogFormatError| ConfigError::InvalidLogFormat(e.to_string()))?,
            None => LogFormat::default(),
        };

        Ok(Self {
            bind_addr,
            jwt_secret,
            log_format,
            database_url: non_empty("DATABASE_URL"),
            audit_log: non_empty("CASHBOOK_AUDIT_LOG").map(PathBuf::from),
        })
    }

    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: ([0, 0, 0, 0], 8080).into(),
            jwt_secret: DEV_JWT_SECRET.to_string(),
            log_format: LogFormat::default(),
            database_url: None,
            audit_log: None,
        }
    }
}
