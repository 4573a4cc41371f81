use std::borrow::Cow;

use serde::{Deserialize, Serialize};

pub const LEDGER_READ: Permission = Permission(Cow::Borrowed("ledger.read"));
pub const LEDGER_WRITE: Permission = Permission(Cow::Borrowed("ledger.write"));
pub const LEDGER_CONFIRM: Permission = Permission(Cow::Borrowed("ledger.confirm"));
pub const REPORTS_READ: Permission = Permission(Cow::Borrowed("reports.read"));
pub const REGISTRY_WRITE: Permission = Permission(Cow::Borrowed("registry.write"));

/// Permission identifier, e.g. "ledger.write".
///
/// The wildcard `"*"` grants every permission.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_wildcard(&self) -> bool {
        self.as_str() == "*"
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
