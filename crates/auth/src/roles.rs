use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::Permission;
use crate::permissions::{LEDGER_CONFIRM, LEDGER_READ, LEDGER_WRITE, REGISTRY_WRITE, REPORTS_READ};

/// Role name as carried in a token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    /// Everything, including `super_only` accounts.
    pub const ADMIN: Role = Role(Cow::Borrowed("admin"));
    /// Company owner: every ledger permission and `super_only` accounts.
    pub const OWNER: Role = Role(Cow::Borrowed("owner"));
    /// Alias of `owner`.
    pub const SUPER: Role = Role(Cow::Borrowed("super"));
    /// Posts, edits and confirms entries; reads reports.
    pub const BOOKKEEPER: Role = Role(Cow::Borrowed("bookkeeper"));
    /// Reads entries and reports.
    pub const VIEWER: Role = Role(Cow::Borrowed("viewer"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether holders of this role see `super_only` accounts.
    pub fn is_privileged(&self) -> bool {
        *self == Self::ADMIN || *self == Self::OWNER || *self == Self::SUPER
    }

    /// Permissions granted by this role. Unknown roles grant nothing.
    pub fn permissions(&self) -> Vec<Permission> {
        match self.as_str() {
            "admin" => vec![Permission::new("*")],
            "owner" | "super" => vec![LEDGER_READ, LEDGER_WRITE, LEDGER_CONFIRM, REPORTS_READ, REGISTRY_WRITE],
            "bookkeeper" => vec![LEDGER_READ, LEDGER_WRITE, LEDGER_CONFIRM, REPORTS_READ],
            "viewer" => vec![LEDGER_READ, REPORTS_READ],
            _ => Vec::new(),
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
