use cashbook_core::{TenantId, UserId};

/// Who is calling the engine.
///
/// Built by the transport layer from an authenticated token; every engine operation takes
/// one so that tenant scoping can never be forgotten.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Actor {
    pub tenant_id: TenantId,
    pub user_id: UserId,
    /// Privileged roles see `super_only` accounts.
    pub privileged: bool,
}

impl Actor {
    pub fn new(tenant_id: TenantId, user_id: UserId) -> Self {
        Self {
            tenant_id,
            user_id,
            privileged: false,
        }
    }

    pub fn privileged(tenant_id: TenantId, user_id: UserId) -> Self {
        Self {
            tenant_id,
            user_id,
            privileged: true,
        }
    }
}
