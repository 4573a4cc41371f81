use serde::{Deserialize, Serialize};

use cashbook_core::{TenantId, UserId};

use crate::{JwtClaims, Permission, Role};

/// A user's membership in a tenant: the roles held there and what they grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantMembership {
    pub tenant_id: TenantId,
    pub roles: Vec<Role>,
    pub permissions: Vec<Permission>,
}

impl TenantMembership {
    /// Membership with the permissions of `roles`, deduplicated.
    pub fn from_roles(tenant_id: TenantId, roles: Vec<Role>) -> Self {
        let mut permissions: Vec<Permission> = Vec::new();
        for p in roles.iter().flat_map(Role::permissions) {
            if !permissions.contains(&p) {
                permissions.push(p);
            }
        }
        Self {
            tenant_id,
            roles,
            permissions,
        }
    }
}

/// A fully resolved principal for authorization decisions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: UserId,
    pub active_tenant_id: TenantId,
    pub membership: TenantMembership,
}

impl Principal {
    pub fn from_claims(claims: &JwtClaims) -> Self {
        Self {
            user_id: claims.sub,
            active_tenant_id: claims.tenant_id,
            membership: TenantMembership::from_roles(claims.tenant_id, claims.roles.clone()),
        }
    }

    pub fn is_privileged(&self) -> bool {
        self.membership.roles.iter().any(Role::is_privileged)
    }
}
