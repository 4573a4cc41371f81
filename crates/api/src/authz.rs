//! API-side authorization guard.
//!
//! Every domain handler calls [`authorize_request`] before touching a service; the engine
//! itself only sees the resulting [`Actor`].

use cashbook_auth::{AuthzError, Permission, Principal, TenantMembership, authorize};
use cashbook_ledger::Actor;

use crate::context::{PrincipalContext, TenantContext};

/// Check `required` for the current request and build the engine actor.
pub fn authorize_request(
    tenant: &TenantContext,
    principal: &PrincipalContext,
    required: &Permission,
) -> Result<Actor, AuthzError> {
    let principal = Principal {
        user_id: principal.user_id(),
        active_tenant_id: tenant.tenant_id(),
        membership: TenantMembership::from_roles(tenant.tenant_id(), principal.roles().to_vec()),
    };

    authorize(&principal, required)?;

    Ok(Actor {
        tenant_id: principal.active_tenant_id,
        user_id: principal.user_id,
        privileged: principal.is_privileged(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cashbook_auth::Role;
    use cashbook_auth::permissions::{LEDGER_WRITE, REPORTS_READ};
    use cashbook_core::{TenantId, UserId};

    #[test]
    fn actor_carries_tenant_and_privilege() {
        let tenant = TenantContext::new(TenantId::new());
        let owner = PrincipalContext::new(UserId::new(), vec![Role::OWNER]);

        let actor = authorize_request(&tenant, &owner, &LEDGER_WRITE).unwrap();
        assert_eq!(actor.tenant_id, tenant.tenant_id());
        assert_eq!(actor.user_id, owner.user_id());
        assert!(actor.privileged);
    }

    #[test]
    fn missing_permission_is_forbidden() {
        let tenant = TenantContext::new(TenantId::new());
        let nobody = PrincipalContext::new(UserId::new(), vec![Role::new("guest")]);
        assert!(matches!(
            authorize_request(&tenant, &nobody, &REPORTS_READ),
            Err(AuthzError::Forbidden(_))
        ));
    }
}
