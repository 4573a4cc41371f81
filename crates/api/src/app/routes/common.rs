use cashbook_auth::Permission;
use cashbook_ledger::Actor;

use crate::app::errors;
use crate::context::{PrincipalContext, TenantContext};

/// Authorize the request for `required`, mapping a denial to a 403 response.
pub fn require(
    tenant: &TenantContext,
    principal: &PrincipalContext,
    required: &Permission,
) -> Result<Actor, axum::response::Response> {
    crate::authz::authorize_request(tenant, principal, required).map_err(|e| {
        tracing::debug!(user_id = %principal.user_id(), permission = %required, "permission denied");
        errors::authz_error_to_response(e)
    })
}
