//! Minimal registration endpoints so a tenant can be seeded over HTTP.

use std::sync::Arc;

use axum::{
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};

use cashbook_auth::permissions::{LEDGER_READ, REGISTRY_WRITE};
use cashbook_infra::Registry;

use crate::app::routes::common::require;
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::{PrincipalContext, TenantContext};

pub fn router() -> Router {
    Router::new()
        .route("/accounts", post(create_account).get(list_accounts))
        .route("/cost-centers", post(create_cost_center).get(list_cost_centers))
        .route("/chart-accounts", post(create_chart_account).get(list_chart_accounts))
}

pub async fn create_account(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<dto::CreateAccountRequest>,
) -> axum::response::Response {
    let actor = match require(&tenant, &principal, &REGISTRY_WRITE) {
        Ok(a) => a,
        Err(resp) => return resp,
    };

    match services.registry.add_account(body.into_account(actor.tenant_id)) {
        Ok(account) => {
            tracing::info!(tenant_id = %actor.tenant_id, account_id = %account.id, "account registered");
            (StatusCode::CREATED, Json(dto::account_to_json(&account))).into_response()
        }
        Err(e) => errors::domain_error_to_response(e),
    }
}

/// Accounts the caller may see; `super_only` accounts are left out for regular users.
pub async fn list_accounts(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    let actor = match require(&tenant, &principal, &LEDGER_READ) {
        Ok(a) => a,
        Err(resp) => return resp,
    };

    let mut accounts = services.registry.accounts(actor.tenant_id);
    accounts.retain(|a| a.is_visible_to(&actor));
    accounts.sort_by(|a, b| a.code.cmp(&b.code));
    let items = accounts.iter().map(dto::account_to_json).collect::<Vec<_>>();
    (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
}

pub async fn create_cost_center(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<dto::CreateCostCenterRequest>,
) -> axum::response::Response {
    let actor = match require(&tenant, &principal, &REGISTRY_WRITE) {
        Ok(a) => a,
        Err(resp) => return resp,
    };

    let cost_center = cashbook_ledger::CostCenter::new(actor.tenant_id, body.code, body.description);
    match services.registry.add_cost_center(cost_center) {
        Ok(cc) => (StatusCode::CREATED, Json(dto::cost_center_to_json(&cc))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn list_cost_centers(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    let actor = match require(&tenant, &principal, &LEDGER_READ) {
        Ok(a) => a,
        Err(resp) => return resp,
    };

    let mut items = services.registry.cost_centers(actor.tenant_id);
    items.sort_by(|a, b| a.code.cmp(&b.code));
    let items = items.iter().map(dto::cost_center_to_json).collect::<Vec<_>>();
    (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
}

pub async fn create_chart_account(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<dto::CreateChartAccountRequest>,
) -> axum::response::Response {
    let actor = match require(&tenant, &principal, &REGISTRY_WRITE) {
        Ok(a) => a,
        Err(resp) => return resp,
    };

    let node = body.into_chart_account(actor.tenant_id);
    let in_use = match services.ledger.chart_account_in_use(node.id).await {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };
    match services.registry.upsert_chart_account(actor.tenant_id, node, in_use) {
        Ok(node) => (StatusCode::CREATED, Json(dto::chart_account_to_json(&node))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

/// The tenant's chart in pre-order (global nodes included).
pub async fn list_chart_accounts(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    let actor = match require(&tenant, &principal, &LEDGER_READ) {
        Ok(a) => a,
        Err(resp) => return resp,
    };

    let chart = services.registry.visible_chart(actor.tenant_id);
    let items = chart
        .pre_order()
        .into_iter()
        .map(dto::chart_account_to_json)
        .collect::<Vec<_>>();
    (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
}
