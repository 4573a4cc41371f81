use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use cashbook_auth::permissions::REPORTS_READ;
use cashbook_infra::StatementQuery;
use cashbook_ledger::DateRange;
use cashbook_reports::DreOptions;

use crate::app::routes::common::require;
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::{PrincipalContext, TenantContext};

pub fn router() -> Router {
    Router::new()
        .route("/statement", get(statement))
        .route("/dre", get(dre))
        .route("/balances", get(balances))
}

pub async fn statement(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Query(params): Query<dto::StatementParams>,
) -> axum::response::Response {
    let actor = match require(&tenant, &principal, &REPORTS_READ) {
        Ok(a) => a,
        Err(resp) => return resp,
    };
    let account_id = match errors::parse_id(&params.account_id, "account") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let range = match DateRange::new(params.from, params.to) {
        Ok(r) => r,
        Err(e) => return errors::domain_error_to_response(e),
    };

    let query = StatementQuery {
        account_id,
        range,
        confirmed: params.confirmed,
        include_deleted: params.include_deleted,
    };
    match services.reports.statement(&actor, query).await {
        Ok(st) => (StatusCode::OK, Json(dto::statement_to_json(&st))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn dre(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Query(params): Query<dto::DreParams>,
) -> axum::response::Response {
    let actor = match require(&tenant, &principal, &REPORTS_READ) {
        Ok(a) => a,
        Err(resp) => return resp,
    };
    let range = match DateRange::new(params.from, params.to) {
        Ok(r) => r,
        Err(e) => return errors::domain_error_to_response(e),
    };

    let options = DreOptions {
        include_empty: params.include_empty,
    };
    match services.reports.dre(&actor, range, options).await {
        Ok(report) => (StatusCode::OK, Json(dto::dre_to_json(&report))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn balances(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Query(params): Query<dto::BalancesParams>,
) -> axum::response::Response {
    let actor = match require(&tenant, &principal, &REPORTS_READ) {
        Ok(a) => a,
        Err(resp) => return resp,
    };

    match services.reports.balances(&actor, params.as_of).await {
        Ok(items) => {
            let items = items.iter().map(dto::balance_to_json).collect::<Vec<_>>();
            (StatusCode::OK, Json(serde_json::json!({ "as_of": params.as_of, "items": items }))).into_response()
        }
        Err(e) => errors::domain_error_to_response(e),
    }
}
