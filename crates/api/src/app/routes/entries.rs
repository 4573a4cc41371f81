use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use cashbook_auth::permissions::{LEDGER_CONFIRM, LEDGER_READ, LEDGER_WRITE};
use cashbook_core::{EntryId, ExpectedVersion};
use cashbook_ledger::EntryFilter;

use crate::app::routes::common::require;
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::{PrincipalContext, TenantContext};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_entry).get(list_entries))
        .route("/:id", get(get_entry).put(update_entry).delete(delete_entry))
        .route("/:id/confirm", post(confirm_entry))
}

pub async fn create_entry(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<dto::EntryRequest>,
) -> axum::response::Response {
    let actor = match require(&tenant, &principal, &LEDGER_WRITE) {
        Ok(a) => a,
        Err(resp) => return resp,
    };
    let draft = match body.into_draft() {
        Ok(d) => d,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.ledger.post(&actor, draft).await {
        Ok(entry) => (StatusCode::CREATED, Json(dto::entry_to_json(&entry))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn list_entries(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Query(q): Query<dto::ListEntriesQuery>,
) -> axum::response::Response {
    let actor = match require(&tenant, &principal, &LEDGER_READ) {
        Ok(a) => a,
        Err(resp) => return resp,
    };
    let account_id = match q.account_id.as_deref().map(|raw| errors::parse_id(raw, "account")).transpose() {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let filter = EntryFilter {
        date_from: q.from,
        date_to: q.to,
        account_id,
        operation: q.operation,
        confirmed: q.confirmed,
        include_deleted: q.include_deleted,
    };

    match services.ledger.list(&actor, &filter).await {
        Ok(entries) => {
            let items = entries.iter().map(dto::entry_to_json).collect::<Vec<_>>();
            (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
        }
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn get_entry(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let actor = match require(&tenant, &principal, &LEDGER_READ) {
        Ok(a) => a,
        Err(resp) => return resp,
    };
    let id: EntryId = match errors::parse_id(&id, "entry") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.ledger.get(&actor, id).await {
        Ok(entry) => (StatusCode::OK, Json(dto::entry_to_json(&entry))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn update_entry(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::EntryRequest>,
) -> axum::response::Response {
    let actor = match require(&tenant, &principal, &LEDGER_WRITE) {
        Ok(a) => a,
        Err(resp) => return resp,
    };
    let id: EntryId = match errors::parse_id(&id, "entry") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let expected = ExpectedVersion::from(body.version);
    let draft = match body.into_draft() {
        Ok(d) => d,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.ledger.update(&actor, id, draft, expected).await {
        Ok(entry) => (StatusCode::OK, Json(dto::entry_to_json(&entry))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn confirm_entry(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::ConfirmRequest>,
) -> axum::response::Response {
    let actor = match require(&tenant, &principal, &LEDGER_CONFIRM) {
        Ok(a) => a,
        Err(resp) => return resp,
    };
    let id: EntryId = match errors::parse_id(&id, "entry") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.ledger.confirm(&actor, id, body.confirmed).await {
        Ok(entry) => (StatusCode::OK, Json(dto::entry_to_json(&entry))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn delete_entry(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let actor = match require(&tenant, &principal, &LEDGER_WRITE) {
        Ok(a) => a,
        Err(resp) => return resp,
    };
    let id: EntryId = match errors::parse_id(&id, "entry") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.ledger.soft_delete(&actor, id).await {
        Ok(entry) => (StatusCode::OK, Json(dto::entry_to_json(&entry))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}
