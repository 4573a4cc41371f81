//! HTTP application wiring (Axum router + service wiring).
//!
//! - `services.rs`: repository, registry, audit sink and the engine services built on them
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request/response DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower::ServiceBuilder;

use cashbook_core::DomainResult;
use cashbook_infra::Settings;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Router over in-memory services (dev/test).
pub fn build_app(jwt_secret: String) -> Router {
    build_app_with(Arc::new(services::AppServices::in_memory()), jwt_secret)
}

/// Router over services wired from settings (used by `main.rs`).
pub async fn build_app_from_settings(settings: &Settings) -> DomainResult<Router> {
    let services = services::build_services(settings).await?;
    Ok(build_app_with(Arc::new(services), settings.jwt_secret.clone()))
}

pub fn build_app_with(services: Arc<services::AppServices>, jwt_secret: String) -> Router {
    let jwt = Arc::new(cashbook_auth::Hs256JwtValidator::new(jwt_secret.as_bytes()));
    let auth_state = middleware::AuthState { jwt };

    // Protected routes: require auth + tenant context.
    let protected = routes::router()
        .layer(Extension(services))
        .layer(axum::middleware::from_fn_with_state(
            auth_state,
            middleware::auth_middleware,
        ));

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(protected)
        .layer(ServiceBuilder::new())
}
