use axum::{routing::get, Router};

pub mod common;
pub mod entries;
pub mod registry;
pub mod reports;
pub mod system;

/// Router for all authenticated (tenant-scoped) endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .nest("/entries", entries::router())
        .nest("/reports", reports::router())
        .nest("/registry", registry::router())
}
