use std::str::FromStr;

use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use cashbook_auth::AuthzError;
use cashbook_core::DomainError;

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    let status = match &err {
        DomainError::Validation(_) | DomainError::InvalidId(_) => StatusCode::BAD_REQUEST,
        DomainError::NotFound(_) => StatusCode::NOT_FOUND,
        DomainError::Conflict(_) => StatusCode::CONFLICT,
        DomainError::Unauthorized => StatusCode::FORBIDDEN,
        DomainError::Storage(_) => {
            tracing::error!(error = %err, "storage failure");
            StatusCode::SERVICE_UNAVAILABLE
        }
    };
    json_error(status, err.code(), err.to_string())
}

pub fn authz_error_to_response(err: AuthzError) -> axum::response::Response {
    json_error(StatusCode::FORBIDDEN, "forbidden", err.to_string())
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

/// Parse an identifier taken from a path or query string.
pub fn parse_id<T: FromStr>(raw: &str, what: &str) -> Result<T, axum::response::Response> {
    raw.parse()
        .map_err(|_| domain_error_to_response(DomainError::invalid_id(format!("invalid {what} id '{raw}'"))))
}
