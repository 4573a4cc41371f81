use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use cashbook_core::{TenantId, UserId};

use crate::Role;

/// Claims carried by a cashbook bearer token once its signature has been verified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// The user the token was issued to.
    pub sub: UserId,

    /// The company (tenant) every request made with this token is scoped to.
    pub tenant_id: TenantId,

    pub roles: Vec<Role>,

    pub issued_at: DateTime<Utc>,

    pub expires_at: DateTime<Utc>,
}

impl JwtClaims {
    pub fn new(sub: UserId, tenant_id: TenantId, roles: Vec<Role>, issued_at: DateTime<Utc>, ttl: chrono::Duration) -> Self {
        Self {
            sub,
            tenant_id,
            roles,
            issued_at,
            expires_at: issued_at + ttl,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (issued_at is in the future)")]
    NotYetValid,

    #[error("invalid token time window (expires_at <= issued_at)")]
    InvalidTimeWindow,
}

/// Check the token's time window against `now`.
pub fn validate_claims(claims: &JwtClaims, now: DateTime<Utc>) -> Result<(), TokenValidationError> {
    if claims.expires_at <= claims.issued_at {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    if now < claims.issued_at {
        return Err(TokenValidationError::NotYetValid);
    }
    if now >= claims.expires_at {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}
