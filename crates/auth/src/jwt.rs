//! Bearer token verification.

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;

use crate::{JwtClaims, TokenValidationError, validate_claims};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum JwtError {
    #[error("malformed or badly signed token: {0}")]
    Invalid(String),

    #[error(transparent)]
    Claims(#[from] TokenValidationError),

    #[error("failed to sign token: {0}")]
    Signing(String),
}

/// Verifies a raw bearer token and returns its claims.
pub trait JwtValidator: Send + Sync {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, JwtError>;
}

/// Shared-secret HS256 tokens.
///
/// Expiry lives in `expires_at` rather than the registered `exp` claim, so the library's own
/// time checks are off and [`validate_claims`] does that work.
#[derive(Clone)]
pub struct Hs256JwtValidator {
    decoding: DecodingKey,
    encoding: EncodingKey,
    validation: Validation,
}

impl Hs256JwtValidator {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.required_spec_claims.clear();
        validation.validate_exp = false;
        validation.validate_aud = false;

        Self {
            decoding: DecodingKey::from_secret(secret),
            encoding: EncodingKey::from_secret(secret),
            validation,
        }
    }

    /// Sign `claims` with the same secret. Used by tooling and tests.
    pub fn sign(&self, claims: &JwtClaims) -> Result<String, JwtError> {
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| JwtError::Signing(e.to_string()))
    }
}

impl core::fmt::Debug for Hs256JwtValidator {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Hs256JwtValidator").finish_non_exhaustive()
    }
}

impl JwtValidator for Hs256JwtValidator {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, JwtError> {
        let data = jsonwebtoken::decode::<JwtClaims>(token, &self.decoding, &self.validation).map_err(|e| {
            tracing::debug!(error = %e, "rejected bearer token");
            JwtError::Invalid(e.to_string())
        })?;

        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Role;
    use cashbook_core::{TenantId, UserId};
    use chrono::Duration;

    fn claims(now: DateTime<Utc>) -> JwtClaims {
        JwtClaims::new(UserId::new(), TenantId::new(), vec![Role::BOOKKEEPER], now, Duration::hours(1))
    }

    #[test]
    fn signed_tokens_round_trip() {
        let jwt = Hs256JwtValidator::new(b"secret");
        let now = Utc::now();
        let c = claims(now);

        let token = jwt.sign(&c).unwrap();
        assert_eq!(jwt.validate(&token, now).unwrap(), c);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let now = Utc::now();
        let token = Hs256JwtValidator::new(b"one").sign(&claims(now)).unwrap();
        let err = Hs256JwtValidator::new(b"two").validate(&token, now).unwrap_err();
        assert!(matches!(err, JwtError::Invalid(_)));
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let jwt = Hs256JwtValidator::new(b"secret");
        let now = Utc::now();
        let token = jwt.sign(&claims(now)).unwrap();

        let err = jwt.validate(&token, now + Duration::hours(2)).unwrap_err();
        assert_eq!(err, JwtError::Claims(TokenValidationError::Expired));
    }

    #[test]
    fn garbage_is_rejected() {
        let jwt = Hs256JwtValidator::new(b"secret");
        assert!(matches!(jwt.validate("not.a.token", Utc::now()), Err(JwtError::Invalid(_))));
    }
}
