//! `cashbook-auth`: authentication/authorization boundary.
//!
//! Decoupled from HTTP and storage: it turns a bearer token into a [`Principal`] and
//! answers permission checks against it.

pub mod authorize;
pub mod claims;
pub mod jwt;
pub mod permissions;
pub mod principal;
pub mod roles;

pub use authorize::{AuthzError, authorize};
pub use claims::{JwtClaims, TokenValidationError, validate_claims};
pub use jwt::{Hs256JwtValidator, JwtError, JwtValidator};
pub use permissions::Permission;
pub use principal::{Principal, TenantMembership};
pub use roles::Role;
