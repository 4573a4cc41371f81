//! `cashbook-core`: engine foundation building blocks.
//!
//! Pure primitives shared by every crate: identifiers, money, versions, errors.

pub mod entity;
pub mod error;
pub mod id;
pub mod money;
pub mod version;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{AccountId, ChartAccountId, CostCenterId, EntryId, SplitId, TenantId, UserId};
pub use money::Money;
pub use version::ExpectedVersion;
