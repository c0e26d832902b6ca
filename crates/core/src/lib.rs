//! Domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! typed identifiers, the domain error model, aggregate execution traits, and
//! fixed-point money/quantity helpers.

pub mod aggregate;
pub mod error;
pub mod id;
pub mod money;
pub mod tenant;

pub use aggregate::{Aggregate, AggregateRoot, ExpectedVersion};
pub use error::{DomainError, DomainResult};
pub use id::{AggregateId, TenantId, UserId};
pub use tenant::TenantContext;
