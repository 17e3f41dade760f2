//! `assetbook-core` — shared domain building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! identifiers, the domain error model, money and accounting periods.

pub mod entity;
pub mod error;
pub mod id;
pub mod money;
pub mod period;
pub mod tenant;
pub mod value_object;
pub mod version;

pub use entity::Entity;
pub use error::DomainError;
pub use id::{AssetId, EntryId, EventId, RunId, TenantId, UserId};
pub use money::{Money, CURRENCY_SCALE};
pub use period::Period;
pub use tenant::TenantScoped;
pub use value_object::ValueObject;
pub use version::ExpectedVersion;
