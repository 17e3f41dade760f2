//! `assetbook-auth` — pure authentication/authorization boundary (zero-trust).
//!
//! This crate is intentionally decoupled from HTTP and storage. It turns a
//! verified caller identity into the tenant scope every engine operation runs
//! under.

pub mod authorize;
pub mod claims;
pub mod permissions;
pub mod principal;
pub mod roles;
pub mod tenant;

pub use authorize::{authorize, ensure_scope, AuthzError, Principal};
pub use claims::{validate_claims, Hs256JwtValidator, JwtClaims, JwtValidator, TokenValidationError};
pub use permissions::Permission;
pub use principal::{PrincipalId, TenantMembership};
pub use roles::Role;
pub use tenant::{ClaimsTenantResolver, TenantResolver};
