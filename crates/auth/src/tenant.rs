//! Tenant resolution: verified identity -> authoritative tenant scope.

use chrono::{DateTime, Utc};

use crate::{validate_claims, AuthzError, JwtClaims, Permission, Principal, TenantMembership};

/// Resolves the tenant scope a caller acts within.
///
/// Implementations derive the scope from verified identity only. Every
/// downstream read and write is filtered by the returned principal's tenant.
pub trait TenantResolver: Send + Sync {
    fn resolve(&self, caller: &JwtClaims, now: DateTime<Utc>) -> Result<Principal, AuthzError>;
}

/// Resolver backed by the tenant claim of a verified token and the built-in
/// role policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClaimsTenantResolver;

impl TenantResolver for ClaimsTenantResolver {
    fn resolve(&self, caller: &JwtClaims, now: DateTime<Utc>) -> Result<Principal, AuthzError> {
        validate_claims(caller, now)?;

        let mut permissions: Vec<Permission> = Vec::new();
        for role in &caller.roles {
            for perm in role.permissions() {
                if !permissions.contains(&perm) {
                    permissions.push(perm);
                }
            }
        }

        Ok(Principal {
            principal_id: caller.sub,
            active_tenant_id: caller.tenant_id,
            membership: TenantMembership {
                tenant_id: caller.tenant_id,
                roles: caller.roles.clone(),
                permissions,
            },
        })
    }
}

impl<T: TenantResolver + ?Sized> TenantResolver for std::sync::Arc<T> {
    fn resolve(&self, caller: &JwtClaims, now: DateTime<Utc>) -> Result<Principal, AuthzError> {
        (**self).resolve(caller, now)
    }
}
