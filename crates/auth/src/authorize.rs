use thiserror::Error;

use assetbook_core::TenantId;

use crate::{Permission, PrincipalId, TenantMembership, TokenValidationError};

/// A fully resolved principal for authorization decisions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub principal_id: PrincipalId,
    pub active_tenant_id: TenantId,
    pub membership: TenantMembership,
}

impl Principal {
    pub fn tenant_id(&self) -> TenantId {
        self.active_tenant_id
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("unauthenticated: {0}")]
    Unauthenticated(#[from] TokenValidationError),

    #[error("tenant mismatch")]
    TenantMismatch,

    #[error("forbidden: missing permission '{0}'")]
    Forbidden(String),
}

/// Authorize a principal within its active tenant context.
///
/// - No IO
/// - No panics
/// - No business logic (pure policy check)
pub fn authorize(principal: &Principal, required: &Permission) -> Result<(), AuthzError> {
    if principal.active_tenant_id != principal.membership.tenant_id {
        return Err(AuthzError::TenantMismatch);
    }

    let granted = principal
        .membership
        .permissions
        .iter()
        .any(|p| p.is_wildcard() || p == required);

    if granted {
        Ok(())
    } else {
        Err(AuthzError::Forbidden(required.as_str().to_string()))
    }
}

/// Cross-check a caller-supplied tenant against the principal's verified scope.
///
/// Returns the authoritative tenant; the requested value is only ever compared,
/// never used on its own.
pub fn ensure_scope(principal: &Principal, requested: TenantId) -> Result<TenantId, AuthzError> {
    if principal.active_tenant_id != requested || principal.membership.tenant_id != requested {
        tracing::warn!(
            principal_id = %principal.principal_id,
            active_tenant_id = %principal.active_tenant_id,
            requested_tenant_id = %requested,
            "rejected cross-tenant request"
        );
        return Err(AuthzError::TenantMismatch);
    }
    Ok(principal.active_tenant_id)
}
