use assetbook_auth::{JwtClaims, PrincipalId, Role};
use assetbook_core::TenantId;

/// Tenant context for a request.
///
/// This is immutable and must be present for all domain routes.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TenantContext {
    tenant_id: TenantId,
}

impl TenantContext {
    pub fn new(tenant_id: TenantId) -> Self {
        Self { tenant_id }
    }

    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }
}

/// Principal context for a request: the verified token claims.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    claims: JwtClaims,
}

impl PrincipalContext {
    pub fn new(claims: JwtClaims) -> Self {
        Self { claims }
    }

    pub fn principal_id(&self) -> PrincipalId {
        self.claims.sub
    }

    pub fn roles(&self) -> &[Role] {
        &self.claims.roles
    }

    /// Caller identity handed to the engine services.
    pub fn claims(&self) -> &JwtClaims {
        &self.claims
    }
}
