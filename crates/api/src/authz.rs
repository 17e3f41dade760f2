//! API-side authorization guard for read routes.
//!
//! Write paths authorize inside the engine services; reads go straight to the
//! store, so the permission check happens here before the query.

use chrono::Utc;

use assetbook_auth::{authorize, AuthzError, Permission, TenantResolver};
use assetbook_core::TenantId;

use crate::context::PrincipalContext;

/// Resolve the caller's tenant scope and require `permission` within it.
pub fn authorize_read(
    resolver: &dyn TenantResolver,
    principal: &PrincipalContext,
    permission: &Permission,
) -> Result<TenantId, AuthzError> {
    let resolved = resolver.resolve(principal.claims(), Utc::now())?;
    authorize(&resolved, permission)?;
    Ok(resolved.tenant_id())
}
