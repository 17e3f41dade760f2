use crate::TenantId;

/// Marker for records that belong to exactly one tenant.
///
/// Stores use this to refuse writes whose payload tenant differs from the
/// tenant scope of the call.
pub trait TenantScoped {
    fn tenant_id(&self) -> TenantId;

    fn belongs_to(&self, tenant_id: TenantId) -> bool {
        self.tenant_id() == tenant_id
    }
}
