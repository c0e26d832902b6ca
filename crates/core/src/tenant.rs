//! Tenant-scoped execution context.

use serde::{Deserialize, Serialize};

use crate::id::TenantId;

/// Mandatory tenant scope for every ledger/watchdog/alert operation.
///
/// Tenant isolation is enforced structurally: service operations take a
/// `TenantContext` as their first argument instead of relying on call-site
/// discipline to thread a raw `TenantId` through every query. The context is
/// deliberately opaque about everything except the tenant it scopes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
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

impl From<TenantId> for TenantContext {
    fn from(tenant_id: TenantId) -> Self {
        Self::new(tenant_id)
    }
}
