//! Handlers exposing the tenant bound to the current request.

use axum::Json;
use tenantgate_core::TenantContext;

use crate::middleware::{CurrentTenant, CurrentTenantId};

/// Returns the resolved tenant context as JSON.
pub async fn tenant_handler(CurrentTenant(context): CurrentTenant) -> Json<TenantContext> {
    Json(TenantContext::clone(&context))
}

/// Returns the raw tenant identifier as plain text.
pub async fn tenant_id_handler(CurrentTenantId(id): CurrentTenantId) -> String {
    id.into()
}
