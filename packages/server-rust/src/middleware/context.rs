//! Task-local access to the request's tenant.
//!
//! [`TenantLayer`](super::TenantLayer) runs every bound request inside
//! [`with_tenant`], so code below the handler can read the tenant without
//! threading an extractor through. Tasks started with `tokio::spawn` do not
//! inherit the scope; wrap them in [`with_tenant`] explicitly.

use std::future::Future;
use std::sync::Arc;

use tenantgate_core::TenantContext;

use crate::error::TenantRejection;

tokio::task_local! {
    static CURRENT_TENANT: Arc<TenantContext>;
}

/// Runs `fut` with `context` as the current tenant.
pub async fn with_tenant<F: Future>(context: Arc<TenantContext>, fut: F) -> F::Output {
    CURRENT_TENANT.scope(context, fut).await
}

/// The tenant of the running task, or `None` outside a tenant scope.
#[must_use]
pub fn current_tenant() -> Option<Arc<TenantContext>> {
    CURRENT_TENANT.try_with(Arc::clone).ok()
}

/// The tenant of the running task.
///
/// # Errors
///
/// Returns [`TenantRejection::ContextUnavailable`] outside a tenant scope.
pub fn require_tenant_context() -> Result<Arc<TenantContext>, TenantRejection> {
    current_tenant().ok_or(TenantRejection::ContextUnavailable)
}
