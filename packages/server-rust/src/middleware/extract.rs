//! Request-scoped tenant state and the axum extractors that read it.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use tenantgate_core::{TenantContext, TenantId};

use crate::error::TenantRejection;

/// Tenant bound to one request by [`TenantLayer`](super::TenantLayer).
///
/// Always present once the layer has let a request through. Both fields are
/// `None` when the policy allowed the request to proceed without a tenant.
#[derive(Debug, Clone, Default)]
pub struct TenantScope {
    tenant_id: Option<TenantId>,
    context: Option<Arc<TenantContext>>,
}

impl TenantScope {
    #[must_use]
    pub fn bound(tenant_id: TenantId, context: Arc<TenantContext>) -> Self {
        Self {
            tenant_id: Some(tenant_id),
            context: Some(context),
        }
    }

    #[must_use]
    pub fn absent() -> Self {
        Self::default()
    }

    /// The identifier the request was resolved with.
    #[must_use]
    pub fn tenant_id(&self) -> Option<&TenantId> {
        self.tenant_id.as_ref()
    }

    #[must_use]
    pub fn context(&self) -> Option<&Arc<TenantContext>> {
        self.context.as_ref()
    }

    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.context.is_some()
    }

    /// Writes this scope into request extensions.
    ///
    /// A bound scope also exposes the context and identifier directly so
    /// handlers can extract them without going through the scope.
    pub(crate) fn attach(self, extensions: &mut axum::http::Extensions) {
        if let (Some(id), Some(context)) = (&self.tenant_id, &self.context) {
            extensions.insert(Arc::clone(context));
            extensions.insert(id.clone());
        }
        extensions.insert(self);
    }
}

impl<S> FromRequestParts<S> for TenantScope
where
    S: Send + Sync,
{
    type Rejection = TenantRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<TenantScope>()
            .cloned()
            .ok_or(TenantRejection::ContextUnavailable)
    }
}

/// The resolved tenant context; rejects with 400 when none is bound.
#[derive(Debug, Clone)]
pub struct CurrentTenant(pub Arc<TenantContext>);

impl<S> FromRequestParts<S> for CurrentTenant
where
    S: Send + Sync,
{
    type Rejection = TenantRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Arc<TenantContext>>()
            .cloned()
            .map(Self)
            .ok_or(TenantRejection::ContextUnavailable)
    }
}

/// The raw resolved tenant identifier; rejects with 400 when none is bound.
#[derive(Debug, Clone)]
pub struct CurrentTenantId(pub TenantId);

impl<S> FromRequestParts<S> for CurrentTenantId
where
    S: Send + Sync,
{
    type Rejection = TenantRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<TenantId>()
            .cloned()
            .map(Self)
            .ok_or(TenantRejection::IdUnavailable)
    }
}
