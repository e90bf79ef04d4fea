//! Per-request tenant decision: identify, resolve, enforce policy, bind.

use std::sync::Arc;

use axum::http::request::Parts;
use tenantgate_core::{identify, Identification, ResolutionPolicy};
use tracing::{debug, warn};

use super::extract::TenantScope;
use crate::error::TenantRejection;
use crate::resolver::TenantResolver;

/// Runs the tenant state machine for one request head.
///
/// `Start → identify → resolve → {bind and proceed, proceed unbound, reject}`.
/// Holds only shared, read-only state, so one injector serves every request.
#[derive(Debug, Clone)]
pub struct TenantInjector {
    policy: Arc<ResolutionPolicy>,
    resolver: TenantResolver,
}

impl TenantInjector {
    #[must_use]
    pub fn new(policy: ResolutionPolicy, resolver: TenantResolver) -> Self {
        Self {
            policy: Arc::new(policy),
            resolver,
        }
    }

    #[must_use]
    pub fn policy(&self) -> &ResolutionPolicy {
        &self.policy
    }

    #[must_use]
    pub fn resolver(&self) -> &TenantResolver {
        &self.resolver
    }

    /// Decides the tenant for a request and binds it into `parts.extensions`.
    ///
    /// On `Ok` the request proceeds with the returned scope attached (bound or
    /// absent). On `Err` the request must not reach downstream handlers.
    ///
    /// # Errors
    ///
    /// - [`TenantRejection::NotIdentified`] when no candidate exists and a tenant is required
    /// - [`TenantRejection::NotFound`] when the candidate is unknown and a tenant is required
    /// - [`TenantRejection::DirectoryUnavailable`] when the directory call fails
    pub async fn inject(&self, parts: &mut Parts) -> Result<TenantScope, TenantRejection> {
        let span = tracing::Span::current();
        let identification = identify(parts, &self.policy);
        span.record("identification", identification.as_str());

        if identification == Identification::PrerequisiteMissing {
            warn!(
                claim = %self.policy.claim_name,
                "token claims missing from request; upstream authentication did not run"
            );
        }

        let Some(tenant_id) = identification.into_candidate() else {
            if self.policy.require_tenant {
                warn!("rejecting request: tenant not identified");
                return Err(TenantRejection::NotIdentified);
            }
            debug!("no tenant identified; proceeding without tenant");
            return Ok(bind(parts, TenantScope::absent()));
        };
        span.record("tenant_id", tenant_id.as_str());

        match self.resolver.resolve(&tenant_id).await {
            Ok(Some(context)) => Ok(bind(parts, TenantScope::bound(tenant_id, context))),
            Ok(None) if self.policy.require_tenant => {
                warn!(tenant_id = %tenant_id, "rejecting request: tenant not found");
                Err(TenantRejection::NotFound(tenant_id))
            }
            Ok(None) => {
                debug!(tenant_id = %tenant_id, "unknown tenant; proceeding without tenant");
                Ok(bind(parts, TenantScope::absent()))
            }
            Err(err) => {
                warn!(error = %err, "rejecting request: tenant directory unavailable");
                Err(TenantRejection::DirectoryUnavailable)
            }
        }
    }
}

fn bind(parts: &mut Parts, scope: TenantScope) -> TenantScope {
    scope.clone().attach(&mut parts.extensions);
    scope
}
