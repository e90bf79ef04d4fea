//! Health and liveness endpoint handlers.
//!
//! Mounted outside the tenant layer so probes never need a tenant.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::json;

use super::GatewayState;

/// Returns resolver health as JSON.
///
/// Reports cache size and resolver counters so operators can watch
/// directory error rates.
pub async fn health_handler(State(state): State<GatewayState>) -> Json<serde_json::Value> {
    let resolver = state.injector.resolver();
    let stats = resolver.stats();

    Json(json!({
        "state": "ready",
        "strategy": state.injector.policy().strategy.as_str(),
        "cached_tenants": resolver.cache().len(),
        "resolver": stats,
        "uptime_secs": state.start_time.elapsed().as_secs(),
    }))
}

/// Liveness probe -- always returns 200 OK.
pub async fn liveness_handler() -> StatusCode {
    StatusCode::OK
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Instant;

    use tenantgate_core::{ResolutionPolicy, TenantId};

    use super::*;
    use crate::middleware::TenantInjector;
    use crate::resolver::TenantResolver;
    use crate::test_support::CountingDirectory;

    fn test_state(directory: Arc<CountingDirectory>) -> GatewayState {
        GatewayState {
            injector: TenantInjector::new(
                ResolutionPolicy::default(),
                TenantResolver::new(directory),
            ),
            start_time: Instant::now(),
        }
    }

    #[tokio::test]
    async fn health_handler_reports_resolver_counters() {
        let state = test_state(Arc::new(CountingDirectory::with_tenants(["acme"])));
        let acme = TenantId::new("acme").unwrap();
        let resolver = state.injector.resolver();
        resolver.resolve(&acme).await.unwrap();
        resolver.resolve(&acme).await.unwrap();

        let json = health_handler(State(state)).await.0;
        assert_eq!(json["state"], "ready");
        assert_eq!(json["strategy"], "header");
        assert_eq!(json["cached_tenants"], 1);
        assert_eq!(json["resolver"]["hits"], 1);
        assert_eq!(json["resolver"]["misses"], 1);
        assert_eq!(json["resolver"]["directory_errors"], 0);
        assert!(json["uptime_secs"].is_number());
    }

    #[tokio::test]
    async fn liveness_handler_always_returns_200() {
        assert_eq!(liveness_handler().await, StatusCode::OK);
    }
}
