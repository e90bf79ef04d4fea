//! Gateway module with deferred startup lifecycle.
//!
//! Implements the deferred startup pattern: `new()` assembles shared state,
//! `start()` binds the TCP listener, and `serve()` starts accepting
//! connections. This separation lets the host application mount its own
//! routes between `new()` and `serve()`.

use std::future::Future;
use std::time::Instant;

use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tracing::info;

use super::config::NetworkConfig;
use super::handlers::{
    health_handler, liveness_handler, tenant_handler, tenant_id_handler, GatewayState,
};
use super::transport::with_transport_layers;
use crate::middleware::{TenantInjector, TenantLayer};

/// Manages the gateway HTTP server lifecycle.
///
/// Follows the deferred startup pattern:
/// 1. `new()` -- takes the configuration and the tenant injector
/// 2. `start()` -- binds TCP listener to the configured address
/// 3. `serve()` -- begins accepting connections until shutdown is signalled
pub struct GatewayModule {
    config: NetworkConfig,
    injector: TenantInjector,
    routes: Router,
    listener: Option<TcpListener>,
}

impl GatewayModule {
    /// Creates a new gateway without binding any port.
    #[must_use]
    pub fn new(config: NetworkConfig, injector: TenantInjector) -> Self {
        Self {
            config,
            injector,
            routes: Router::new(),
            listener: None,
        }
    }

    /// Adds application routes. They run behind the tenant layer.
    #[must_use]
    pub fn with_routes(mut self, routes: Router) -> Self {
        self.routes = self.routes.merge(routes);
        self
    }

    #[must_use]
    pub fn injector(&self) -> &TenantInjector {
        &self.injector
    }

    /// Assembles the axum router with all routes and middleware.
    ///
    /// Routes behind the tenant layer:
    /// - `GET /tenant` -- resolved tenant context as JSON
    /// - `GET /tenant/id` -- raw tenant identifier
    /// - every route added with [`GatewayModule::with_routes`]
    ///
    /// Routes without a tenant:
    /// - `GET /health` -- resolver health JSON
    /// - `GET /health/live` -- liveness probe
    pub fn build_router(&self) -> Router {
        let state = GatewayState {
            injector: self.injector.clone(),
            start_time: Instant::now(),
        };

        let tenant_routes = Router::new()
            .route("/tenant", get(tenant_handler))
            .route("/tenant/id", get(tenant_id_handler))
            .merge(self.routes.clone())
            .layer(TenantLayer::new(self.injector.clone()));

        let probes = Router::new()
            .route("/health", get(health_handler))
            .route("/health/live", get(liveness_handler))
            .with_state(state);

        with_transport_layers(probes.merge(tenant_routes), &self.config)
    }

    /// Binds the TCP listener to the configured host and port.
    ///
    /// Returns the actual bound port, which may differ from the configured
    /// port when port 0 is used (OS-assigned ephemeral port).
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound (e.g., port in use).
    pub async fn start(&mut self) -> anyhow::Result<u16> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = TcpListener::bind(&addr).await?;
        let port = listener.local_addr()?.port();

        info!("TCP listener bound to {}:{}", self.config.host, port);

        self.listener = Some(listener);
        Ok(port)
    }

    /// Serves requests until the shutdown signal fires.
    ///
    /// # Errors
    ///
    /// Returns an error if `start()` was not called first or the server
    /// encounters a fatal I/O error.
    pub async fn serve(
        mut self,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> anyhow::Result<()> {
        let listener = self
            .listener
            .take()
            .ok_or_else(|| anyhow::anyhow!("start() must be called before serve()"))?;
        let router = self.build_router();

        info!(
            strategy = %self.injector.policy().strategy,
            require_tenant = self.injector.policy().require_tenant,
            "Serving tenant gateway"
        );

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await?;

        let stats = self.injector.resolver().stats();
        info!(
            hits = stats.hits,
            misses = stats.misses,
            directory_errors = stats.directory_errors,
            "Gateway stopped"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tenantgate_core::ResolutionPolicy;

    use super::*;
    use crate::resolver::TenantResolver;
    use crate::test_support::CountingDirectory;

    fn module() -> GatewayModule {
        let resolver = TenantResolver::new(Arc::new(CountingDirectory::with_tenants(["acme"])));
        GatewayModule::new(
            NetworkConfig {
                host: "127.0.0.1".to_string(),
                ..NetworkConfig::default()
            },
            TenantInjector::new(ResolutionPolicy::default(), resolver),
        )
    }

    #[test]
    fn new_creates_module_without_binding() {
        assert!(module().listener.is_none());
    }

    #[test]
    fn build_router_creates_router() {
        let _router = module().build_router();
    }

    #[tokio::test]
    async fn start_binds_to_os_assigned_port() {
        let mut module = module();
        let port = module.start().await.expect("start should succeed");
        assert!(port > 0, "OS-assigned port should be > 0");
        assert!(module.listener.is_some());
    }

    #[tokio::test]
    async fn serve_without_start_is_an_error() {
        let err = module().serve(std::future::pending::<()>()).await.unwrap_err();
        assert!(err.to_string().contains("start() must be called before serve()"));
    }
}
