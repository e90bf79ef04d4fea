//! `tenantgate` binary: a standalone tenant-resolving HTTP gateway.

use std::sync::Arc;

use clap::Parser;
use tenantgate_core::{TenantContext, TenantDirectory};
use tenantgate_server::config::GatewayArgs;
use tenantgate_server::directory::{FixedDirectory, StaticDirectory};
use tenantgate_server::middleware::TenantInjector;
use tenantgate_server::network::GatewayModule;
use tenantgate_server::observability::init_tracing;
use tenantgate_server::resolver::TenantResolver;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = GatewayArgs::parse();
    init_tracing(&args.log_level, args.log_json);

    let policy = args.policy()?;
    let directory: Arc<dyn TenantDirectory> = match (&args.tenants_file, &policy.default_tenant) {
        (Some(path), _) => Arc::new(StaticDirectory::load_json(path).await?),
        (None, Some(default)) => {
            info!(tenant_id = %default, "no tenants file; running single-tenant");
            Arc::new(FixedDirectory::new(TenantContext::new(default.clone())))
        }
        (None, None) => {
            warn!("no tenants file or default tenant configured; every lookup will miss");
            Arc::new(StaticDirectory::new())
        }
    };

    let resolver = match args.cache_ttl() {
        Some(ttl) => {
            let resolver = TenantResolver::with_cache_ttl(directory, ttl);
            resolver.spawn_cache_cleanup(args.cache_cleanup_interval());
            info!(ttl_secs = ttl.as_secs(), "tenant cache expiry enabled");
            resolver
        }
        None => TenantResolver::new(directory),
    };

    let injector = TenantInjector::new(policy, resolver);
    let mut gateway = GatewayModule::new(args.network(), injector);
    let port = gateway.start().await?;
    info!(port, "Starting TenantGate");

    gateway.serve(shutdown_signal()).await
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for ctrl-c; shutting down");
    }
    info!("Shutdown signal received");
}
