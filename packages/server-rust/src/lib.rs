//! `TenantGate` Server — tenant resolution cache, request injection layer, and HTTP gateway.

pub mod config;
pub mod directory;
pub mod error;
pub mod middleware;
pub mod network;
pub mod observability;
pub mod resolver;

#[cfg(test)]
mod test_support;

pub use error::TenantRejection;
pub use middleware::{
    current_tenant, require_tenant_context, with_tenant, CurrentTenant, CurrentTenantId,
    TenantInjector, TenantLayer, TenantScope,
};
pub use resolver::{ResolveError, TenantCache, TenantResolver};
