//! Request-pipeline tenant injection.
//!
//! - [`injector`]: identify → resolve → enforce policy → bind
//! - [`layer`]: Tower layer running the injector ahead of every handler
//! - [`extract`]: request-scoped tenant state and axum extractors
//! - [`context`]: task-local tenant for code below the handler

pub mod context;
pub mod extract;
pub mod injector;
pub mod layer;

pub use context::{current_tenant, require_tenant_context, with_tenant};
pub use extract::{CurrentTenant, CurrentTenantId, TenantScope};
pub use injector::TenantInjector;
pub use layer::{TenantLayer, TenantService};
