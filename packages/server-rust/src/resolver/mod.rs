//! Tenant resolution and the shared context cache.
//!
//! - [`cache`]: concurrent identifier → context memo
//! - [`resolve`]: cache-first lookup with single-flight directory calls

pub mod cache;
pub mod resolve;

pub use cache::TenantCache;
pub use resolve::{ResolveError, ResolverStats, ResolverStatsSnapshot, TenantResolver};
