//! HTTP handler definitions for the `TenantGate` gateway.
//!
//! This module defines `GatewayState` (the shared state carried through axum
//! extractors) and re-exports all handler functions for convenient access
//! when building the router.

pub mod health;
pub mod tenant;

pub use health::{health_handler, liveness_handler};
pub use tenant::{tenant_handler, tenant_id_handler};

use std::time::Instant;

use crate::middleware::TenantInjector;

/// Shared application state passed to gateway handlers via `State` extraction.
///
/// Cloning is cheap: the injector shares its policy and resolver.
#[derive(Debug, Clone)]
pub struct GatewayState {
    /// Injector whose resolver backs the health report.
    pub injector: TenantInjector,
    /// Server process start time, used for uptime calculation.
    pub start_time: Instant,
}
