//! Ready-made [`TenantDirectory`](tenantgate_core::TenantDirectory) implementations.
//!
//! Production deployments usually plug in their own database-backed
//! directory; these cover static and single-tenant setups.

pub mod fixed;
pub mod memory;

pub use fixed::FixedDirectory;
pub use memory::{StaticDirectory, DOMAIN_METADATA_KEY};
