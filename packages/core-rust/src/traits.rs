use std::sync::Arc;

use async_trait::async_trait;

use crate::types::{TenantContext, TenantId};

/// Backing tenant directory consulted on cache misses.
/// Implementations: in-memory (tests, static deployments), database (host application).
///
/// Must be safe to call concurrently with arbitrary identifiers.
#[async_trait]
pub trait TenantDirectory: Send + Sync {
    /// Look up the context for `id`.
    ///
    /// `Ok(None)` means the tenant does not exist. `Err` means the directory
    /// could not answer and must not be read as "not found".
    async fn get_context(&self, id: &TenantId) -> anyhow::Result<Option<TenantContext>>;

    /// Look up the tenant that owns `domain`.
    ///
    /// Directories without a domain index know no domains.
    async fn get_context_by_domain(&self, _domain: &str) -> anyhow::Result<Option<TenantContext>> {
        Ok(None)
    }
}

#[async_trait]
impl<T: TenantDirectory + ?Sized> TenantDirectory for Arc<T> {
    async fn get_context(&self, id: &TenantId) -> anyhow::Result<Option<TenantContext>> {
        (**self).get_context(id).await
    }

    async fn get_context_by_domain(&self, domain: &str) -> anyhow::Result<Option<TenantContext>> {
        (**self).get_context_by_domain(domain).await
    }
}
