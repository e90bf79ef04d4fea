//! In-memory tenant directory.

use std::path::Path;

use anyhow::Context as _;
use async_trait::async_trait;
use dashmap::DashMap;
use tenantgate_core::{TenantContext, TenantDirectory, TenantId};
use tracing::info;

/// Metadata key holding the domain a tenant is served under.
pub const DOMAIN_METADATA_KEY: &str = "domain";

/// Directory backed by a concurrent in-memory map.
///
/// Domain lookups match the tenant's `domain` metadata string, ignoring
/// ASCII case.
///
/// Changes made through [`StaticDirectory::upsert`] and
/// [`StaticDirectory::remove`] are visible to the next directory call, but
/// a resolver that already cached a tenant keeps serving its old context
/// until the cache entry is invalidated.
#[derive(Debug, Default)]
pub struct StaticDirectory {
    tenants: DashMap<TenantId, TenantContext>,
}

impl StaticDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads tenants from a JSON array of tenant contexts.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a JSON array
    /// of tenant contexts.
    pub async fn load_json(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = tokio::fs::read(path)
            .await
            .with_context(|| format!("failed to read tenants file {}", path.display()))?;
        let contexts: Vec<TenantContext> = serde_json::from_slice(&raw)
            .with_context(|| format!("invalid tenants file {}", path.display()))?;

        let directory: Self = contexts.into_iter().collect();
        info!(path = %path.display(), tenants = directory.len(), "loaded tenant directory");
        Ok(directory)
    }

    /// Inserts or replaces a tenant, returning the previous context.
    pub fn upsert(&self, context: TenantContext) -> Option<TenantContext> {
        self.tenants.insert(context.tenant_id().clone(), context)
    }

    pub fn remove(&self, id: &TenantId) -> Option<TenantContext> {
        self.tenants.remove(id).map(|(_, context)| context)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tenants.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tenants.is_empty()
    }
}

impl FromIterator<TenantContext> for StaticDirectory {
    fn from_iter<I: IntoIterator<Item = TenantContext>>(iter: I) -> Self {
        let directory = Self::new();
        for context in iter {
            directory.upsert(context);
        }
        directory
    }
}

#[async_trait]
impl TenantDirectory for StaticDirectory {
    async fn get_context(&self, id: &TenantId) -> anyhow::Result<Option<TenantContext>> {
        Ok(self.tenants.get(id).map(|entry| entry.value().clone()))
    }

    async fn get_context_by_domain(&self, domain: &str) -> anyhow::Result<Option<TenantContext>> {
        Ok(self
            .tenants
            .iter()
            .find(|entry| {
                entry
                    .value()
                    .metadata()
                    .get(DOMAIN_METADATA_KEY)
                    .and_then(serde_json::Value::as_str)
                    .is_some_and(|owned| owned.eq_ignore_ascii_case(domain))
            })
            .map(|entry| entry.value().clone()))
    }
}
