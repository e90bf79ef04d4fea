//! Single-tenant directory.

use async_trait::async_trait;
use tenantgate_core::{TenantContext, TenantDirectory, TenantId};

/// Directory that knows exactly one tenant.
///
/// Pair it with a `default_tenant` policy for single-tenant deployments that
/// still want downstream code to see a bound tenant context.
#[derive(Debug, Clone)]
pub struct FixedDirectory {
    context: TenantContext,
}

impl FixedDirectory {
    #[must_use]
    pub fn new(context: TenantContext) -> Self {
        Self { context }
    }

    #[must_use]
    pub fn tenant_id(&self) -> &TenantId {
        self.context.tenant_id()
    }
}

#[async_trait]
impl TenantDirectory for FixedDirectory {
    async fn get_context(&self, id: &TenantId) -> anyhow::Result<Option<TenantContext>> {
        Ok((id == self.context.tenant_id()).then(|| self.context.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn answers_only_for_its_tenant() {
        let acme = TenantId::new("acme").unwrap();
        let directory = FixedDirectory::new(TenantContext::new(acme.clone()));

        assert!(directory.get_context(&acme).await.unwrap().is_some());
        let other = TenantId::new("globex").unwrap();
        assert!(directory.get_context(&other).await.unwrap().is_none());
    }
}
