//! Directory doubles shared by unit tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tenantgate_core::{TenantContext, TenantDirectory, TenantId};

/// In-memory directory that counts calls and can be made slow or failing.
#[derive(Debug, Default)]
pub(crate) struct CountingDirectory {
    tenants: DashMap<TenantId, TenantContext>,
    domains: DashMap<String, TenantId>,
    calls: AtomicUsize,
    last_span: Mutex<Option<&'static str>>,
    failing: AtomicBool,
    delay: Option<Duration>,
}

impl CountingDirectory {
    pub(crate) fn with_tenants<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let directory = Self::default();
        for name in names {
            let id = TenantId::new(name).unwrap();
            directory.add(TenantContext::new(id).with_schema(name));
        }
        directory
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn add(&self, context: TenantContext) {
        self.tenants.insert(context.tenant_id().clone(), context);
    }

    pub(crate) fn add_domain(&self, domain: &str, tenant: &str) {
        self.domains
            .insert(domain.to_string(), TenantId::new(tenant).unwrap());
    }

    pub(crate) fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Name of the span the most recent `get_context` call ran in.
    pub(crate) fn last_span(&self) -> Option<&'static str> {
        *self.last_span.lock().unwrap()
    }
}

#[async_trait]
impl TenantDirectory for CountingDirectory {
    async fn get_context(&self, id: &TenantId) -> anyhow::Result<Option<TenantContext>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_span.lock().unwrap() = tracing::Span::current().metadata().map(|m| m.name());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            anyhow::bail!("directory unreachable");
        }
        Ok(self.tenants.get(id).map(|entry| entry.value().clone()))
    }

    async fn get_context_by_domain(&self, domain: &str) -> anyhow::Result<Option<TenantContext>> {
        if self.failing.load(Ordering::SeqCst) {
            anyhow::bail!("directory unreachable");
        }
        Ok(self
            .domains
            .get(domain)
            .and_then(|id| self.tenants.get(id.value()).map(|entry| entry.value().clone())))
    }
}
