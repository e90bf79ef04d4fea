//! Tenant resolution: cache first, directory on miss.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use dashmap::DashMap;
use tenantgate_core::{TenantContext, TenantDirectory, TenantId};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, Instrument};

use super::cache::TenantCache;

/// Errors from resolving a tenant identifier.
///
/// "Tenant does not exist" is `Ok(None)`, never an error.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("tenant directory lookup for '{tenant_id}' failed: {source}")]
    Directory {
        tenant_id: TenantId,
        #[source]
        source: anyhow::Error,
    },

    #[error("tenant directory lookup for domain '{domain}' failed: {source}")]
    Domain {
        domain: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Counters describing resolver behaviour since startup.
#[derive(Debug, Default)]
pub struct ResolverStats {
    hits: AtomicU64,
    misses: AtomicU64,
    not_found: AtomicU64,
    directory_errors: AtomicU64,
}

/// Point-in-time copy of [`ResolverStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct ResolverStatsSnapshot {
    /// Lookups answered from the cache.
    pub hits: u64,
    /// Lookups that called the directory.
    pub misses: u64,
    /// Directory calls that found no tenant.
    pub not_found: u64,
    /// Directory calls that failed.
    pub directory_errors: u64,
}

impl ResolverStats {
    #[must_use]
    pub fn snapshot(&self) -> ResolverStatsSnapshot {
        ResolverStatsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            not_found: self.not_found.load(Ordering::Relaxed),
            directory_errors: self.directory_errors.load(Ordering::Relaxed),
        }
    }
}

struct ResolverInner {
    directory: Arc<dyn TenantDirectory>,
    cache: TenantCache,
    /// One async mutex per tenant currently being loaded.
    inflight: DashMap<TenantId, Arc<Mutex<()>>>,
    stats: ResolverStats,
}

/// Turns tenant identifiers into shared [`TenantContext`]s.
///
/// Cheap to clone; all clones share one cache. Concurrent cold lookups of
/// the same identifier are collapsed into a single directory call. Negative
/// results and directory failures are never cached.
#[derive(Clone)]
pub struct TenantResolver {
    inner: Arc<ResolverInner>,
}

impl std::fmt::Debug for TenantResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TenantResolver")
            .field("cached", &self.inner.cache.len())
            .field("inflight", &self.inner.inflight.len())
            .finish_non_exhaustive()
    }
}

impl TenantResolver {
    #[must_use]
    pub fn new(directory: Arc<dyn TenantDirectory>) -> Self {
        Self::with_cache(directory, TenantCache::new())
    }

    /// Creates a resolver whose cached contexts expire after `ttl`.
    #[must_use]
    pub fn with_cache_ttl(directory: Arc<dyn TenantDirectory>, ttl: Duration) -> Self {
        Self::with_cache(directory, TenantCache::with_ttl(ttl))
    }

    fn with_cache(directory: Arc<dyn TenantDirectory>, cache: TenantCache) -> Self {
        Self {
            inner: Arc::new(ResolverInner {
                directory,
                cache,
                inflight: DashMap::new(),
                stats: ResolverStats::default(),
            }),
        }
    }

    /// The shared cache, for explicit invalidation.
    #[must_use]
    pub fn cache(&self) -> &TenantCache {
        &self.inner.cache
    }

    #[must_use]
    pub fn stats(&self) -> ResolverStatsSnapshot {
        self.inner.stats.snapshot()
    }

    /// Resolves `id` to its context, or `None` if the directory does not know it.
    ///
    /// The directory call runs on its own task: if the caller is dropped
    /// mid-lookup, the lookup still completes and populates the cache.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Directory`] if the directory call fails.
    pub async fn resolve(&self, id: &TenantId) -> Result<Option<Arc<TenantContext>>, ResolveError> {
        if let Some(context) = self.inner.cache.get(id) {
            self.inner.stats.hits.fetch_add(1, Ordering::Relaxed);
            debug!(tenant_id = %id, "tenant cache hit");
            return Ok(Some(context));
        }

        let inner = Arc::clone(&self.inner);
        let owned = id.clone();
        tokio::spawn(async move { inner.load(owned).await }.in_current_span())
            .await
            .map_err(|join_err| ResolveError::Directory {
                tenant_id: id.clone(),
                source: anyhow::Error::new(join_err),
            })?
    }

    /// Resolves the tenant that owns `domain`.
    ///
    /// Domain lookups always reach the directory. A found context is stored
    /// under its tenant identifier, so later [`TenantResolver::resolve`]
    /// calls for that tenant are cache hits.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Domain`] if the directory call fails.
    pub async fn resolve_domain(
        &self,
        domain: &str,
    ) -> Result<Option<Arc<TenantContext>>, ResolveError> {
        match self.inner.directory.get_context_by_domain(domain).await {
            Ok(Some(context)) => {
                let id = context.tenant_id().clone();
                let context = self.inner.cache.insert(id, context);
                debug!(domain, tenant_id = %context.tenant_id(), "tenant resolved by domain");
                Ok(Some(context))
            }
            Ok(None) => {
                debug!(domain, "no tenant owns domain");
                Ok(None)
            }
            Err(source) => {
                self.inner.stats.directory_errors.fetch_add(1, Ordering::Relaxed);
                error!(domain, error = %source, "tenant directory domain lookup failed");
                Err(ResolveError::Domain {
                    domain: domain.to_string(),
                    source,
                })
            }
        }
    }

    /// Periodically drops expired cache entries.
    ///
    /// The task holds only a weak handle and stops once every resolver
    /// clone is gone. Without a cache TTL there is nothing to purge and the
    /// task exits immediately.
    pub fn spawn_cache_cleanup(&self, every: Duration) -> JoinHandle<()> {
        let weak: Weak<ResolverInner> = Arc::downgrade(&self.inner);
        let has_ttl = self.inner.cache.ttl().is_some();
        tokio::spawn(async move {
            if !has_ttl {
                return;
            }
            let mut ticker = tokio::time::interval(every);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                let purged = inner.cache.purge_expired();
                if purged > 0 {
                    debug!(purged, remaining = inner.cache.len(), "purged expired tenant contexts");
                }
            }
        })
    }
}

impl ResolverInner {
    async fn load(&self, id: TenantId) -> Result<Option<Arc<TenantContext>>, ResolveError> {
        let gate = Arc::clone(self.inflight.entry(id.clone()).or_default().value());
        let result = {
            let _guard = gate.lock().await;
            self.load_locked(&id).await
        };

        // Whoever releases the last outside handle removes the gate. New
        // waiters clone it under the shard lock, so the count is stable here.
        let released = Arc::as_ptr(&gate);
        drop(gate);
        self.inflight.remove_if(&id, |_, current| {
            Arc::as_ptr(current) == released && Arc::strong_count(current) == 1
        });
        result
    }

    async fn load_locked(&self, id: &TenantId) -> Result<Option<Arc<TenantContext>>, ResolveError> {
        // Another task may have finished the same lookup while we waited.
        if let Some(context) = self.cache.get(id) {
            self.stats.hits.fetch_add(1, Ordering::Relaxed);
            debug!(tenant_id = %id, "tenant resolved by concurrent lookup");
            return Ok(Some(context));
        }

        self.stats.misses.fetch_add(1, Ordering::Relaxed);
        match self.directory.get_context(id).await {
            Ok(Some(context)) => {
                let context = self.cache.insert(id.clone(), context);
                info!(
                    tenant_id = %id,
                    isolation = ?context.isolation(),
                    "tenant resolved from directory"
                );
                Ok(Some(context))
            }
            Ok(None) => {
                self.stats.not_found.fetch_add(1, Ordering::Relaxed);
                debug!(tenant_id = %id, "tenant not found in directory");
                Ok(None)
            }
            Err(source) => {
                self.stats.directory_errors.fetch_add(1, Ordering::Relaxed);
                error!(tenant_id = %id, error = %source, "tenant directory lookup failed");
                Err(ResolveError::Directory {
                    tenant_id: id.clone(),
                    source,
                })
            }
        }
    }
}
