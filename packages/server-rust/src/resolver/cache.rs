//! Process-wide memo of resolved tenant contexts.

use std::sync::Arc;
use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tenantgate_core::{TenantContext, TenantId};
use tokio::time::Instant;

#[derive(Debug)]
struct CacheEntry {
    context: Arc<TenantContext>,
    stored_at: Instant,
}

/// Concurrent map from tenant identifier to resolved context.
///
/// Uses `DashMap` so lookups for different tenants never contend on a
/// single lock. Without a TTL, entries never expire and
/// [`TenantCache::invalidate`] and [`TenantCache::clear`] are the only ways
/// to drop them. With a TTL, an entry older than the TTL reads as absent and
/// the next insert for that key replaces it.
#[derive(Debug, Default)]
pub struct TenantCache {
    entries: DashMap<TenantId, CacheEntry>,
    ttl: Option<Duration>,
}

impl TenantCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a cache whose entries expire `ttl` after they were stored.
    #[must_use]
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl: Some(ttl),
        }
    }

    #[must_use]
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    fn is_expired(&self, entry: &CacheEntry, now: Instant) -> bool {
        self.ttl
            .is_some_and(|ttl| now.saturating_duration_since(entry.stored_at) >= ttl)
    }

    /// Returns the cached context for `id`, if any.
    #[must_use]
    pub fn get(&self, id: &TenantId) -> Option<Arc<TenantContext>> {
        let now = Instant::now();
        {
            let entry = self.entries.get(id)?;
            if !self.is_expired(&entry, now) {
                return Some(Arc::clone(&entry.context));
            }
        }
        self.entries.remove_if(id, |_, entry| self.is_expired(entry, now));
        None
    }

    /// Stores `context` under `id` unless a live entry already exists.
    ///
    /// Returns the stored context, so concurrent inserts for the same key
    /// all hand back the same `Arc`.
    pub fn insert(&self, id: TenantId, context: TenantContext) -> Arc<TenantContext> {
        let now = Instant::now();
        match self.entries.entry(id) {
            Entry::Occupied(mut occupied) => {
                if self.is_expired(occupied.get(), now) {
                    occupied.insert(CacheEntry {
                        context: Arc::new(context),
                        stored_at: now,
                    });
                }
                Arc::clone(&occupied.get().context)
            }
            Entry::Vacant(vacant) => {
                let context = Arc::new(context);
                vacant.insert(CacheEntry {
                    context: Arc::clone(&context),
                    stored_at: now,
                });
                context
            }
        }
    }

    /// Drops the entry for `id`, returning it if present.
    pub fn invalidate(&self, id: &TenantId) -> Option<Arc<TenantContext>> {
        self.entries.remove(id).map(|(_, entry)| entry.context)
    }

    /// Drops every entry.
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Drops every expired entry and returns how many were removed.
    ///
    /// A no-op without a TTL.
    pub fn purge_expired(&self) -> usize {
        if self.ttl.is_none() {
            return 0;
        }
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !self.is_expired(entry, now));
        before.saturating_sub(self.entries.len())
    }

    /// Number of stored entries, expired ones included until purged.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
