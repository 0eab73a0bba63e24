//! Read-through cache accessor.
//!
//! Point lookups check the cache, fall back to the store on a miss and
//! backfill the cache from the store's answer. Creation and enumeration go
//! straight to the store.
//!
//! # Consistency
//!
//! A cache entry is only ever written as a copy of a row the store just
//! returned, so a hit is indistinguishable from a store read. The cache
//! never answers "not found": a miss always consults the store. Cache
//! failures are absorbed here and never change the outcome of a call.
//!
//! Ledgers have no update or delete path. Anything that adds one must
//! invalidate or refresh the cache entry for the affected id; until then
//! the entry TTL is the only staleness bound.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ledger_core::{Ledger, LedgerId, LedgerResult, NewLedger};

use super::traits::{CacheStats, LedgerCache};
use crate::config::DEFAULT_CACHE_TTL;
use crate::store::LedgerStore;

#[derive(Debug, Default)]
struct StatsCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    cache_errors: AtomicU64,
    backfills: AtomicU64,
    backfill_failures: AtomicU64,
}

impl StatsCounters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            cache_errors: self.cache_errors.load(Ordering::Relaxed),
            backfills: self.backfills.load(Ordering::Relaxed),
            backfill_failures: self.backfill_failures.load(Ordering::Relaxed),
        }
    }
}

/// Store wrapper that serves point lookups through a cache.
///
/// # Type Parameters
///
/// - `S`: The authoritative ledger store
/// - `C`: The cache backend
///
/// # Example
///
/// ```ignore
/// let ledgers = CachedLedgerStore::new(store, cache, Duration::from_secs(86_400));
///
/// let created = ledgers.create(NewLedger::new("treasury")).await?;
/// // First lookup reads the store and backfills the cache.
/// let ledger = ledgers.get(&created.id).await?;
/// // Second lookup is served by the cache.
/// let ledger = ledgers.get(&created.id).await?;
/// ```
pub struct CachedLedgerStore<S, C>
where
    S: LedgerStore,
    C: LedgerCache,
{
    store: Arc<S>,
    cache: Arc<C>,
    /// Expiration horizon for backfilled entries.
    ttl: Duration,
    stats: Arc<StatsCounters>,
}

impl<S, C> CachedLedgerStore<S, C>
where
    S: LedgerStore,
    C: LedgerCache,
{
    pub fn new(store: Arc<S>, cache: Arc<C>, ttl: Duration) -> Self {
        Self {
            store,
            cache,
            ttl,
            stats: Arc::new(StatsCounters::default()),
        }
    }

    /// Create an accessor with the default one-day TTL.
    pub fn with_defaults(store: Arc<S>, cache: Arc<C>) -> Self {
        Self::new(store, cache, DEFAULT_CACHE_TTL)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Snapshot of hit, miss and backfill counters.
    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot()
    }

    /// Create a ledger. The cache is not touched.
    pub async fn create(&self, new: NewLedger) -> LedgerResult<Ledger> {
        self.store.create(new).await
    }

    /// List every ledger. The cache is not touched.
    pub async fn list_all(&self) -> LedgerResult<Vec<Ledger>> {
        self.store.list_all().await
    }

    /// Look up a ledger, cache first.
    ///
    /// Store errors, `NotFound` included, are returned unchanged. Cache
    /// errors never are.
    #[tracing::instrument(skip_all, fields(ledger_id = %id))]
    pub async fn get(&self, id: &LedgerId) -> LedgerResult<Ledger> {
        if let Some(ledger) = self.lookup_cache(id).await {
            return Ok(ledger);
        }

        let ledger = self.store.get_by_id(id).await?;
        self.backfill(id, &ledger).await;
        Ok(ledger)
    }

    /// Returns a cached ledger only if it is usable for `id`.
    async fn lookup_cache(&self, id: &LedgerId) -> Option<Ledger> {
        match self.cache.get(id).await {
            Ok(Some(ledger)) if !ledger.id.is_empty() && ledger.id == *id => {
                StatsCounters::bump(&self.stats.hits);
                tracing::debug!("cache hit");
                Some(ledger)
            }
            Ok(Some(ledger)) => {
                // Placeholder or foreign record under this key.
                StatsCounters::bump(&self.stats.misses);
                tracing::debug!(cached_id = %ledger.id, "ignoring unusable cache entry");
                None
            }
            Ok(None) => {
                StatsCounters::bump(&self.stats.misses);
                tracing::debug!("cache miss");
                None
            }
            Err(e) => {
                StatsCounters::bump(&self.stats.cache_errors);
                tracing::warn!(error = %e, "cache read failed, falling back to store");
                None
            }
        }
    }

    async fn backfill(&self, id: &LedgerId, ledger: &Ledger) {
        match self.cache.set(ledger, self.ttl).await {
            Ok(()) => StatsCounters::bump(&self.stats.backfills),
            Err(e) => {
                StatsCounters::bump(&self.stats.backfill_failures);
                tracing::warn!(ledger_id = %id, error = %e, "Failed to set ledger in cache");
            }
        }
    }
}

impl<S, C> Clone for CachedLedgerStore<S, C>
where
    S: LedgerStore,
    C: LedgerCache,
{
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            cache: Arc::clone(&self.cache),
            ttl: self.ttl,
            stats: Arc::clone(&self.stats),
        }
    }
}

/// The accessor is itself a store: `get_by_id` is the read-through lookup.
#[async_trait]
impl<S, C> LedgerStore for CachedLedgerStore<S, C>
where
    S: LedgerStore,
    C: LedgerCache,
{
    async fn create(&self, new: NewLedger) -> LedgerResult<Ledger> {
        CachedLedgerStore::create(self, new).await
    }

    async fn list_all(&self) -> LedgerResult<Vec<Ledger>> {
        CachedLedgerStore::list_all(self).await
    }

    async fn get_by_id(&self, id: &LedgerId) -> LedgerResult<Ledger> {
        self.get(id).await
    }
}
