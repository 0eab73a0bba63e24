//! Cache backend trait and read-through statistics.

use std::time::Duration;

use async_trait::async_trait;
use ledger_core::{CacheResult, Ledger, LedgerId};

/// Key-value cache for ledgers.
///
/// Lookups are tri-state: `Ok(Some(_))` is a hit, `Ok(None)` an explicit
/// miss (absent or expired), `Err(_)` a backend failure. Implementations
/// must report failures as errors, never panic.
#[async_trait]
pub trait LedgerCache: Send + Sync {
    /// Get the ledger cached under `id`.
    async fn get(&self, id: &LedgerId) -> CacheResult<Option<Ledger>>;

    /// Cache `ledger` under its own id for `ttl`.
    async fn set(&self, ledger: &Ledger, ttl: Duration) -> CacheResult<()>;
}

/// Counters kept by the read-through accessor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups answered from the cache.
    pub hits: u64,
    /// Lookups that found nothing usable in the cache.
    pub misses: u64,
    /// Cache reads that failed and fell back to the store.
    pub cache_errors: u64,
    /// Successful backfills after a store hit.
    pub backfills: u64,
    /// Backfills that failed. The lookup itself still succeeded.
    pub backfill_failures: u64,
}

impl CacheStats {
    /// Calculate the hit rate (0.0 to 1.0). Cache errors count as misses.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses + self.cache_errors;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_stats_hit_rate() {
        let stats = CacheStats {
            hits: 75,
            misses: 20,
            cache_errors: 5,
            ..Default::default()
        };
        assert!((stats.hit_rate() - 0.75).abs() < 0.001);

        let empty_stats = CacheStats::default();
        assert!((empty_stats.hit_rate() - 0.0).abs() < 0.001);
    }
}
