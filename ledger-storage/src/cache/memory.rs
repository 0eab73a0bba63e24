//! Process-local ledger cache with the same expiry semantics as LMDB.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use ledger_core::{CacheError, CacheResult, Ledger, LedgerId};

use super::traits::LedgerCache;

#[derive(Debug, Default)]
pub struct InMemoryLedgerCache {
    entries: RwLock<HashMap<LedgerId, (Ledger, Instant)>>,
}

impl InMemoryLedgerCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, including expired ones not yet evicted.
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned() -> CacheError {
    CacheError::Unavailable {
        reason: "cache lock poisoned".to_string(),
    }
}

#[async_trait]
impl LedgerCache for InMemoryLedgerCache {
    async fn get(&self, id: &LedgerId) -> CacheResult<Option<Ledger>> {
        let now = Instant::now();
        {
            let entries = self.entries.read().map_err(|_| poisoned())?;
            match entries.get(id) {
                None => return Ok(None),
                Some((ledger, expires_at)) if *expires_at > now => {
                    return Ok(Some(ledger.clone()))
                }
                Some(_) => {}
            }
        }

        // Expired: evict unless a concurrent set refreshed it.
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        if entries
            .get(id)
            .is_some_and(|(_, expires_at)| *expires_at <= now)
        {
            entries.remove(id);
        }
        Ok(None)
    }

    async fn set(&self, ledger: &Ledger, ttl: Duration) -> CacheResult<()> {
        if ledger.id.is_empty() {
            return Err(CacheError::Encode {
                reason: "refusing to cache a ledger without an id".to_string(),
            });
        }
        let expires_at = Instant::now()
            .checked_add(ttl)
            .ok_or_else(|| CacheError::Encode {
                reason: format!("ttl out of range: {}s", ttl.as_secs()),
            })?;
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        entries.insert(ledger.id.clone(), (ledger.clone(), expires_at));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use ledger_core::NewLedger;

    #[tokio::test]
    async fn test_set_get_and_expiry() {
        let cache = InMemoryLedgerCache::new();
        let ledger = NewLedger::new("ops").into_ledger(LedgerId::generate(), Utc::now());

        assert!(cache.get(&ledger.id).await.unwrap().is_none());

        cache.set(&ledger, Duration::from_secs(60)).await.unwrap();
        assert_eq!(cache.get(&ledger.id).await.unwrap(), Some(ledger.clone()));

        cache.set(&ledger, Duration::ZERO).await.unwrap();
        assert_eq!(cache.len(), 1);
        assert!(cache.get(&ledger.id).await.unwrap().is_none());
        assert!(cache.is_empty(), "expired entry should be evicted on read");
    }

    #[tokio::test]
    async fn test_unrepresentable_ttl_is_an_error() {
        let cache = InMemoryLedgerCache::new();
        let ledger = NewLedger::new("ops").into_ledger(LedgerId::generate(), Utc::now());

        let err = cache
            .set(&ledger, Duration::from_secs(u64::MAX))
            .await
            .unwrap_err();
        assert!(matches!(err, CacheError::Encode { .. }));
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_refuses_ledger_without_id() {
        let cache = InMemoryLedgerCache::new();
        assert!(cache
            .set(&Ledger::default(), Duration::from_secs(60))
            .await
            .is_err());
        assert!(cache.is_empty());
    }
}
