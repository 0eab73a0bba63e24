//! LMDB-backed ledger cache.
//!
//! Uses the heed crate (Rust bindings for LMDB) for a memory-mapped
//! key-value store shared by every process that opens the same directory.
//!
//! # Entry Format
//!
//! Keys are the ledger id bytes. Values are
//! `[expires_at millis: 8 bytes LE][JSON ledger]`. LMDB has no native
//! expiry, so an entry past its deadline reads as a miss and is overwritten
//! by the next backfill.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};
use ledger_core::{CacheError, CacheResult, Ledger, LedgerError, LedgerId};

use super::traits::LedgerCache;
use crate::config::CacheConfig;

const EXPIRY_PREFIX_LEN: usize = 8;

/// Error type for LMDB cache operations.
#[derive(Debug, thiserror::Error)]
pub enum LmdbCacheError {
    /// Failed to open or create the LMDB environment.
    #[error("Failed to open LMDB environment: {0}")]
    EnvOpen(String),

    /// Failed to open the database within the environment.
    #[error("Failed to open database: {0}")]
    DbOpen(String),

    /// Transaction error.
    #[error("Transaction error: {0}")]
    Transaction(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Deserialization error.
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<LmdbCacheError> for CacheError {
    fn from(e: LmdbCacheError) -> Self {
        match e {
            LmdbCacheError::Serialization(reason) => CacheError::Encode { reason },
            LmdbCacheError::Deserialization(reason) => CacheError::Decode { reason },
            LmdbCacheError::Transaction(reason) => CacheError::Transaction { reason },
            other => CacheError::Unavailable {
                reason: other.to_string(),
            },
        }
    }
}

impl From<LmdbCacheError> for LedgerError {
    fn from(e: LmdbCacheError) -> Self {
        LedgerError::config(e.to_string())
    }
}

/// LMDB-backed ledger cache.
///
/// # Example
///
/// ```ignore
/// let cache = LmdbLedgerCache::new("/var/cache/ledgers", 256)?;
/// cache.set(&ledger, Duration::from_secs(86_400)).await?;
/// let cached = cache.get(&ledger.id).await?;
/// ```
pub struct LmdbLedgerCache {
    /// The LMDB environment.
    env: Env,
    /// The main database (single unnamed database).
    db: Database<Bytes, Bytes>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl LmdbLedgerCache {
    /// Open (or create) a cache in `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The directory cannot be created
    /// - LMDB environment cannot be opened
    /// - Database cannot be created
    pub fn new<P: AsRef<Path>>(path: P, max_size_mb: usize) -> Result<Self, LmdbCacheError> {
        let map_size = max_size_mb
            .checked_mul(1024 * 1024)
            .ok_or_else(|| {
                LmdbCacheError::EnvOpen(format!("map size of {} MB overflows usize", max_size_mb))
            })?;

        std::fs::create_dir_all(&path)?;

        // SAFETY: the environment is opened once per cache instance and the
        // memory map is never resized or truncated behind heed's back.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(1)
                .open(path.as_ref())
        }
        .map_err(|e| LmdbCacheError::EnvOpen(e.to_string()))?;

        let mut wtxn = env
            .write_txn()
            .map_err(|e| LmdbCacheError::Transaction(e.to_string()))?;

        let db: Database<Bytes, Bytes> = env
            .create_database(&mut wtxn, None)
            .map_err(|e| LmdbCacheError::DbOpen(e.to_string()))?;

        wtxn.commit()
            .map_err(|e| LmdbCacheError::Transaction(e.to_string()))?;

        Ok(Self {
            env,
            db,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        })
    }

    /// Open a cache from configuration.
    pub fn from_config(config: &CacheConfig) -> Result<Self, LmdbCacheError> {
        Self::new(&config.path, config.max_size_mb)
    }

    /// Number of stored entries, expired ones included.
    pub fn entry_count(&self) -> Result<u64, LmdbCacheError> {
        let rtxn = self
            .env
            .read_txn()
            .map_err(|e| LmdbCacheError::Transaction(e.to_string()))?;
        self.db
            .len(&rtxn)
            .map_err(|e| LmdbCacheError::Transaction(e.to_string()))
    }

    /// Backend-level (hits, misses).
    pub fn hit_miss_counts(&self) -> (u64, u64) {
        (
            self.hits.load(Ordering::Relaxed),
            self.misses.load(Ordering::Relaxed),
        )
    }

    fn encode_entry(ledger: &Ledger, expires_at: DateTime<Utc>) -> Result<Vec<u8>, LmdbCacheError> {
        let value_bytes = serde_json::to_vec(ledger)
            .map_err(|e| LmdbCacheError::Serialization(e.to_string()))?;

        let mut full_bytes = Vec::with_capacity(EXPIRY_PREFIX_LEN + value_bytes.len());
        full_bytes.extend_from_slice(&expires_at.timestamp_millis().to_le_bytes());
        full_bytes.extend_from_slice(&value_bytes);
        Ok(full_bytes)
    }

    /// Decode an entry. `None` means the entry has expired.
    fn decode_entry(bytes: &[u8], now: DateTime<Utc>) -> Result<Option<Ledger>, LmdbCacheError> {
        if bytes.len() < EXPIRY_PREFIX_LEN {
            return Err(LmdbCacheError::Deserialization(
                "entry shorter than expiry prefix".into(),
            ));
        }

        let expiry_bytes: [u8; EXPIRY_PREFIX_LEN] = bytes[..EXPIRY_PREFIX_LEN]
            .try_into()
            .map_err(|_| LmdbCacheError::Deserialization("Invalid expiry".into()))?;
        if i64::from_le_bytes(expiry_bytes) <= now.timestamp_millis() {
            return Ok(None);
        }

        serde_json::from_slice(&bytes[EXPIRY_PREFIX_LEN..])
            .map(Some)
            .map_err(|e| LmdbCacheError::Deserialization(e.to_string()))
    }

    fn record(&self, hit: bool) {
        let counter = if hit { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

#[async_trait]
impl LedgerCache for LmdbLedgerCache {
    async fn get(&self, id: &LedgerId) -> CacheResult<Option<Ledger>> {
        let rtxn = self
            .env
            .read_txn()
            .map_err(|e| LmdbCacheError::Transaction(e.to_string()))?;

        let bytes = self
            .db
            .get(&rtxn, id.as_str().as_bytes())
            .map_err(|e| LmdbCacheError::Transaction(e.to_string()))?;

        let cached = match bytes {
            Some(bytes) => Self::decode_entry(bytes, Utc::now())?,
            None => None,
        };
        self.record(cached.is_some());
        Ok(cached)
    }

    async fn set(&self, ledger: &Ledger, ttl: Duration) -> CacheResult<()> {
        if ledger.id.is_empty() {
            return Err(CacheError::Encode {
                reason: "refusing to cache a ledger without an id".to_string(),
            });
        }

        let ttl = chrono::Duration::from_std(ttl).map_err(|e| CacheError::Encode {
            reason: format!("ttl out of range: {}", e),
        })?;
        let expires_at = Utc::now()
            .checked_add_signed(ttl)
            .ok_or_else(|| CacheError::Encode {
                reason: format!("ttl out of range: {}s", ttl.num_seconds()),
            })?;
        let full_bytes = Self::encode_entry(ledger, expires_at)?;

        let mut wtxn = self
            .env
            .write_txn()
            .map_err(|e| LmdbCacheError::Transaction(e.to_string()))?;

        self.db
            .put(&mut wtxn, ledger.id.as_str().as_bytes(), &full_bytes)
            .map_err(|e| LmdbCacheError::Transaction(e.to_string()))?;

        wtxn.commit()
            .map_err(|e| LmdbCacheError::Transaction(e.to_string()))?;

        Ok(())
    }
}
