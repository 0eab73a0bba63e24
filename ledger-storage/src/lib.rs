//! Ledger Storage - Durable Store and Read-Through Cache
//!
//! - [`store`]: the authoritative [`LedgerStore`] (PostgreSQL, in-memory)
//! - [`cache`]: cache backends (LMDB, in-memory) and the
//!   [`CachedLedgerStore`] accessor that serves point lookups cache-first
//!
//! Creation and enumeration always go to the store. Point lookups go cache,
//! then store on a miss, then backfill the cache.

pub mod cache;
pub mod config;
pub mod store;
pub mod telemetry;

pub use cache::{
    CacheStats, CachedLedgerStore, InMemoryLedgerCache, LedgerCache, LmdbCacheError,
    LmdbLedgerCache,
};
pub use config::{CacheConfig, DbConfig, DEFAULT_CACHE_TTL};
pub use store::{InMemoryLedgerStore, LedgerRow, LedgerStore, PgLedgerStore, LEDGERS_TABLE_DDL};
pub use telemetry::{init_tracing, init_tracing_with, TelemetryConfig};

use std::sync::Arc;

use ledger_core::LedgerResult;

/// Production wiring: Postgres as the store, LMDB as the cache.
pub type PostgresLmdbLedgers = CachedLedgerStore<PgLedgerStore, LmdbLedgerCache>;

/// Build the production accessor from configuration.
///
/// Neither the pool nor the cache connects to anything remote here; the
/// first database round trip happens on the first operation.
pub fn open_postgres_lmdb(
    db_config: &DbConfig,
    cache_config: &CacheConfig,
) -> LedgerResult<PostgresLmdbLedgers> {
    let store = PgLedgerStore::from_config(db_config)?;
    let cache = LmdbLedgerCache::from_config(cache_config)?;
    tracing::info!(
        db_host = %db_config.host,
        db_name = %db_config.dbname,
        cache_path = %cache_config.path.display(),
        ttl_secs = cache_config.ttl.as_secs(),
        "ledger storage opened"
    );
    Ok(CachedLedgerStore::new(
        Arc::new(store),
        Arc::new(cache),
        cache_config.ttl,
    ))
}
