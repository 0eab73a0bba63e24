//! Environment-driven configuration for the store and the cache.

use std::path::PathBuf;
use std::time::Duration;

use deadpool_postgres::{Config, ManagerConfig, Pool, PoolConfig, RecyclingMethod, Runtime, Timeouts};
use ledger_core::{LedgerError, LedgerResult};
use tokio_postgres::NoTls;

/// Default expiration horizon for backfilled cache entries.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

// ============================================================================
// DATABASE
// ============================================================================

/// Database connection pool configuration.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// PostgreSQL host
    pub host: String,
    /// PostgreSQL port
    pub port: u16,
    /// Database name
    pub dbname: String,
    /// Database user
    pub user: String,
    /// Database password
    pub password: String,
    /// Maximum pool size
    pub max_size: usize,
    /// Wait, create and recycle timeout for pooled connections
    pub timeout: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            dbname: "ledgers".to_string(),
            user: "postgres".to_string(),
            password: "".to_string(),
            max_size: 16,
            timeout: Duration::from_secs(30),
        }
    }
}

impl DbConfig {
    /// Create a new database configuration from environment variables.
    ///
    /// - `LEDGER_DB_HOST` (default: localhost)
    /// - `LEDGER_DB_PORT` (default: 5432)
    /// - `LEDGER_DB_NAME` (default: ledgers)
    /// - `LEDGER_DB_USER` (default: postgres)
    /// - `LEDGER_DB_PASSWORD` (default: empty)
    /// - `LEDGER_DB_POOL_SIZE` (default: 16)
    /// - `LEDGER_DB_TIMEOUT`: seconds (default: 30)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("LEDGER_DB_HOST").unwrap_or(defaults.host),
            port: std::env::var("LEDGER_DB_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            dbname: std::env::var("LEDGER_DB_NAME").unwrap_or(defaults.dbname),
            user: std::env::var("LEDGER_DB_USER").unwrap_or(defaults.user),
            password: std::env::var("LEDGER_DB_PASSWORD").unwrap_or_default(),
            max_size: std::env::var("LEDGER_DB_POOL_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_size),
            timeout: std::env::var("LEDGER_DB_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
        }
    }

    /// Create a connection pool from this configuration.
    ///
    /// Connections are opened lazily, so this succeeds without a reachable
    /// server.
    pub fn create_pool(&self) -> LedgerResult<Pool> {
        let mut cfg = Config::new();
        cfg.host = Some(self.host.clone());
        cfg.port = Some(self.port);
        cfg.dbname = Some(self.dbname.clone());
        cfg.user = Some(self.user.clone());
        cfg.password = Some(self.password.clone());

        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });

        let mut timeouts = Timeouts::default();
        timeouts.wait = Some(self.timeout);
        timeouts.create = Some(self.timeout);
        timeouts.recycle = Some(self.timeout);
        let mut pool_config = PoolConfig::new(self.max_size);
        pool_config.timeouts = timeouts;
        cfg.pool = Some(pool_config);

        cfg.create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| LedgerError::config(format!("Failed to create pool: {}", e)))
    }
}

// ============================================================================
// CACHE
// ============================================================================

/// Configuration for the LMDB cache and the read-through accessor.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Directory holding the LMDB environment.
    pub path: PathBuf,
    /// Maximum size of the memory map in megabytes.
    pub max_size_mb: usize,
    /// Expiration horizon for backfilled entries.
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            path: std::env::temp_dir().join("ledger-cache"),
            max_size_mb: 256,
            ttl: DEFAULT_CACHE_TTL,
        }
    }
}

impl CacheConfig {
    /// Create a new cache config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cache configuration from environment variables.
    ///
    /// - `LEDGER_CACHE_PATH` (default: `<tmp>/ledger-cache`)
    /// - `LEDGER_CACHE_MAX_SIZE_MB` (default: 256)
    /// - `LEDGER_CACHE_TTL_SECS` (default: 86400)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            path: std::env::var("LEDGER_CACHE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.path),
            max_size_mb: std::env::var("LEDGER_CACHE_MAX_SIZE_MB")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_size_mb),
            ttl: std::env::var("LEDGER_CACHE_TTL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.ttl),
        }
    }

    /// Set the LMDB directory.
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = path.into();
        self
    }

    /// Set the memory map size.
    pub fn with_max_size_mb(mut self, max_size_mb: usize) -> Self {
        self.max_size_mb = max_size_mb;
        self
    }

    /// Set the entry TTL.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_config_defaults() {
        let config = DbConfig::default();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 5432);
        assert_eq!(config.max_size, 16);
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_cache_config_builder() {
        let config = CacheConfig::new()
            .with_path("/var/cache/ledgers")
            .with_max_size_mb(64)
            .with_ttl(Duration::from_secs(600));

        assert_eq!(config.path, PathBuf::from("/var/cache/ledgers"));
        assert_eq!(config.max_size_mb, 64);
        assert_eq!(config.ttl, Duration::from_secs(600));
    }

    #[test]
    fn test_default_ttl_is_one_day() {
        assert_eq!(CacheConfig::default().ttl, Duration::from_secs(86_400));
    }

    #[tokio::test]
    async fn test_create_pool_is_lazy() {
        let config = DbConfig {
            host: "127.0.0.1".to_string(),
            port: 1,
            ..DbConfig::default()
        };
        let pool = config.create_pool().expect("pool creation should not connect");
        assert_eq!(pool.status().size, 0);
        assert_eq!(pool.status().max_size, 16);
    }
}
