//! PostgreSQL ledger store.
//!
//! Uses a deadpool-postgres connection pool and parameterized queries
//! against the `ledgers` table. Schema management belongs to the host;
//! [`LEDGERS_TABLE_DDL`] documents the expected shape.

use std::sync::Arc;

use async_trait::async_trait;
use deadpool_postgres::{Pool, PoolError};
use ledger_core::{CreationClock, Ledger, LedgerError, LedgerId, LedgerResult, NewLedger};
use serde_json::Value as JsonValue;
use tokio_postgres::Row;

use super::{prepare_insert, LedgerRow, LedgerStore};
use crate::config::DbConfig;

/// Expected shape of the `ledgers` table.
pub const LEDGERS_TABLE_DDL: &str = "CREATE TABLE IF NOT EXISTS ledgers (
    ledger_id  TEXT PRIMARY KEY,
    name       TEXT NOT NULL,
    meta_data  JSONB NOT NULL,
    created_at TIMESTAMPTZ NOT NULL
)";

const INSERT_LEDGER: &str =
    "INSERT INTO ledgers (ledger_id, name, meta_data, created_at) VALUES ($1, $2, $3, $4)";

const SELECT_ALL_LEDGERS: &str =
    "SELECT ledger_id, name, meta_data, created_at FROM ledgers ORDER BY created_at, ledger_id";

const SELECT_LEDGER_BY_ID: &str =
    "SELECT ledger_id, name, meta_data, created_at FROM ledgers WHERE ledger_id = $1";

/// Ledger store backed by PostgreSQL.
#[derive(Clone)]
pub struct PgLedgerStore {
    pool: Pool,
    clock: Arc<CreationClock>,
}

impl PgLedgerStore {
    /// Create a new store with the given pool.
    pub fn new(pool: Pool) -> Self {
        Self {
            pool,
            clock: Arc::new(CreationClock::new()),
        }
    }

    /// Create a new store from configuration.
    pub fn from_config(config: &DbConfig) -> LedgerResult<Self> {
        let pool = config.create_pool()?;
        Ok(Self::new(pool))
    }

    /// Get the current pool size for observability.
    pub fn pool_size(&self) -> usize {
        self.pool.status().size
    }

    /// Apply [`LEDGERS_TABLE_DDL`]. Intended for tests and local setups.
    pub async fn ensure_schema(&self) -> LedgerResult<()> {
        let conn = self.pool.get().await.map_err(write_pool_error)?;
        conn.batch_execute(LEDGERS_TABLE_DDL)
            .await
            .map_err(|e| LedgerError::store_write(e.to_string()))
    }
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    #[tracing::instrument(skip(self, new), fields(name = %new.name), err)]
    async fn create(&self, new: NewLedger) -> LedgerResult<Ledger> {
        let (ledger, row) = prepare_insert(new, self.clock.now())?;

        let conn = self.pool.get().await.map_err(write_pool_error)?;
        conn.execute(
            INSERT_LEDGER,
            &[&row.ledger_id, &row.name, &row.meta_data, &row.created_at],
        )
        .await
        .map_err(|e| LedgerError::store_write(e.to_string()))?;

        tracing::debug!(ledger_id = %ledger.id, "ledger created");
        Ok(ledger)
    }

    #[tracing::instrument(skip(self), err)]
    async fn list_all(&self) -> LedgerResult<Vec<Ledger>> {
        let conn = self.pool.get().await.map_err(read_pool_error)?;
        let rows = conn
            .query(SELECT_ALL_LEDGERS, &[])
            .await
            .map_err(|e| LedgerError::store_read(e.to_string()))?;

        rows.iter()
            .map(|row| ledger_row(row)?.into_ledger())
            .collect()
    }

    #[tracing::instrument(skip_all, fields(ledger_id = %id), err)]
    async fn get_by_id(&self, id: &LedgerId) -> LedgerResult<Ledger> {
        let conn = self.pool.get().await.map_err(read_pool_error)?;
        let row = conn
            .query_opt(SELECT_LEDGER_BY_ID, &[&id.as_str()])
            .await
            .map_err(|e| LedgerError::store_read(e.to_string()))?;

        match row {
            Some(row) => ledger_row(&row)?.into_ledger(),
            None => Err(LedgerError::not_found(id)),
        }
    }
}

/// Extract a [`LedgerRow`] from a result row.
///
/// A metadata column that cannot be read as JSON is corruption; any other
/// column failure is a read failure.
fn ledger_row(row: &Row) -> LedgerResult<LedgerRow> {
    let meta_data: JsonValue = row
        .try_get("meta_data")
        .map_err(|e| LedgerError::serialization(e.to_string()))?;

    Ok(LedgerRow {
        ledger_id: row
            .try_get("ledger_id")
            .map_err(|e| LedgerError::store_read(e.to_string()))?,
        name: row
            .try_get("name")
            .map_err(|e| LedgerError::store_read(e.to_string()))?,
        meta_data,
        created_at: row
            .try_get("created_at")
            .map_err(|e| LedgerError::store_read(e.to_string()))?,
    })
}

fn write_pool_error(err: PoolError) -> LedgerError {
    tracing::error!("Connection pool error: {:?}", err);
    LedgerError::store_write(format!("Failed to acquire database connection: {}", err))
}

fn read_pool_error(err: PoolError) -> LedgerError {
    tracing::error!("Connection pool error: {:?}", err);
    LedgerError::store_read(format!("Failed to acquire database connection: {}", err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn unreachable_store() -> PgLedgerStore {
        let config = DbConfig {
            host: "127.0.0.1".to_string(),
            port: 1,
            timeout: Duration::from_millis(200),
            ..DbConfig::default()
        };
        PgLedgerStore::from_config(&config).expect("pool creation is lazy")
    }

    #[tokio::test]
    async fn test_create_against_unreachable_db_is_write_error() {
        let store = unreachable_store();
        let err = store.create(NewLedger::new("treasury")).await.unwrap_err();
        assert!(matches!(err, LedgerError::StoreWrite { .. }), "{err:?}");
    }

    #[tokio::test]
    async fn test_reads_against_unreachable_db_are_read_errors() {
        let store = unreachable_store();

        let err = store.list_all().await.unwrap_err();
        assert!(matches!(err, LedgerError::StoreRead { .. }), "{err:?}");

        let err = store
            .get_by_id(&LedgerId::new("ldg_missing"))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::StoreRead { .. }), "{err:?}");
        assert_eq!(store.pool_size(), 0);
    }
}
