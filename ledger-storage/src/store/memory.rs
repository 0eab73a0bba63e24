//! In-memory ledger store.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use ledger_core::{CreationClock, Ledger, LedgerError, LedgerId, LedgerResult, NewLedger};

use super::{prepare_insert, LedgerRow, LedgerStore};

/// In-memory store for tests and embedded use.
///
/// Rows keep metadata in serialized form, exactly like the Postgres
/// column, so decode failures surface the same way.
#[derive(Debug, Default, Clone)]
pub struct InMemoryLedgerStore {
    rows: Arc<RwLock<HashMap<String, LedgerRow>>>,
    clock: Arc<CreationClock>,
}

impl InMemoryLedgerStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored ledgers.
    pub fn len(&self) -> usize {
        self.rows.read().map(|rows| rows.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Insert a row as-is, bypassing encoding. Lets tests plant rows whose
    /// stored metadata is not a valid document.
    pub fn insert_raw_row(&self, row: LedgerRow) -> LedgerResult<()> {
        let mut rows = self
            .rows
            .write()
            .map_err(|_| LedgerError::store_write("Storage lock poisoned"))?;
        if rows.contains_key(&row.ledger_id) {
            return Err(LedgerError::store_write(format!(
                "duplicate key value violates unique constraint: ledger_id={}",
                row.ledger_id
            )));
        }
        rows.insert(row.ledger_id.clone(), row);
        Ok(())
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn create(&self, new: NewLedger) -> LedgerResult<Ledger> {
        let (ledger, row) = prepare_insert(new, self.clock.now())?;
        self.insert_raw_row(row)?;
        Ok(ledger)
    }

    async fn list_all(&self) -> LedgerResult<Vec<Ledger>> {
        let rows = self
            .rows
            .read()
            .map_err(|_| LedgerError::store_read("Storage lock poisoned"))?;
        rows.values().cloned().map(LedgerRow::into_ledger).collect()
    }

    async fn get_by_id(&self, id: &LedgerId) -> LedgerResult<Ledger> {
        let row = self
            .rows
            .read()
            .map_err(|_| LedgerError::store_read("Storage lock poisoned"))?
            .get(id.as_str())
            .cloned();

        match row {
            Some(row) => row.into_ledger(),
            None => Err(LedgerError::not_found(id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    #[tokio::test]
    async fn test_create_then_get() {
        let store = InMemoryLedgerStore::new();
        let created = store
            .create(NewLedger::new("treasury").with_metadata("region", "eu"))
            .await
            .unwrap();

        let fetched = store.get_by_id(&created.id).await.unwrap();
        assert_eq!(fetched, created);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_get_unknown_is_not_found() {
        let store = InMemoryLedgerStore::new();
        let err = store
            .get_by_id(&LedgerId::new("ldg_missing"))
            .await
            .unwrap_err();
        assert_eq!(err, LedgerError::not_found(&LedgerId::new("ldg_missing")));
    }

    #[tokio::test]
    async fn test_list_all_empty() {
        let store = InMemoryLedgerStore::new();
        assert!(store.list_all().await.unwrap().is_empty());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_row_is_write_error() {
        let store = InMemoryLedgerStore::new();
        let row = LedgerRow {
            ledger_id: "ldg_dup".to_string(),
            name: "a".to_string(),
            meta_data: json!({}),
            created_at: Utc::now(),
        };
        store.insert_raw_row(row.clone()).unwrap();
        assert!(matches!(
            store.insert_raw_row(row),
            Err(LedgerError::StoreWrite { .. })
        ));
    }

    #[tokio::test]
    async fn test_corrupt_row_aborts_listing() {
        let store = InMemoryLedgerStore::new();
        store.create(NewLedger::new("good")).await.unwrap();
        store
            .insert_raw_row(LedgerRow {
                ledger_id: "ldg_corrupt".to_string(),
                name: "bad".to_string(),
                meta_data: json!([1, 2, 3]),
                created_at: Utc::now(),
            })
            .unwrap();

        assert!(matches!(
            store.list_all().await,
            Err(LedgerError::Serialization { .. })
        ));
        assert!(matches!(
            store.get_by_id(&LedgerId::new("ldg_corrupt")).await,
            Err(LedgerError::Serialization { .. })
        ));
    }
}
