//! Durable ledger storage.
//!
//! [`LedgerStore`] is the authoritative source for ledgers. Both
//! implementations build and read rows through [`LedgerRow`] so insert and
//! scan semantics match.

pub mod memory;
pub mod postgres;

pub use memory::InMemoryLedgerStore;
pub use postgres::{PgLedgerStore, LEDGERS_TABLE_DDL};

use async_trait::async_trait;
use ledger_core::{
    decode_metadata, encode_metadata, Ledger, LedgerId, LedgerResult, NewLedger, Timestamp,
};
use serde_json::Value as JsonValue;

/// Storage trait for ledgers.
///
/// Ledgers are append-only: there is no update or delete.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Persist a new ledger.
    ///
    /// Assigns the identifier and creation timestamp. The returned ledger is
    /// the only place the generated identifier appears.
    async fn create(&self, new: NewLedger) -> LedgerResult<Ledger>;

    /// Every stored ledger, in store-defined order.
    ///
    /// A single row with corrupt metadata fails the whole listing.
    async fn list_all(&self) -> LedgerResult<Vec<Ledger>>;

    /// Point lookup. Fails with `NotFound` when no row matches.
    async fn get_by_id(&self, id: &LedgerId) -> LedgerResult<Ledger>;
}

/// A ledger as stored: metadata held as its serialized document.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerRow {
    pub ledger_id: String,
    pub name: String,
    pub meta_data: JsonValue,
    pub created_at: Timestamp,
}

impl LedgerRow {
    /// Encode a ledger for insertion.
    pub fn from_ledger(ledger: &Ledger) -> LedgerResult<Self> {
        Ok(Self {
            ledger_id: ledger.id.as_str().to_string(),
            name: ledger.name.clone(),
            meta_data: encode_metadata(&ledger.metadata)?,
            created_at: ledger.created_at,
        })
    }

    /// Decode a fetched row.
    pub fn into_ledger(self) -> LedgerResult<Ledger> {
        Ok(Ledger {
            id: LedgerId::new(self.ledger_id),
            name: self.name,
            metadata: decode_metadata(self.meta_data)?,
            created_at: self.created_at,
        })
    }
}

/// Stamp a create request and encode it, ready for a single-row insert.
pub(crate) fn prepare_insert(
    new: NewLedger,
    created_at: Timestamp,
) -> LedgerResult<(Ledger, LedgerRow)> {
    let ledger = new.into_ledger(LedgerId::generate(), created_at);
    let row = LedgerRow::from_ledger(&ledger)?;
    Ok((ledger, row))
}
