//! Ledger Core - Entity Types
//!
//! Pure data structures shared by the store, the cache backends and the
//! read-through accessor. This crate holds no I/O.

pub mod clock;
pub mod error;
pub mod identity;
pub mod ledger;
pub mod metadata;

pub use clock::CreationClock;
pub use error::{CacheError, CacheResult, LedgerError, LedgerResult};
pub use identity::{LedgerId, Timestamp, LEDGER_ID_PREFIX};
pub use ledger::{Ledger, NewLedger};
pub use metadata::{decode_metadata, decode_metadata_slice, encode_metadata, Metadata};
