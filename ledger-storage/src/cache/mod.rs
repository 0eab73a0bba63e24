//! Ledger cache layer.
//!
//! [`LedgerCache`] is the key-value contract the read-through accessor
//! needs: a tri-state `get` and a TTL-bounded `set`. [`LmdbLedgerCache`] is
//! the production backend; [`InMemoryLedgerCache`] keeps the same semantics
//! inside the process.
//!
//! [`CachedLedgerStore`] puts a cache in front of any [`LedgerStore`] and
//! owns the consistency contract between the two.
//!
//! [`LedgerStore`]: crate::store::LedgerStore

pub mod lmdb_backend;
pub mod memory;
pub mod read_through;
pub mod traits;

pub use lmdb_backend::{LmdbCacheError, LmdbLedgerCache};
pub use memory::InMemoryLedgerCache;
pub use read_through::CachedLedgerStore;
pub use traits::{CacheStats, LedgerCache};
