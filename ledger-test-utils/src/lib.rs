//! Ledger Test Utilities
//!
//! Shared test infrastructure for the ledger workspace:
//! - Proptest generators for metadata documents and create requests
//! - Instrumented fakes for the store and cache seams
//! - Fixtures for common scenarios

pub use ledger_core::{
    CacheError, CacheResult, Ledger, LedgerError, LedgerId, LedgerResult, Metadata, NewLedger,
};
pub use ledger_storage::{
    CachedLedgerStore, InMemoryLedgerCache, InMemoryLedgerStore, LedgerCache, LedgerStore,
};

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

// ============================================================================
// STORE FAKES
// ============================================================================

/// Store wrapper that counts calls per operation.
#[derive(Debug, Default)]
pub struct CountingStore<S> {
    inner: S,
    creates: AtomicUsize,
    lists: AtomicUsize,
    reads: AtomicUsize,
}

impl<S: LedgerStore> CountingStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            creates: AtomicUsize::new(0),
            lists: AtomicUsize::new(0),
            reads: AtomicUsize::new(0),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Number of `get_by_id` calls.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn creates(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    pub fn lists(&self) -> usize {
        self.lists.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<S: LedgerStore> LedgerStore for CountingStore<S> {
    async fn create(&self, new: NewLedger) -> LedgerResult<Ledger> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        self.inner.create(new).await
    }

    async fn list_all(&self) -> LedgerResult<Vec<Ledger>> {
        self.lists.fetch_add(1, Ordering::SeqCst);
        self.inner.list_all().await
    }

    async fn get_by_id(&self, id: &LedgerId) -> LedgerResult<Ledger> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.get_by_id(id).await
    }
}

/// Store whose every call fails the way a dropped connection would.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnreachableStore;

#[async_trait]
impl LedgerStore for UnreachableStore {
    async fn create(&self, _new: NewLedger) -> LedgerResult<Ledger> {
        Err(LedgerError::store_write("connection refused"))
    }

    async fn list_all(&self) -> LedgerResult<Vec<Ledger>> {
        Err(LedgerError::store_read("connection refused"))
    }

    async fn get_by_id(&self, _id: &LedgerId) -> LedgerResult<Ledger> {
        Err(LedgerError::store_read("connection refused"))
    }
}

// ============================================================================
// CACHE FAKES
// ============================================================================

/// Cache wrapper that counts reads and writes.
#[derive(Debug, Default)]
pub struct CountingCache<C> {
    inner: C,
    gets: AtomicUsize,
    sets: AtomicUsize,
}

impl<C: LedgerCache> CountingCache<C> {
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            gets: AtomicUsize::new(0),
            sets: AtomicUsize::new(0),
        }
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }

    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn sets(&self) -> usize {
        self.sets.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<C: LedgerCache> LedgerCache for CountingCache<C> {
    async fn get(&self, id: &LedgerId) -> CacheResult<Option<Ledger>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.inner.get(id).await
    }

    async fn set(&self, ledger: &Ledger, ttl: Duration) -> CacheResult<()> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        self.inner.set(ledger, ttl).await
    }
}

/// In-memory cache with switchable read and write failures.
#[derive(Debug, Default)]
pub struct FaultyCache {
    inner: InMemoryLedgerCache,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl FaultyCache {
    /// Healthy until told otherwise.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every read and write fails.
    pub fn unreachable() -> Self {
        let cache = Self::new();
        cache.set_fail_reads(true);
        cache.set_fail_writes(true);
        cache
    }

    /// Reads work, writes fail.
    pub fn failing_writes() -> Self {
        let cache = Self::new();
        cache.set_fail_writes(true);
        cache
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn inner(&self) -> &InMemoryLedgerCache {
        &self.inner
    }

    fn unavailable() -> CacheError {
        CacheError::Unavailable {
            reason: "dial tcp: connection refused".to_string(),
        }
    }
}

#[async_trait]
impl LedgerCache for FaultyCache {
    async fn get(&self, id: &LedgerId) -> CacheResult<Option<Ledger>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(Self::unavailable());
        }
        self.inner.get(id).await
    }

    async fn set(&self, ledger: &Ledger, ttl: Duration) -> CacheResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Self::unavailable());
        }
        self.inner.set(ledger, ttl).await
    }
}

/// Cache that answers every read with a zero-valued ledger instead of a
/// miss, the way a client decoding into a default struct would.
#[derive(Debug, Default)]
pub struct ZeroValueCache {
    sets: AtomicUsize,
}

impl ZeroValueCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sets(&self) -> usize {
        self.sets.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LedgerCache for ZeroValueCache {
    async fn get(&self, _id: &LedgerId) -> CacheResult<Option<Ledger>> {
        Ok(Some(Ledger::default()))
    }

    async fn set(&self, _ledger: &Ledger, _ttl: Duration) -> CacheResult<()> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

pub mod fixtures {
    //! Ready-made requests and accessors.

    use super::*;

    /// `{name: "treasury", metadata: {"region": "eu"}}`
    pub fn treasury() -> NewLedger {
        NewLedger::new("treasury").with_metadata("region", "eu")
    }

    /// Accessor over a counting in-memory store and a counting cache.
    pub type InstrumentedLedgers<C> =
        CachedLedgerStore<CountingStore<InMemoryLedgerStore>, CountingCache<C>>;

    /// Build an instrumented accessor around `cache`, returning handles to
    /// the counting store and cache alongside it.
    pub fn instrumented<C: LedgerCache>(
        cache: C,
    ) -> (
        InstrumentedLedgers<C>,
        Arc<CountingStore<InMemoryLedgerStore>>,
        Arc<CountingCache<C>>,
    ) {
        let store = Arc::new(CountingStore::new(InMemoryLedgerStore::new()));
        let cache = Arc::new(CountingCache::new(cache));
        let ledgers = CachedLedgerStore::with_defaults(Arc::clone(&store), Arc::clone(&cache));
        (ledgers, store, cache)
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for ledger inputs.

    use super::*;
    use proptest::prelude::*;
    use serde_json::Value as JsonValue;

    /// Scalar JSON values. Floats stay finite; JSON cannot carry NaN or
    /// infinities.
    pub fn arb_json_scalar() -> impl Strategy<Value = JsonValue> {
        prop_oneof![
            Just(JsonValue::Null),
            any::<bool>().prop_map(JsonValue::Bool),
            any::<i64>().prop_map(JsonValue::from),
            any::<u64>().prop_map(JsonValue::from),
            (-1.0e15f64..1.0e15f64).prop_map(JsonValue::from),
            "\\PC{0,16}".prop_map(JsonValue::String),
        ]
    }

    /// Arbitrary JSON values, nested up to three levels.
    pub fn arb_json_value() -> impl Strategy<Value = JsonValue> {
        arb_json_scalar().prop_recursive(3, 32, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(JsonValue::Array),
                prop::collection::btree_map("[a-z_]{1,8}", inner, 0..4)
                    .prop_map(|map| JsonValue::Object(map.into_iter().collect())),
            ]
        })
    }

    /// Metadata documents, including the empty one.
    pub fn arb_metadata() -> impl Strategy<Value = Metadata> {
        prop::collection::btree_map("[a-z_]{1,12}", arb_json_value(), 0..6)
            .prop_map(|map| map.into_iter().collect())
    }

    /// Ledger names: simple identifiers, words, and the empty string.
    pub fn arb_ledger_name() -> impl Strategy<Value = String> {
        prop_oneof![
            "[a-z]{3,10}-[0-9]{1,5}",
            "[A-Z][a-z]{2,20}",
            Just(String::new()),
        ]
    }

    pub fn arb_new_ledger() -> impl Strategy<Value = NewLedger> {
        (arb_ledger_name(), arb_metadata())
            .prop_map(|(name, metadata)| NewLedger::new(name).with_metadata_map(metadata))
    }
}
