//! Property-Based Tests for Metadata Round-Trip
//!
//! For any metadata document `m` (empty, nested, numeric, string values):
//! - `decode(encode(m)) == m`
//! - a ledger created with `m` reads back with `m` from the store
//! - a ledger backfilled into LMDB reads back from the cache unchanged

use std::sync::Arc;
use std::time::Duration;

use ledger_core::{decode_metadata, decode_metadata_slice, encode_metadata};
use ledger_storage::{CachedLedgerStore, InMemoryLedgerStore, LedgerCache, LmdbLedgerCache};
use ledger_test_utils::generators::{arb_metadata, arb_new_ledger};
use proptest::prelude::*;
use tempfile::TempDir;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("runtime should build")
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_metadata_document_round_trip(metadata in arb_metadata()) {
        let document = encode_metadata(&metadata).unwrap();
        prop_assert_eq!(decode_metadata(document).unwrap(), metadata);
    }

    #[test]
    fn prop_metadata_text_round_trip(metadata in arb_metadata()) {
        let text = serde_json::to_vec(&encode_metadata(&metadata).unwrap()).unwrap();
        prop_assert_eq!(decode_metadata_slice(&text).unwrap(), metadata);
    }

    #[test]
    fn prop_store_and_lmdb_cache_preserve_ledgers(new in arb_new_ledger()) {
        let temp_dir = TempDir::new().unwrap();
        let cache = Arc::new(LmdbLedgerCache::new(temp_dir.path(), 10).unwrap());
        let ledgers = CachedLedgerStore::new(
            Arc::new(InMemoryLedgerStore::new()),
            Arc::clone(&cache),
            Duration::from_secs(60),
        );

        let (created, from_store, from_cache, raw_cached) = runtime().block_on(async {
            let created = ledgers.create(new.clone()).await.unwrap();
            let from_store = ledgers.get(&created.id).await.unwrap();
            let from_cache = ledgers.get(&created.id).await.unwrap();
            let raw_cached = cache.get(&created.id).await.unwrap();
            (created, from_store, from_cache, raw_cached)
        });

        prop_assert_eq!(&created.name, &new.name);
        prop_assert_eq!(&created.metadata, &new.metadata);
        prop_assert_eq!(&from_store, &created);
        prop_assert_eq!(&from_cache, &created);
        prop_assert_eq!(raw_cached, Some(created));
        prop_assert_eq!(ledgers.stats().hits, 1);
    }
}
