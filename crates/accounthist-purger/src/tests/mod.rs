use std::sync::{Arc, Mutex};

use accounthist_core::{Collection, Facet, ShardNum};
use accounthist_storage::sequence::shard_seq_data_per_facet;
use accounthist_storage::{InMemoryStore, KVStore, KeyValue, RWCache, StorageError};
use accounthist_test_sdk::name;
use accounthist_test_sdk::rows::insert_rows;
use accounthist_test_sdk::storage::memory_store;
use async_trait::async_trait;
use rstest::rstest;

use crate::{PurgeReport, Purger, PurgerError};

fn account(value: &str) -> Facet {
    Facet::Account(name(value))
}

async fn current_ordinal(store: &dyn KVStore, facet: &Facet, shard: ShardNum) -> Option<u64> {
    match shard_seq_data_per_facet(store, facet, shard, 0).await {
        Ok(sequence) => Some(sequence.current_ordinal),
        Err(StorageError::NotFound) => None,
        Err(error) => panic!("unexpected storage error: {error}"),
    }
}

/// a: only and maxed out on shard 0
/// b: on shard 0 and maxed out on shard 1
/// c: not maxed out
/// d: no actions
/// e: only on shard 1 and maxed out on shard 1
async fn seed_accounts(store: &dyn KVStore) {
    let rows = [
        ("a", 0, 12, 41),
        ("b", 0, 5, 53),
        ("c", 0, 3, 58),
        ("a", 1, 8, 8),
        ("b", 1, 7, 16),
        ("c", 1, 2, 23),
        ("e", 1, 16, 25),
        ("a", 2, 3, 1),
        ("b", 2, 4, 3),
        ("c", 2, 1, 7),
    ];

    for (facet, shard, count, first_global_seq) in rows {
        insert_rows(store, &account(facet), shard, count, first_global_seq)
            .await
            .unwrap();
    }
}

/// Store recording every key handed to `batch_delete`, in order
#[derive(Default)]
struct RecordingDeleteStore {
    inner: InMemoryStore,
    deleted_keys: Mutex<Vec<Vec<u8>>>,
}

#[async_trait]
impl KVStore for RecordingDeleteStore {
    async fn get(&self, key: &[u8]) -> Result<Vec<u8>, StorageError> {
        self.inner.get(key).await
    }

    async fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StorageError> {
        self.inner.put(key, value).await
    }

    async fn batch_delete(&self, keys: &[Vec<u8>]) -> Result<(), StorageError> {
        self.deleted_keys.lock().unwrap().extend_from_slice(keys);
        self.inner.batch_delete(keys).await
    }

    async fn scan(
        &self,
        start: &[u8],
        end: &[u8],
        limit: usize,
    ) -> Result<Vec<KeyValue>, StorageError> {
        self.inner.scan(start, end, limit).await
    }

    async fn flush_puts(&self) -> Result<(), StorageError> {
        self.inner.flush_puts().await
    }
}

#[rstest]
#[test_log::test(tokio::test)]
async fn purge_accounts_bounds_every_history(memory_store: Arc<InMemoryStore>) {
    seed_accounts(&*memory_store).await;

    let mut decisions = Vec::new();
    let report = Purger::new(memory_store.clone(), Collection::Account)
        .purge(10, |facet, above_shard, seen| {
            decisions.push((*facet, above_shard, seen))
        })
        .await
        .unwrap();

    assert_eq!(
        decisions,
        vec![
            (account("a"), 0, 12),
            (account("b"), 1, 12),
            (account("e"), 1, 16),
        ]
    );
    assert_eq!(
        report,
        PurgeReport {
            facets_scanned: 4,
            facets_purged: 3,
            keys_deleted: 15,
        }
    );

    let store = &*memory_store;
    let expected = [
        ("a", [Some(12), None, None]),
        ("b", [Some(5), Some(7), None]),
        ("c", [Some(3), Some(2), Some(1)]),
        ("d", [None, None, None]),
        ("e", [None, Some(16), None]),
    ];
    for (facet, ordinals) in expected {
        for (shard, ordinal) in ordinals.into_iter().enumerate() {
            assert_eq!(
                current_ordinal(store, &account(facet), shard as ShardNum).await,
                ordinal,
                "account {facet} shard {shard}"
            );
        }
    }
}

#[rstest]
#[test_log::test(tokio::test)]
async fn limit_crossed_in_the_first_shard_keeps_only_it(memory_store: Arc<InMemoryStore>) {
    let facet = account("x");
    insert_rows(&*memory_store, &facet, 0, 12, 100).await.unwrap();
    insert_rows(&*memory_store, &facet, 1, 5, 50).await.unwrap();
    insert_rows(&*memory_store, &facet, 2, 21, 1).await.unwrap();

    let mut decisions = Vec::new();
    let report = Purger::new(memory_store.clone(), Collection::Account)
        .purge(10, |facet, above_shard, seen| {
            decisions.push((*facet, above_shard, seen))
        })
        .await
        .unwrap();

    assert_eq!(decisions, vec![(facet, 0, 12)]);
    assert_eq!(report.keys_deleted, 26);

    assert_eq!(memory_store.len().await, 12);
    assert_eq!(current_ordinal(&*memory_store, &facet, 0).await, Some(12));
    assert_eq!(current_ordinal(&*memory_store, &facet, 1).await, None);
    assert_eq!(current_ordinal(&*memory_store, &facet, 2).await, None);
}

#[rstest]
#[case::single_batch(1000)]
#[case::even_batches(2)]
#[case::one_key_at_a_time(1)]
#[test_log::test(tokio::test)]
async fn purge_above_shard_deletes_higher_shards_only(#[case] batch_size: usize) {
    let store = Arc::new(RecordingDeleteStore::default());
    let facet = account("a");

    insert_rows(&*store, &facet, 0, 12, 26).await.unwrap();
    let mut expected = insert_rows(&*store, &facet, 1, 5, 21).await.unwrap();
    expected.extend(insert_rows(&*store, &facet, 3, 21, 1).await.unwrap());
    insert_rows(&*store, &account("b"), 1, 4, 60).await.unwrap();

    let deleted = Purger::new(store.clone(), Collection::Account)
        .with_batch_size(batch_size)
        .purge_above_shard(&facet, 0)
        .await
        .unwrap();

    assert_eq!(deleted, 26);
    assert_eq!(*store.deleted_keys.lock().unwrap(), expected);

    assert_eq!(current_ordinal(&*store, &facet, 0).await, Some(12));
    assert_eq!(current_ordinal(&*store, &facet, 1).await, None);
    assert_eq!(current_ordinal(&*store, &facet, 3).await, None);
    assert_eq!(current_ordinal(&*store, &account("b"), 1).await, Some(4));
}

#[rstest]
#[test_log::test(tokio::test)]
async fn dry_run_counts_without_deleting(memory_store: Arc<InMemoryStore>) {
    seed_accounts(&*memory_store).await;
    let before = memory_store.dump().await;

    let mut calls = 0;
    let report = Purger::new(memory_store.clone(), Collection::Account)
        .with_dry_run(true)
        .purge(10, |_, _, _| calls += 1)
        .await
        .unwrap();

    assert_eq!(calls, 3);
    assert_eq!(report.facets_purged, 3);
    assert_eq!(report.keys_deleted, 15);
    assert_eq!(memory_store.dump().await, before);
}

#[rstest]
#[test_log::test(tokio::test)]
async fn buffered_deletes_are_flushed(memory_store: Arc<InMemoryStore>) {
    let facet = account("x");
    insert_rows(&*memory_store, &facet, 0, 12, 100).await.unwrap();
    insert_rows(&*memory_store, &facet, 1, 5, 50).await.unwrap();
    insert_rows(&*memory_store, &facet, 2, 21, 1).await.unwrap();

    let cache = Arc::new(RWCache::new(memory_store.clone()));
    let report = Purger::new(cache.clone(), Collection::Account)
        .with_batch_size(3)
        .purge(10, |_, _, _| {})
        .await
        .unwrap();

    assert_eq!(report.keys_deleted, 26);
    assert_eq!(cache.pending_deletes().await, 0);
    assert_eq!(memory_store.len().await, 12);
}

#[rstest]
#[test_log::test(tokio::test)]
async fn collections_are_purged_separately(memory_store: Arc<InMemoryStore>) {
    let pair = Facet::AccountContract {
        account: name("alice"),
        contract: name("eosio.token"),
    };
    insert_rows(&*memory_store, &pair, 0, 6, 1).await.unwrap();
    insert_rows(&*memory_store, &pair, 1, 6, 10).await.unwrap();
    insert_rows(&*memory_store, &pair, 2, 4, 20).await.unwrap();

    let alice = account("alice");
    insert_rows(&*memory_store, &alice, 0, 20, 1).await.unwrap();
    insert_rows(&*memory_store, &alice, 1, 5, 30).await.unwrap();

    let mut decisions = Vec::new();
    let report = Purger::new(memory_store.clone(), Collection::AccountContract)
        .purge(10, |facet, above_shard, seen| {
            decisions.push((*facet, above_shard, seen))
        })
        .await
        .unwrap();

    assert_eq!(decisions, vec![(pair, 1, 12)]);
    assert_eq!(report.keys_deleted, 4);
    assert_eq!(current_ordinal(&*memory_store, &pair, 2).await, None);
    assert_eq!(current_ordinal(&*memory_store, &alice, 1).await, Some(5));
}

#[rstest]
#[test_log::test(tokio::test)]
async fn nothing_above_the_last_shard(memory_store: Arc<InMemoryStore>) {
    let facet = account("x");
    insert_rows(&*memory_store, &facet, ShardNum::MAX, 3, 1)
        .await
        .unwrap();

    let purger = Purger::new(memory_store.clone(), Collection::Account);

    assert_eq!(purger.purge_above_shard(&facet, ShardNum::MAX).await.unwrap(), 0);

    let report = purger.purge(10, |_, _, _| {}).await.unwrap();
    assert_eq!(report.facets_scanned, 1);
    assert_eq!(report.facets_purged, 0);
    assert_eq!(memory_store.len().await, 3);
}

#[rstest]
#[test_log::test(tokio::test)]
async fn invalid_parameters_are_rejected(memory_store: Arc<InMemoryStore>) {
    let result = Purger::new(memory_store.clone(), Collection::Account)
        .purge(0, |_, _, _| {})
        .await;
    assert!(matches!(result, Err(PurgerError::InvalidMaxEntries)));

    let result = Purger::new(memory_store, Collection::Account)
        .with_batch_size(0)
        .purge(10, |_, _, _| {})
        .await;
    assert!(matches!(result, Err(PurgerError::InvalidBatchSize)));
}
