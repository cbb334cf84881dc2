use std::sync::Arc;

use accounthist_core::keyer::encode_checkpoint_key;
use accounthist_core::ShardCheckpoint;
use test_log::test;

use crate::checkpoint::{get_shard_checkpoint, put_shard_checkpoint};
use crate::tests::support::recording::{Operation, RecordingStore};
use crate::tests::support::{account, row_value};
use crate::{KVStore, RWCache, StorageError};

#[test(tokio::test)]
async fn put_cancels_a_pending_delete() {
    let store = Arc::new(RecordingStore::default());
    let cache = RWCache::new(store.clone());

    cache.batch_delete(&[b"key".to_vec()]).await.unwrap();
    cache.put(b"key", b"value").await.unwrap();

    assert_eq!(cache.pending_puts().await, 1);
    assert_eq!(cache.pending_deletes().await, 0);

    cache.flush_puts().await.unwrap();
    assert_eq!(store.get(b"key").await.unwrap(), b"value".to_vec());
}

#[test(tokio::test)]
async fn delete_cancels_a_pending_put() {
    let store = Arc::new(RecordingStore::default());
    let cache = RWCache::new(store.clone());

    cache.put(b"key", b"value").await.unwrap();
    cache.batch_delete(&[b"key".to_vec()]).await.unwrap();

    assert_eq!(cache.pending_puts().await, 0);
    assert_eq!(cache.pending_deletes().await, 1);

    cache.flush_puts().await.unwrap();
    assert!(!store
        .operations()
        .iter()
        .any(|operation| matches!(operation, Operation::Put(_))));
}

#[test(tokio::test)]
async fn reads_do_not_see_buffered_writes() {
    let store = Arc::new(RecordingStore::default());
    let cache = RWCache::new(store.clone());

    cache.put(b"key", b"value").await.unwrap();

    assert!(matches!(cache.get(b"key").await, Err(StorageError::NotFound)));
    assert!(cache.scan(b"", b"", 0).await.unwrap().is_empty());
}

#[test(tokio::test)]
async fn checkpoints_are_flushed_after_rows_and_before_deletes() {
    let store = Arc::new(RecordingStore::default());
    let cache = RWCache::new(store.clone());

    let facet = account("alice");
    let checkpoint_key = encode_checkpoint_key(0x01, 0);
    let row = facet.row(0, 2);
    let stale = facet.row(0, 1);

    put_shard_checkpoint(&cache, &checkpoint_key, &ShardCheckpoint::new(10, 0))
        .await
        .unwrap();
    cache.put(row.as_bytes(), &row_value(facet, 2, 1)).await.unwrap();
    cache.batch_delete(&[stale.clone().into_vec()]).await.unwrap();

    cache.flush_puts().await.unwrap();

    assert_eq!(
        store.operations(),
        vec![
            Operation::Put(row.into_vec()),
            Operation::Flush,
            Operation::Put(checkpoint_key),
            Operation::Flush,
            Operation::Delete(stale.into_vec()),
            Operation::Flush,
        ]
    );
    assert_eq!(cache.pending_puts().await, 0);
}

#[test(tokio::test)]
async fn failed_checkpoint_flush_never_advances_the_checkpoint() {
    // First flush persists the rows, the second one (checkpoint) fails
    let store = Arc::new(RecordingStore::failing_on_flush(2));
    let cache = RWCache::new(store.clone());

    let facet = account("alice");
    let checkpoint_key = encode_checkpoint_key(0x01, 0);
    let mut checkpoint = ShardCheckpoint::new(10, 0);
    checkpoint.record(12, "0000000caa");

    cache
        .put(facet.row(0, 1).as_bytes(), &row_value(facet, 1, 0))
        .await
        .unwrap();
    put_shard_checkpoint(&cache, &checkpoint_key, &checkpoint)
        .await
        .unwrap();

    assert!(cache.flush_puts().await.is_err());

    assert!(store.get(facet.row(0, 1).as_bytes()).await.is_ok());
    assert_eq!(
        get_shard_checkpoint(store.as_ref(), &checkpoint_key)
            .await
            .unwrap(),
        None
    );
}
