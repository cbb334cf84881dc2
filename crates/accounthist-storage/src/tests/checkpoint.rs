use std::sync::Arc;

use accounthist_core::{Collection, FacetFactory, ShardCheckpoint};
use rstest::rstest;
use test_log::test;

use crate::checkpoint::{delete_shard_checkpoint, get_shard_checkpoint, put_shard_checkpoint};
use crate::tests::support::memory_store;
use crate::{InMemoryStore, KVStore};

#[rstest]
#[test(tokio::test)]
async fn checkpoint_lifecycle(memory_store: Arc<InMemoryStore>) {
    let key = FacetFactory::new(Collection::Account).checkpoint_key(2);
    let store = memory_store.as_ref();

    assert_eq!(get_shard_checkpoint(store, &key).await.unwrap(), None);

    let mut checkpoint = ShardCheckpoint::new(0, 5000);
    assert_eq!(checkpoint.initial_start_block, 2);
    checkpoint.record(42, "0000002aaa");

    put_shard_checkpoint(store, &key, &checkpoint).await.unwrap();
    store.flush_puts().await.unwrap();

    assert_eq!(
        get_shard_checkpoint(store, &key).await.unwrap(),
        Some(checkpoint)
    );

    // Other shards and collections are untouched
    let other = FacetFactory::new(Collection::AccountContract).checkpoint_key(2);
    assert_eq!(get_shard_checkpoint(store, &other).await.unwrap(), None);

    delete_shard_checkpoint(store, &key).await.unwrap();
    assert_eq!(get_shard_checkpoint(store, &key).await.unwrap(), None);
}
