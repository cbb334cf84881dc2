use accounthist_core::ShardCheckpoint;

use crate::errors::StorageError;
use crate::store::{with_timeout, KVStore};

/// Read a shard checkpoint, `None` when the shard never started.
pub async fn get_shard_checkpoint(
    store: &dyn KVStore,
    key: &[u8],
) -> Result<Option<ShardCheckpoint>, StorageError> {
    match with_timeout(store.get(key)).await {
        Ok(value) => Ok(Some(ShardCheckpoint::decode(&value)?)),
        Err(StorageError::NotFound) => Ok(None),
        Err(error) => Err(error),
    }
}

/// Buffer a shard checkpoint write, it becomes durable on the next flush.
pub async fn put_shard_checkpoint(
    store: &dyn KVStore,
    key: &[u8],
    checkpoint: &ShardCheckpoint,
) -> Result<(), StorageError> {
    let value = checkpoint.encode()?;

    with_timeout(store.put(key, &value)).await
}

pub async fn delete_shard_checkpoint(store: &dyn KVStore, key: &[u8]) -> Result<(), StorageError> {
    with_timeout(store.batch_delete(&[key.to_vec()])).await?;
    with_timeout(store.flush_puts()).await
}
