use std::collections::{BTreeMap, BTreeSet};

use accounthist_core::keyer::is_checkpoint_key;
use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use crate::errors::StorageError;
use crate::store::{with_timeout, KVStore, KeyValue, SharedStore};

#[derive(Debug, Default)]
struct Buffers {
    puts: BTreeMap<Vec<u8>, Vec<u8>>,
    deletes: BTreeSet<Vec<u8>>,
}

/// Write buffering overlay in front of a [`KVStore`].
///
/// Reads go straight to the backing store and never observe buffered writes. On flush, data
/// rows are made durable first, checkpoint rows second and deletes last, so a checkpoint can't
/// be durable before the rows it covers.
pub struct RWCache {
    store: SharedStore,
    buffers: Mutex<Buffers>,
    is_checkpoint: fn(&[u8]) -> bool,
}

impl RWCache {
    pub fn new(store: SharedStore) -> Self {
        Self {
            store,
            buffers: Mutex::new(Buffers::default()),
            is_checkpoint: is_checkpoint_key,
        }
    }

    pub fn with_checkpoint_predicate(mut self, is_checkpoint: fn(&[u8]) -> bool) -> Self {
        self.is_checkpoint = is_checkpoint;
        self
    }

    /// Backing store, bypassing the buffers
    pub fn inner(&self) -> &SharedStore {
        &self.store
    }

    pub async fn pending_puts(&self) -> usize {
        self.buffers.lock().await.puts.len()
    }

    pub async fn pending_deletes(&self) -> usize {
        self.buffers.lock().await.deletes.len()
    }
}

#[async_trait]
impl KVStore for RWCache {
    async fn get(&self, key: &[u8]) -> Result<Vec<u8>, StorageError> {
        with_timeout(self.store.get(key)).await
    }

    async fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StorageError> {
        let mut buffers = self.buffers.lock().await;
        buffers.deletes.remove(key);
        buffers.puts.insert(key.to_vec(), value.to_vec());

        Ok(())
    }

    async fn batch_delete(&self, keys: &[Vec<u8>]) -> Result<(), StorageError> {
        let mut buffers = self.buffers.lock().await;
        for key in keys {
            buffers.puts.remove(key);
            buffers.deletes.insert(key.clone());
        }

        Ok(())
    }

    async fn scan(
        &self,
        start: &[u8],
        end: &[u8],
        limit: usize,
    ) -> Result<Vec<KeyValue>, StorageError> {
        with_timeout(self.store.scan(start, end, limit)).await
    }

    async fn flush_puts(&self) -> Result<(), StorageError> {
        let mut buffers = self.buffers.lock().await;
        let is_checkpoint = self.is_checkpoint;

        let (checkpoints, rows): (Vec<_>, Vec<_>) = buffers
            .puts
            .iter()
            .partition(|(key, _)| is_checkpoint(key));

        debug!(
            rows = rows.len(),
            checkpoints = checkpoints.len(),
            deletes = buffers.deletes.len(),
            "Flushing buffered writes"
        );

        for (key, value) in rows {
            with_timeout(self.store.put(key, value)).await?;
        }
        with_timeout(self.store.flush_puts()).await?;

        for (key, value) in checkpoints {
            with_timeout(self.store.put(key, value)).await?;
        }
        with_timeout(self.store.flush_puts()).await?;

        if !buffers.deletes.is_empty() {
            let deletes: Vec<Vec<u8>> = buffers.deletes.iter().cloned().collect();
            with_timeout(self.store.batch_delete(&deletes)).await?;
            with_timeout(self.store.flush_puts()).await?;
        }

        buffers.puts.clear();
        buffers.deletes.clear();

        Ok(())
    }
}
