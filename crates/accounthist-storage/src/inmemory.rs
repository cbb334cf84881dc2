use std::collections::BTreeMap;
use std::ops::Bound;

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};

use crate::errors::StorageError;
use crate::store::{before_end, KVStore, KeyValue};

/// Store keeping everything in an ordered map, used by tests and dry runs.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    data: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
    pending: Mutex<Vec<(Vec<u8>, Vec<u8>)>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of durable keys
    pub async fn len(&self) -> usize {
        self.data.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.data.read().await.is_empty()
    }

    /// Every durable pair, in key order
    pub async fn dump(&self) -> Vec<KeyValue> {
        self.data
            .read()
            .await
            .iter()
            .map(|(key, value)| KeyValue::new(key.clone(), value.clone()))
            .collect()
    }
}

#[async_trait]
impl KVStore for InMemoryStore {
    async fn get(&self, key: &[u8]) -> Result<Vec<u8>, StorageError> {
        self.data
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    async fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StorageError> {
        self.pending.lock().await.push((key.to_vec(), value.to_vec()));

        Ok(())
    }

    async fn batch_delete(&self, keys: &[Vec<u8>]) -> Result<(), StorageError> {
        let mut data = self.data.write().await;
        for key in keys {
            data.remove(key);
        }

        Ok(())
    }

    async fn scan(
        &self,
        start: &[u8],
        end: &[u8],
        limit: usize,
    ) -> Result<Vec<KeyValue>, StorageError> {
        let data = self.data.read().await;
        let range = data
            .range::<[u8], _>((Bound::Included(start), Bound::Unbounded))
            .take_while(|(key, _)| before_end(key, end))
            .map(|(key, value)| KeyValue::new(key.clone(), value.clone()));

        Ok(if limit == 0 {
            range.collect()
        } else {
            range.take(limit).collect()
        })
    }

    async fn flush_puts(&self) -> Result<(), StorageError> {
        let pending = std::mem::take(&mut *self.pending.lock().await);
        let mut data = self.data.write().await;
        data.extend(pending);

        Ok(())
    }
}
