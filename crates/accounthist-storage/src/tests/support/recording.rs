use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::{InMemoryStore, KVStore, KeyValue, StorageError};

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Operation {
    Put(Vec<u8>),
    Delete(Vec<u8>),
    Flush,
}

/// In memory store recording every write and able to fail a given flush.
#[derive(Default)]
pub(crate) struct RecordingStore {
    pub(crate) inner: InMemoryStore,
    pub(crate) operations: Mutex<Vec<Operation>>,
    flushes: AtomicUsize,
    fail_on_flush: Option<usize>,
}

impl RecordingStore {
    /// The `nth` flush (1-based) fails and leaves its puts unapplied
    pub(crate) fn failing_on_flush(nth: usize) -> Self {
        Self {
            fail_on_flush: Some(nth),
            ..Default::default()
        }
    }

    pub(crate) fn operations(&self) -> Vec<Operation> {
        self.operations.lock().unwrap().clone()
    }
}

#[async_trait]
impl KVStore for RecordingStore {
    async fn get(&self, key: &[u8]) -> Result<Vec<u8>, StorageError> {
        self.inner.get(key).await
    }

    async fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StorageError> {
        self.operations
            .lock()
            .unwrap()
            .push(Operation::Put(key.to_vec()));
        self.inner.put(key, value).await
    }

    async fn batch_delete(&self, keys: &[Vec<u8>]) -> Result<(), StorageError> {
        self.operations
            .lock()
            .unwrap()
            .extend(keys.iter().cloned().map(Operation::Delete));
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
        let nth = self.flushes.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_on_flush == Some(nth) {
            return Err(StorageError::Backend("injected flush failure".into()));
        }

        self.operations.lock().unwrap().push(Operation::Flush);
        self.inner.flush_puts().await
    }
}
