use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use accounthist_storage::{
    InMemoryStore, KVStore, KeyValue, RocksDBStore, SharedStore, StorageError,
};
use async_trait::async_trait;
use rand::Rng;
use rstest::fixture;

#[fixture]
pub fn memory_store() -> Arc<InMemoryStore> {
    Arc::new(InMemoryStore::new())
}

#[fixture]
pub fn shared_memory_store() -> SharedStore {
    Arc::new(InMemoryStore::new())
}

#[fixture]
pub fn create_folder() -> PathBuf {
    let time = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    let mut rng = rand::thread_rng();

    std::env::temp_dir().join(format!(
        "accounthist/data_{}_{}/rocksdb",
        time.as_nanos(),
        rng.gen::<u64>()
    ))
}

#[fixture]
pub fn rocks_store(create_folder: PathBuf) -> Arc<RocksDBStore> {
    Arc::new(RocksDBStore::open(&create_folder).expect("Unable to create rocksdb store"))
}

/// In memory store failing its `nth` flush (1-based), leaving the puts of that flush unapplied.
#[derive(Debug, Default)]
pub struct FailingFlushStore {
    pub inner: InMemoryStore,
    flushes: AtomicUsize,
    fail_on_flush: Option<usize>,
}

impl FailingFlushStore {
    pub fn new(nth: usize) -> Self {
        Self {
            fail_on_flush: Some(nth),
            ..Default::default()
        }
    }

    pub fn flushes(&self) -> usize {
        self.flushes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KVStore for FailingFlushStore {
    async fn get(&self, key: &[u8]) -> Result<Vec<u8>, StorageError> {
        self.inner.get(key).await
    }

    async fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StorageError> {
        self.inner.put(key, value).await
    }

    async fn batch_delete(&self, keys: &[Vec<u8>]) -> Result<(), StorageError> {
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
            return Err(StorageError::Backend(format!("flush {nth} failed")));
        }

        self.inner.flush_puts().await
    }
}
