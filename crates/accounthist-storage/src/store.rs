use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::errors::StorageError;

/// Ceiling applied to every single store operation.
pub const DATABASE_TIMEOUT: Duration = Duration::from_secs(10 * 60);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyValue {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
}

impl KeyValue {
    pub fn new(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Ordered key value store the history is written to.
///
/// Keys are compared as raw bytes. Puts are buffered by the backend until [`KVStore::flush_puts`]
/// while deletes are applied right away.
#[async_trait]
pub trait KVStore: Send + Sync {
    /// Fails with [`StorageError::NotFound`] when the key is absent
    async fn get(&self, key: &[u8]) -> Result<Vec<u8>, StorageError>;

    async fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StorageError>;

    async fn batch_delete(&self, keys: &[Vec<u8>]) -> Result<(), StorageError>;

    /// Returns the pairs in `[start, end)` in ascending key order.
    ///
    /// An empty `end` means no upper bound, a `limit` of 0 means no limit.
    async fn scan(
        &self,
        start: &[u8],
        end: &[u8],
        limit: usize,
    ) -> Result<Vec<KeyValue>, StorageError>;

    /// Durably commit the buffered puts
    async fn flush_puts(&self) -> Result<(), StorageError>;
}

pub type SharedStore = Arc<dyn KVStore>;

#[async_trait]
impl<S: KVStore + ?Sized> KVStore for Arc<S> {
    async fn get(&self, key: &[u8]) -> Result<Vec<u8>, StorageError> {
        (**self).get(key).await
    }

    async fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StorageError> {
        (**self).put(key, value).await
    }

    async fn batch_delete(&self, keys: &[Vec<u8>]) -> Result<(), StorageError> {
        (**self).batch_delete(keys).await
    }

    async fn scan(
        &self,
        start: &[u8],
        end: &[u8],
        limit: usize,
    ) -> Result<Vec<KeyValue>, StorageError> {
        (**self).scan(start, end, limit).await
    }

    async fn flush_puts(&self) -> Result<(), StorageError> {
        (**self).flush_puts().await
    }
}

/// Run one store operation under [`DATABASE_TIMEOUT`].
pub async fn with_timeout<T, F>(operation: F) -> Result<T, StorageError>
where
    F: Future<Output = Result<T, StorageError>>,
{
    with_deadline(DATABASE_TIMEOUT, operation).await
}

pub async fn with_deadline<T, F>(deadline: Duration, operation: F) -> Result<T, StorageError>
where
    F: Future<Output = Result<T, StorageError>>,
{
    tokio::time::timeout(deadline, operation)
        .await
        .map_err(|_| StorageError::Timeout(deadline))?
}

/// Whether `key` sorts before the exclusive `end` bound, an empty bound being unbounded.
pub(crate) fn before_end(key: &[u8], end: &[u8]) -> bool {
    end.is_empty() || key < end
}
