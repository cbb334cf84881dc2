use std::{fmt::Debug, fs::create_dir_all, path::Path, sync::Arc};

use async_trait::async_trait;
use rocksdb::{BoundColumnFamily, ColumnFamilyDescriptor, WriteBatch, WriteOptions};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::errors::StorageError;
use crate::store::{before_end, KVStore, KeyValue};

use self::db::{default_options, init_with_cfs, DebugDB, RocksDB};

pub(crate) mod constants;
pub(crate) mod db;

/// RocksDB backed store.
///
/// Puts accumulate in a [`WriteBatch`] written with `sync` on flush, deletes are written right
/// away.
pub struct RocksDBStore {
    db: Arc<RocksDB>,
    pending: Mutex<WriteBatch>,
}

impl Debug for RocksDBStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RocksDBStore")
            .field("db", &DebugDB(&self.db))
            .finish()
    }
}

impl RocksDBStore {
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        if !path.exists() {
            warn!("Path {:?} does not exist, creating it", path);
            create_dir_all(path)
                .map_err(|error| StorageError::UnableToStartStorage(error.to_string()))?;
        }

        let cfs = vec![ColumnFamilyDescriptor::new(
            constants::ACCOUNTHIST,
            default_options(),
        )];

        let db = init_with_cfs(path, default_options(), cfs)?;
        debug!("Opened accounthist database at {:?}", path);

        Ok(Self {
            db,
            pending: Mutex::new(WriteBatch::default()),
        })
    }

    fn cf(&self) -> Result<Arc<BoundColumnFamily<'_>>, StorageError> {
        self.db
            .cf_handle(constants::ACCOUNTHIST)
            .ok_or(StorageError::InvalidColumnFamily(constants::ACCOUNTHIST))
    }
}

#[async_trait]
impl KVStore for RocksDBStore {
    async fn get(&self, key: &[u8]) -> Result<Vec<u8>, StorageError> {
        self.db
            .get_cf(&self.cf()?, key)?
            .ok_or(StorageError::NotFound)
    }

    async fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StorageError> {
        let mut pending = self.pending.lock().await;
        pending.put_cf(&self.cf()?, key, value);

        Ok(())
    }

    async fn batch_delete(&self, keys: &[Vec<u8>]) -> Result<(), StorageError> {
        let cf = self.cf()?;
        let mut batch = WriteBatch::default();
        for key in keys {
            batch.delete_cf(&cf, key);
        }

        self.db.write(batch)?;

        Ok(())
    }

    async fn scan(
        &self,
        start: &[u8],
        end: &[u8],
        limit: usize,
    ) -> Result<Vec<KeyValue>, StorageError> {
        let cf = self.cf()?;
        let mut iterator = self.db.raw_iterator_cf(&cf);
        iterator.seek(start);

        let mut pairs = Vec::new();
        while iterator.valid() {
            let (Some(key), Some(value)) = (iterator.key(), iterator.value()) else {
                break;
            };

            if !before_end(key, end) {
                break;
            }

            pairs.push(KeyValue::new(key, value));
            if limit != 0 && pairs.len() >= limit {
                break;
            }

            iterator.next();
        }

        iterator.status()?;

        Ok(pairs)
    }

    async fn flush_puts(&self) -> Result<(), StorageError> {
        let batch = std::mem::take(&mut *self.pending.lock().await);
        if batch.is_empty() {
            return Ok(());
        }

        let mut options = WriteOptions::default();
        options.set_sync(true);
        self.db.write_opt(batch, &options)?;

        Ok(())
    }
}
