use std::time::Duration;

use accounthist_core::errors::{CheckpointError, KeyError, RowError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Key not found")]
    NotFound,

    #[error("Storage operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Unable to start storage: {0}")]
    UnableToStartStorage(String),

    #[error("Storage backend failure: {0}")]
    Backend(String),

    #[cfg(feature = "rocksdb")]
    #[error("Unable to execute query: {0}")]
    RocksDBError(#[from] rocksdb::Error),

    #[cfg(feature = "rocksdb")]
    #[error("Accessing invalid column family: {0}")]
    InvalidColumnFamily(&'static str),

    #[error(transparent)]
    Key(#[from] KeyError),

    #[error(transparent)]
    Row(#[from] RowError),

    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),
}

impl StorageError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound)
    }
}
