use std::{fmt::Debug, path::Path, sync::Arc};

use rocksdb::{ColumnFamilyDescriptor, DBWithThreadMode, MultiThreaded, Options};

use crate::errors::StorageError;

pub(crate) type RocksDB = DBWithThreadMode<MultiThreaded>;

pub(crate) fn default_options() -> Options {
    let mut options = Options::default();
    options.create_if_missing(true);
    options.create_missing_column_families(true);
    options
}

pub(crate) fn init_with_cfs(
    path: &Path,
    options: Options,
    cfs: Vec<ColumnFamilyDescriptor>,
) -> Result<Arc<RocksDB>, StorageError> {
    Ok(Arc::new(RocksDB::open_cf_descriptors(&options, path, cfs)?))
}

pub(crate) struct DebugDB<'a>(pub(crate) &'a RocksDB);

impl Debug for DebugDB<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RocksDB")
            .field("path", &self.0.path())
            .finish()
    }
}
