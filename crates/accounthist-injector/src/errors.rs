use accounthist_core::errors::{CheckpointError, RowError};
use accounthist_storage::StorageError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BlockSourceError {
    #[error("Unable to read the block source: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unable to decode the block at line {line}: {source}")]
    Decode {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Error, Debug)]
pub enum InjectorError {
    #[error("Unable to build the injector: no store provided")]
    NoStore,

    #[error("Unable to build the injector: no block source provided")]
    NoBlockSource,

    #[error("Invalid flush blocks interval, it must be greater than 0")]
    InvalidFlushInterval,

    #[error("Unable to resolve the start block {target}: {reason}")]
    StartBlockResolution { target: u64, reason: String },

    #[error(transparent)]
    BlockSource(#[from] BlockSourceError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Row(#[from] RowError),

    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),
}
