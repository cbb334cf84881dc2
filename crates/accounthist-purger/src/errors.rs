use accounthist_storage::StorageError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PurgerError {
    #[error("Max entries per facet must be greater than 0")]
    InvalidMaxEntries,

    #[error("Purge batch size must be greater than 0")]
    InvalidBatchSize,

    #[error(transparent)]
    Storage(#[from] StorageError),
}
