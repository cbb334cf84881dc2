use accounthist_core::errors::{CursorError, KeyError, RowError};
use accounthist_storage::StorageError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Cursor(#[from] CursorError),

    #[error("Unable to decode row key: {0}")]
    Key(#[from] KeyError),

    #[error("Unable to decode row value: {0}")]
    Row(#[from] RowError),

    #[error("Backend error: {0}")]
    Storage(#[from] StorageError),
}

impl ApiError {
    /// Whether the request itself was at fault, as opposed to the backend
    pub fn is_request_error(&self) -> bool {
        matches!(self, ApiError::InvalidArgument(_) | ApiError::Cursor(_))
    }
}
