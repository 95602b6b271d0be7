//! Storage error types.

use thiserror::Error;

/// Errors from filesystem-facing operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("archive error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

/// Result type for storage operations.
pub type StorageResult<T> = std::result::Result<T, StorageError>;
