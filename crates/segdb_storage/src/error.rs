//! Error types for storage operations.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A record could not be encoded or decoded.
    #[error("codec error: {0}")]
    Codec(#[from] segdb_codec::CodecError),

    /// A stored record is unreadable.
    #[error("corrupted record at {path}: {message}")]
    Corrupted {
        /// File holding the record.
        path: PathBuf,
        /// Description of the corruption.
        message: String,
    },

    /// Delete was called for an ID the backend does not hold.
    #[error("segment {0:?} is not stored")]
    Missing(String),

    /// The backend refused the operation.
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}
