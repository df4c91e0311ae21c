//! Error types for SegDB core.

use crate::predicate::CompileError;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in store operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The request is malformed (for example an empty segment ID).
    #[error("validation failed: {message}")]
    Validation {
        /// Description of the problem.
        message: String,
    },

    /// A segment's filter expression does not compile.
    #[error("segment {id:?} has an invalid filter: {source}")]
    Compile {
        /// The segment whose filter failed.
        id: String,
        /// The compiler's diagnosis.
        #[source]
        source: CompileError,
    },

    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(#[from] segdb_storage::StorageError),

    /// CBOR codec error.
    #[error("codec error: {0}")]
    Codec(#[from] segdb_codec::CodecError),

    /// No segment with this ID exists.
    #[error("segment not found: {id:?}")]
    NotFound {
        /// The ID that was looked up.
        id: String,
    },

    /// The index state disagrees with the segment map.
    #[error("index drift: {message}")]
    IndexDrift {
        /// The first difference found.
        message: String,
    },
}

impl CoreError {
    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Creates a compile error for the given segment.
    pub fn compile(id: impl Into<String>, source: CompileError) -> Self {
        Self::Compile {
            id: id.into(),
            source,
        }
    }

    /// Creates a not-found error.
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    /// Creates an index drift error.
    pub fn index_drift(message: impl Into<String>) -> Self {
        Self::IndexDrift {
            message: message.into(),
        }
    }

    /// Returns true for [`CoreError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
