//! Error types for notedb core.

use notedb_content::ContentError;
use notedb_storage::StorageError;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in notedb core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The caller supplied too little data, e.g. a tag without a title.
    #[error("validation failed: {message}")]
    Validation {
        /// Description of the problem.
        message: String,
    },

    /// A required item does not exist or is tombstoned.
    #[error("{collection} not found: {id}")]
    NotFound {
        /// Collection that was searched.
        collection: String,
        /// Requested id.
        id: String,
    },

    /// Storage or blob store failure. The enclosing transaction was aborted.
    #[error("backend error: {0}")]
    Backend(#[from] StorageError),

    /// Content transformation failure.
    #[error("content error: {0}")]
    Content(ContentError),

    /// A stored record could not be decoded.
    #[error("invalid format: {message}")]
    InvalidFormat {
        /// Description of the format error.
        message: String,
    },

    /// Transaction misuse, such as writing after commit.
    #[error("invalid operation: {message}")]
    InvalidOperation {
        /// Description of the invalid operation.
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

    /// Creates a not found error.
    pub fn not_found(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            collection: collection.into(),
            id: id.into(),
        }
    }

    /// Creates an invalid format error.
    pub fn invalid_format(message: impl Into<String>) -> Self {
        Self::InvalidFormat {
            message: message.into(),
        }
    }

    /// Creates an invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }
}

impl From<ContentError> for CoreError {
    fn from(err: ContentError) -> Self {
        match err {
            ContentError::Storage(storage) => Self::Backend(storage),
            other => Self::Content(other),
        }
    }
}
