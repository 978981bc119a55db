//! Error types for the content model.

use thiserror::Error;

/// Result type for content operations.
pub type ContentResult<T> = Result<T, ContentError>;

/// Errors that can occur while transforming content.
///
/// Malformed embeds are not errors; they are reported as
/// [`crate::ExtractionWarning`]s.
#[derive(Debug, Error)]
pub enum ContentError {
    /// The blob store failed while storing or fetching attachment bytes.
    #[error("blob store error: {0}")]
    Storage(#[from] notedb_storage::StorageError),

    /// An attachment resolver failed.
    #[error("attachment resolver failed for {hash}: {message}")]
    Resolver {
        /// Hash being resolved.
        hash: String,
        /// Description of the failure.
        message: String,
    },
}

impl ContentError {
    /// Creates a resolver error.
    pub fn resolver(hash: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Resolver {
            hash: hash.into(),
            message: message.into(),
        }
    }
}
