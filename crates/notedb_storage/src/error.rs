//! Error types for storage operations.

use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The table was never initialized with `init`.
    #[error("table not initialized: {table}")]
    UnknownTable {
        /// Name of the table.
        table: String,
    },

    /// A record violated a backend constraint (missing id, wrong shape).
    #[error("constraint violation in table {table}: {message}")]
    Constraint {
        /// Name of the table.
        table: String,
        /// Description of the violation.
        message: String,
    },

    /// A record could not be built from a JSON value.
    #[error("invalid record: {0}")]
    InvalidRecord(String),

    /// Blob payload could not be decoded with the declared encoding.
    #[error("invalid blob encoding: {0}")]
    InvalidEncoding(String),

    /// The backend is temporarily or permanently unavailable.
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// JSON (de)serialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StorageError {
    /// Creates a constraint violation error.
    pub fn constraint(table: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Constraint {
            table: table.into(),
            message: message.into(),
        }
    }

    /// Creates an unknown table error.
    pub fn unknown_table(table: impl Into<String>) -> Self {
        Self::UnknownTable {
            table: table.into(),
        }
    }

    /// Creates an unavailable backend error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }
}
