//! Error types for storage operations.

use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// A uniqueness constraint was violated.
    ///
    /// Carries the conflicting column so callers can implement
    /// insert-or-update fallbacks.
    #[error("duplicate entry for column `{column}` on table `{table}`")]
    DuplicateEntry {
        /// Table the conflict occurred on.
        table: String,
        /// The column whose uniqueness was violated.
        column: String,
    },

    /// A regex predicate had an invalid pattern.
    #[error("invalid regex pattern {pattern:?}")]
    InvalidRegex {
        /// The offending pattern.
        pattern: String,
        /// The underlying regex error.
        #[source]
        source: regex::Error,
    },

    /// The backend cannot perform the requested operation.
    #[error("unsupported operation: {message}")]
    Unsupported {
        /// Description of what was unsupported.
        message: String,
    },
}

impl StorageError {
    /// Creates a duplicate entry error.
    pub fn duplicate_entry(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self::DuplicateEntry {
            table: table.into(),
            column: column.into(),
        }
    }

    /// Creates an unsupported operation error.
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported {
            message: message.into(),
        }
    }
}
