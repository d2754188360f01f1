//! Error types for RELIDB core.

use relidb_codec::TransformError;
use relidb_storage::StorageError;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in core mapping operations.
///
/// Schema and transform errors are programming errors and propagate
/// immediately; there are no retries. A query with zero matches is an
/// empty result, never an error.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A value did not match its transformer's domain.
    #[error(transparent)]
    Transform(#[from] TransformError),

    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// A property name is not declared in the schema.
    #[error("unknown property `{property}` on `{table}`")]
    UnknownProperty {
        /// The property that was looked up.
        property: String,
        /// The table whose schema was consulted.
        table: String,
    },

    /// A column name is not declared in the schema.
    #[error("unknown column `{column}` on `{table}`")]
    UnknownColumn {
        /// The column that was looked up.
        column: String,
        /// The table whose schema was consulted.
        table: String,
    },

    /// An ordering comparison was attempted on a non-numeric value.
    #[error("property `{property}` does not resolve to an orderable value")]
    NotOrderable {
        /// The property whose resolved scalar is not numeric.
        property: String,
    },

    /// An operation was attempted on a deleted entry.
    #[error("cannot {operation} a deleted entry")]
    UseAfterDelete {
        /// The operation that was attempted.
        operation: &'static str,
    },

    /// An operation needed an implicit backend but none is configured.
    #[error("no default backend configured")]
    NoDefaultBackend,
}

impl CoreError {
    /// Creates an unknown property error.
    pub fn unknown_property(property: impl Into<String>, table: impl Into<String>) -> Self {
        Self::UnknownProperty {
            property: property.into(),
            table: table.into(),
        }
    }

    /// Creates an unknown column error.
    pub fn unknown_column(column: impl Into<String>, table: impl Into<String>) -> Self {
        Self::UnknownColumn {
            column: column.into(),
            table: table.into(),
        }
    }

    /// Creates a not orderable error.
    pub fn not_orderable(property: impl Into<String>) -> Self {
        Self::NotOrderable {
            property: property.into(),
        }
    }

    /// Creates a use after delete error.
    pub fn use_after_delete(operation: &'static str) -> Self {
        Self::UseAfterDelete { operation }
    }
}
