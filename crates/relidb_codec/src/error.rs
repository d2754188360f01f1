//! Error types for the codec crate.

use thiserror::Error;

/// Result type for transformer operations.
pub type TransformResult<T> = Result<T, TransformError>;

/// Errors that can occur while transforming values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransformError {
    /// The input value does not belong to the transformer's domain.
    #[error("invalid transform: expected {expected}, got {actual}")]
    InvalidTransform {
        /// Description of the expected value shape.
        expected: &'static str,
        /// Description of the value that was actually supplied.
        actual: String,
    },

    /// A scalar decoded to a value outside the representable range.
    #[error("value out of range: {message}")]
    OutOfRange {
        /// Description of the range violation.
        message: String,
    },
}

impl TransformError {
    /// Creates an invalid transform error.
    pub fn invalid(expected: &'static str, actual: impl std::fmt::Display) -> Self {
        Self::InvalidTransform {
            expected,
            actual: actual.to_string(),
        }
    }

    /// Creates an out of range error.
    pub fn out_of_range(message: impl Into<String>) -> Self {
        Self::OutOfRange {
            message: message.into(),
        }
    }
}
