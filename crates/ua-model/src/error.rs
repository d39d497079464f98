//! Attribute access errors.

use thiserror::Error;

/// Errors raised when reading a record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttributeError {
    /// The key is not present in the record.
    #[error("attribute not present: {0}")]
    NotPresent(String),

    /// The key is present but holds no values.
    #[error("attribute has no values: {0}")]
    Empty(String),

    /// The value has the wrong type for the requested read.
    #[error("attribute {key} is not {expected}")]
    TypeMismatch {
        /// Attribute key.
        key: String,
        /// Expected type ("text" or "integer").
        expected: &'static str,
    },
}

impl AttributeError {
    /// Checks if the key was absent.
    #[must_use]
    pub const fn is_not_present(&self) -> bool {
        matches!(self, Self::NotPresent(_))
    }
}

/// Result type for attribute reads.
pub type AttributeResult<T> = Result<T, AttributeError>;
