//! Storage error types.

use thiserror::Error;
use ua_crypto::{HashError, LockError};
use ua_model::{AttributeError, EntityKind};

/// Errors that can occur in a backend module.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Entry not held by this module.
    #[error("no such {kind}: {name}")]
    NotFound {
        /// Kind of entry.
        kind: EntityKind,
        /// Primary name.
        name: String,
    },

    /// Duplicate entry (name or id already taken).
    #[error("duplicate {kind}: {field} '{value}' already exists")]
    Duplicate {
        /// Kind of entry.
        kind: EntityKind,
        /// Field that caused the conflict.
        field: &'static str,
        /// Conflicting value.
        value: String,
    },

    /// A record cannot be stored as given.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Credential lock encoding problem.
    #[error(transparent)]
    Lock(#[from] LockError),

    /// Hashing collaborator failure.
    #[error(transparent)]
    Hash(#[from] HashError),

    /// Missing or mistyped attribute.
    #[error(transparent)]
    Attribute(#[from] AttributeError),

    /// File I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored data cannot be parsed.
    #[error("corrupt storage: {0}")]
    Corrupt(String),

    /// Backend connection failure.
    #[error("connection error: {0}")]
    Connection(String),

    /// Backend rejected our credentials.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// Backend rejected the entry's shape.
    #[error("schema violation: {0}")]
    Schema(String),

    /// Backend did not answer in time.
    #[error("operation timed out")]
    Timeout,

    /// Internal error.
    #[error("internal storage error: {0}")]
    Internal(String),
}

impl StorageError {
    /// Creates a not found error.
    #[must_use]
    pub fn not_found(kind: EntityKind, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            name: name.into(),
        }
    }

    /// Creates a duplicate error.
    #[must_use]
    pub fn duplicate(kind: EntityKind, field: &'static str, value: impl Into<String>) -> Self {
        Self::Duplicate {
            kind,
            field,
            value: value.into(),
        }
    }

    /// Creates an invalid data error.
    #[must_use]
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidData(msg.into())
    }

    /// Creates a corrupt storage error.
    #[must_use]
    pub fn corrupt(msg: impl Into<String>) -> Self {
        Self::Corrupt(msg.into())
    }

    /// Checks if this is a not found error.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Checks if this is a duplicate error.
    #[must_use]
    pub const fn is_duplicate(&self) -> bool {
        matches!(self, Self::Duplicate { .. })
    }

    /// Checks if the caller supplied something unusable.
    #[must_use]
    pub const fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidData(_) | Self::Attribute(_))
    }

    /// Checks if this is a credential lock error.
    #[must_use]
    pub const fn is_lock(&self) -> bool {
        matches!(self, Self::Lock(_))
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
