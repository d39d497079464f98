//! Credential error types.
//!
//! Messages never include the credential itself, only its scheme tag.

use thiserror::Error;

/// Errors from the lock codec.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LockError {
    /// The stored value does not use the scheme this module expects.
    #[error("credential uses an unrecognized scheme{}", .tag.as_deref().map(|t| format!(" {t}")).unwrap_or_default())]
    UnrecognizedScheme {
        /// Scheme tag found on the value, if any.
        tag: Option<String>,
    },

    /// Unlocking would leave an empty active credential.
    #[error("cannot produce an empty active credential")]
    EmptyCredential,
}

/// Result type for lock codec operations.
pub type LockResult<T> = Result<T, LockError>;

/// Errors from the hashing collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HashError {
    /// The stored hash cannot be parsed.
    #[error("malformed password hash: {0}")]
    Malformed(String),

    /// Hashing itself failed.
    #[error("password hashing failed: {0}")]
    Hashing(String),
}

impl HashError {
    /// Creates a malformed-hash error.
    #[must_use]
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed(msg.into())
    }

    /// Creates a hashing error.
    #[must_use]
    pub fn hashing(msg: impl Into<String>) -> Self {
        Self::Hashing(msg.into())
    }
}

/// Result type for hashing operations.
pub type HashResult<T> = Result<T, HashError>;
