//! Error handling for useradm.
//!
//! Validation and duplicate errors are raised before any backend is mutated.
//! A [`Error::Module`] raised during a commit names the modules that had
//! already applied the change; nothing is rolled back automatically.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using the useradm error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for account administration.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed name or attribute.
    #[error("validation error: {0}")]
    Validation(String),

    /// A mutation targeted an entry no configured module holds.
    #[error("no such {kind}: {name}")]
    NotFound {
        /// Entry kind ("user" or "group").
        kind: &'static str,
        /// Primary name that was looked for.
        name: String,
    },

    /// Uniqueness violation on add or rename.
    #[error("duplicate {kind}: {field} '{value}' already exists")]
    Duplicate {
        /// Entry kind ("user" or "group").
        kind: &'static str,
        /// Attribute holding the conflicting value.
        field: &'static str,
        /// Conflicting value.
        value: String,
    },

    /// Credential uses an unrecognized scheme, or unlock would leave it empty.
    #[error("lock error: {0}")]
    Lock(String),

    /// Backend I/O, schema or authentication failure.
    #[error("module {module} failed: {message} (already committed: [{}])", .committed.join(", "))]
    Module {
        /// Module that failed.
        module: String,
        /// Modules that had applied the change before the failure.
        committed: Vec<String>,
        /// Failure description.
        message: String,
    },

    /// Missing or invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// A home directory could not be created, moved or removed.
    #[error("home directory {}: {message}", .path.display())]
    HomeDirectory {
        /// Path being worked on.
        path: PathBuf,
        /// Failure description.
        message: String,
    },
}

impl Error {
    /// Creates a validation error.
    #[must_use]
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Creates a not-found error.
    #[must_use]
    pub fn not_found(kind: &'static str, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            name: name.into(),
        }
    }

    /// Creates a duplicate error.
    #[must_use]
    pub fn duplicate(kind: &'static str, field: &'static str, value: impl Into<String>) -> Self {
        Self::Duplicate {
            kind,
            field,
            value: value.into(),
        }
    }

    /// Creates a lock error.
    #[must_use]
    pub fn lock(msg: impl Into<String>) -> Self {
        Self::Lock(msg.into())
    }

    /// Creates a module error.
    #[must_use]
    pub fn module(
        module: impl Into<String>,
        committed: Vec<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Module {
            module: module.into(),
            committed,
            message: message.into(),
        }
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a home directory error.
    #[must_use]
    pub fn home_directory(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::HomeDirectory {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Returns whether the error was raised before any backend was touched.
    #[must_use]
    pub fn is_clean_abort(&self) -> bool {
        match self {
            Self::Module { committed, .. } => committed.is_empty(),
            _ => true,
        }
    }

    /// Returns whether some modules applied the change before the failure.
    #[must_use]
    pub fn is_partial(&self) -> bool {
        !self.is_clean_abort()
    }

    /// Checks if this is a duplicate error.
    #[must_use]
    pub const fn is_duplicate(&self) -> bool {
        matches!(self, Self::Duplicate { .. })
    }

    /// Checks if this is a not-found error.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Checks if this is a lock error.
    #[must_use]
    pub const fn is_lock(&self) -> bool {
        matches!(self, Self::Lock(_))
    }

    /// Checks if this is a home directory error.
    #[must_use]
    pub const fn is_home_directory(&self) -> bool {
        matches!(self, Self::HomeDirectory { .. })
    }

    /// Checks if this is a validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}
