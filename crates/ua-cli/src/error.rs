//! CLI error types.

use thiserror::Error;

/// CLI error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Failure reported by the admin session.
    #[error(transparent)]
    Admin(#[from] ua_core::Error),

    /// Named entry does not exist.
    #[error("{kind} not found: {name}")]
    NotFound {
        /// Entry kind.
        kind: &'static str,
        /// Name looked for.
        name: String,
    },

    /// Validation error.
    #[error("validation error: {0}")]
    Validation(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid argument.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl CliError {
    /// Process exit code for this error.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Admin(e) if e.is_partial() => 3,
            Self::Admin(ua_core::Error::Config(_)) => 4,
            Self::InvalidArgument(_) | Self::Validation(_) => 2,
            _ => 1,
        }
    }
}

/// CLI result type.
pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_commits_have_their_own_exit_code() {
        let partial = CliError::from(ua_core::Error::module("ldap", vec!["files".into()], "down"));
        assert_eq!(partial.exit_code(), 3);

        let clean = CliError::from(ua_core::Error::module("files", Vec::new(), "denied"));
        assert_eq!(clean.exit_code(), 1);

        assert_eq!(CliError::InvalidArgument("x".into()).exit_code(), 2);
    }
}
