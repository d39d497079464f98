//! Directory-service error types.
//!
//! Messages never carry the bind password.

use thiserror::Error;
use ua_storage::StorageError;

/// Directory-service errors.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// Invalid configuration.
    #[error("directory configuration error: {0}")]
    Configuration(String),

    /// Connection URL must use LDAPS.
    #[error("only LDAPS is supported: the URL must start with 'ldaps://'")]
    InsecureProtocol,

    /// Connection failed.
    #[error("directory connection failed: {0}")]
    Connection(String),

    /// Bind (authentication) failed.
    #[error("directory bind failed: {0}")]
    Bind(String),

    /// The target entry does not exist.
    #[error("no such directory entry: {0}")]
    NoSuchEntry(String),

    /// The target entry already exists.
    #[error("directory entry already exists: {0}")]
    AlreadyExists(String),

    /// The server rejected the entry's shape.
    #[error("directory schema violation: {0}")]
    Schema(String),

    /// The server did not answer in time.
    #[error("directory operation timed out")]
    Timeout,

    /// Any other result code from the server.
    #[error("directory protocol error: {0}")]
    Protocol(String),

    /// Underlying ldap3 error.
    #[error("LDAP error: {0}")]
    Ldap3(#[from] ldap3::LdapError),
}

impl DirectoryError {
    /// Creates a configuration error.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Creates a connection error.
    #[must_use]
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates a protocol error.
    #[must_use]
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    /// Classifies an ldap3 error by its LDAP result code.
    #[must_use]
    pub fn from_ldap(err: ldap3::LdapError) -> Self {
        match err {
            ldap3::LdapError::LdapResult { result } => {
                let text = if result.text.is_empty() {
                    format!("result code {}", result.rc)
                } else {
                    format!("{} (result code {})", result.text, result.rc)
                };
                match result.rc {
                    3 => Self::Timeout,
                    32 => Self::NoSuchEntry(result.matched),
                    49 => Self::Bind(text),
                    17 | 21 | 64 | 65 | 67 | 69 => Self::Schema(text),
                    68 => Self::AlreadyExists(text),
                    _ => Self::Protocol(text),
                }
            }
            other => Self::Ldap3(other),
        }
    }

    /// Checks if this is a connection-related error.
    #[must_use]
    pub const fn is_connection_error(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Timeout | Self::Ldap3(_))
    }

    /// Checks if this is a security-related error.
    #[must_use]
    pub const fn is_security_error(&self) -> bool {
        matches!(self, Self::InsecureProtocol | Self::Bind(_))
    }
}

/// Result type for directory operations.
pub type DirectoryResult<T> = Result<T, DirectoryError>;

impl From<DirectoryError> for StorageError {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::Configuration(msg) => Self::Internal(msg),
            DirectoryError::InsecureProtocol => Self::Internal(err.to_string()),
            DirectoryError::Connection(msg) => Self::Connection(msg),
            DirectoryError::Bind(msg) => Self::Authentication(msg),
            DirectoryError::NoSuchEntry(dn) => Self::Corrupt(format!("entry vanished: {dn}")),
            DirectoryError::AlreadyExists(msg) => Self::Schema(msg),
            DirectoryError::Schema(msg) => Self::Schema(msg),
            DirectoryError::Timeout => Self::Timeout,
            DirectoryError::Protocol(msg) => Self::Internal(msg),
            DirectoryError::Ldap3(e) => Self::Connection(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_categories() {
        assert!(DirectoryError::InsecureProtocol.is_security_error());
        assert!(DirectoryError::Bind("invalid credentials".to_string()).is_security_error());
        assert!(DirectoryError::connection("refused").is_connection_error());
        assert!(DirectoryError::Timeout.is_connection_error());
        assert!(!DirectoryError::protocol("busy").is_connection_error());
    }

    #[test]
    fn converts_into_storage_errors() {
        let err: StorageError = DirectoryError::Bind("invalid credentials".to_string()).into();
        assert!(matches!(err, StorageError::Authentication(_)));

        let err: StorageError = DirectoryError::Timeout.into();
        assert!(matches!(err, StorageError::Timeout));
    }

    #[test]
    fn insecure_protocol_message() {
        assert!(DirectoryError::InsecureProtocol.to_string().contains("ldaps://"));
    }
}
