//! # ua-directory
//!
//! Directory-service backend module for useradm.
//!
//! Users and groups are stored as RFC 2307 POSIX entries (`posixAccount`,
//! `shadowAccount`, `posixGroup`) below configurable containers. Credentials
//! live in `userPassword` as `{CRYPT}` values; other values of that attribute
//! are left untouched.
//!
//! ## Security
//!
//! - Only `ldaps://` URLs are accepted
//! - The bind password is never serialized
//! - Filter values and DN components are escaped
//!
//! ## Testing
//!
//! [`MemoryDirectory`] implements both [`DirectoryClient`] and
//! [`DirectoryConnector`], so [`DirectoryModule`] can be exercised without a
//! server.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod client;
pub mod config;
pub mod connection;
pub mod error;
pub mod mapper;
pub mod memory;
pub mod module;

pub use client::{DirEntry, DirectoryClient, DirectoryConnector, Modification, SearchFilter};
pub use config::DirectoryConfig;
pub use connection::{Ldap3Client, Ldap3Connector};
pub use error::{DirectoryError, DirectoryResult};
pub use memory::MemoryDirectory;
pub use module::{DirectoryModule, MODULE_NAME};
