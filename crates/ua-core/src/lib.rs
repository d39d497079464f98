//! # ua-core
//!
//! Error taxonomy and configuration shared by every useradm crate.
//!
//! The error type mirrors the categories callers react to: malformed input,
//! uniqueness violations, credential encoding problems, backend failures and
//! missing configuration. Backend crates keep their own richer error enums and
//! the dispatcher maps them onto [`Error`].

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod config;
pub mod error;

pub use config::AdminConfig;
pub use error::{Error, Result};
