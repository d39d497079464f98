//! # ua-cli
//!
//! Command-line front end for useradm.
//!
//! ## Usage
//!
//! ```bash
//! # Create a user in every configured module
//! useradm user add alice --gecos "Alice Liddell"
//!
//! # Lock a password
//! useradm user lock alice
//!
//! # List groups as JSON
//! useradm -o json group list 'adm*'
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod cli;
pub mod commands;
pub mod error;
pub mod output;
pub mod prompt;

pub use cli::Cli;
pub use error::{CliError, CliResult};
