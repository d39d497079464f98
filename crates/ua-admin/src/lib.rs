//! # ua-admin
//!
//! Module dispatch and the admin session for useradm.
//!
//! ## Example
//!
//! ```no_run
//! use ua_admin::{AdminSession, DefaultsPrompter};
//! use ua_core::AdminConfig;
//! use ua_directory::Ldap3Connector;
//!
//! let session = AdminSession::open(AdminConfig::default(), &DefaultsPrompter, &Ldap3Connector)?;
//! let mut alice = session.new_user("alice")?;
//! session.add(&mut alice)?;
//! session.set_password(&mut alice, "correct horse", false)?;
//! # Ok::<(), ua_core::Error>(())
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod dispatcher;
pub mod home;
pub mod prompt;
pub mod session;

pub use dispatcher::{merge, Dispatcher, SharedModule};
pub use prompt::{DefaultsPrompter, Prompt, Prompter};
pub use session::AdminSession;
