//! # ua-crypto
//!
//! Credential handling for useradm.
//!
//! - [`LockScheme`]: pure functions encoding the locked state of a stored
//!   credential. Two conventions exist: shadow files prefix a doubled `!!`
//!   to an untagged hash, directory entries prefix a single `!` after a
//!   `{CRYPT}` tag.
//! - [`CredentialHasher`]: the one-way hashing collaborator, with an Argon2id
//!   implementation producing self-describing PHC strings.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod error;
pub mod hash;
pub mod lock;

#[cfg(test)]
mod capture;

pub use error::{HashError, HashResult, LockError, LockResult};
pub use hash::{Argon2Hasher, CredentialHasher, HashPolicy};
pub use lock::LockScheme;
