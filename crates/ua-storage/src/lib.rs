//! # ua-storage
//!
//! Backend module interface for useradm.
//!
//! A backend module stores user and group entries in one storage system and
//! supplies that system's default values. Concrete modules live in their own
//! crates (`ua-storage-files`, `ua-directory`); the dispatcher in `ua-admin`
//! fans operations out over an ordered list of them.
//!
//! ## Building blocks
//!
//! - [`AccountModule`]: the trait every backend implements
//! - [`EntryView`]: a module's stored values plus its defaults for one entry
//! - [`Defaults`]: per-key default values applied only to absent keys
//! - [`CredentialPolicy`]: where a module keeps credentials and how it locks them
//! - [`NamePattern`]: glob matching on primary names, skipping placeholders

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod credential;
pub mod defaults;
pub mod error;
pub mod module;
pub mod pattern;

pub use credential::{CredentialChange, CredentialPolicy, CredentialSlot, CredentialSlots};
pub use defaults::{days_since_epoch, Defaults};
pub use error::{StorageError, StorageResult};
pub use module::{AccountModule, EntryView};
pub use pattern::NamePattern;
