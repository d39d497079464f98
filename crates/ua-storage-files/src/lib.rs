//! # ua-storage-files
//!
//! Flat-file backend module for useradm.
//!
//! Users live in `passwd` (and `shadow`), groups in `group` (and `gshadow`),
//! one colon-separated line per entry. Comment lines and `+`/`-` merge
//! placeholders are kept verbatim across rewrites and never show up in
//! lookups or enumeration.
//!
//! Writers serialize on an advisory lock and replace files atomically, with an
//! optional `<file>-` backup of the previous contents.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod layout;
pub mod module;
pub mod store;

pub use module::{FilesModule, MODULE_NAME};
pub use store::FileStore;
