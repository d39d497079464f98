//! # ua-model
//!
//! The record model every backend speaks.
//!
//! An [`AttributeRecord`] is an ordered, multi-valued key/value container
//! describing one user or one group. Keys follow the catalogue in [`keys`];
//! values are either text or integers ([`AttrValue`]). Absent keys are
//! distinct from keys holding an empty sequence, and reads of absent keys
//! fail with [`AttributeError::NotPresent`].
//!
//! [`NameValidator`] checks proposed user and group names before any backend
//! is consulted.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod error;
pub mod keys;
pub mod record;
pub mod validate;
pub mod value;

pub use error::{AttributeError, AttributeResult};
pub use record::{AttributeRecord, EntityKind};
pub use validate::{NameValidator, ValidationError};
pub use value::AttrValue;
