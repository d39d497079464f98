//! The directory client seam.
//!
//! [`DirectoryModule`](crate::DirectoryModule) talks to the server only
//! through [`DirectoryClient`], so it runs unchanged against ldap3 or against
//! the in-memory directory used in tests.

use std::collections::BTreeMap;

use crate::config::{escape_filter_value, DirectoryConfig};
use crate::error::DirectoryResult;

/// One directory entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirEntry {
    /// Distinguished name.
    pub dn: String,
    /// Attributes; every attribute is multi-valued.
    pub attributes: BTreeMap<String, Vec<String>>,
}

impl DirEntry {
    /// Creates an entry with no attributes.
    #[must_use]
    pub fn new(dn: impl Into<String>) -> Self {
        Self {
            dn: dn.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// Adds an attribute.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, values: Vec<String>) -> Self {
        self.attributes.insert(name.into(), values);
        self
    }

    /// Values of `name`, matched case-insensitively.
    #[must_use]
    pub fn get_attrs(&self, name: &str) -> Option<&Vec<String>> {
        self.attributes
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    }

    /// First value of `name`.
    #[must_use]
    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.get_attrs(name)
            .and_then(|v| v.first())
            .map(String::as_str)
    }

    /// Checks whether `name` has at least one value.
    #[must_use]
    pub fn has_attr(&self, name: &str) -> bool {
        self.get_attrs(name).is_some_and(|v| !v.is_empty())
    }
}

/// Search filters the module needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchFilter {
    /// `(attr=value)`
    Equals {
        /// Attribute name.
        attr: String,
        /// Value, unescaped.
        value: String,
    },
    /// `(attr=*)`
    Present(String),
}

impl SearchFilter {
    /// Equality filter.
    #[must_use]
    pub fn equals(attr: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Equals {
            attr: attr.into(),
            value: value.into(),
        }
    }

    /// Presence filter.
    #[must_use]
    pub fn present(attr: impl Into<String>) -> Self {
        Self::Present(attr.into())
    }

    /// RFC 4515 string form.
    #[must_use]
    pub fn to_ldap_string(&self) -> String {
        match self {
            Self::Equals { attr, value } => format!("({attr}={})", escape_filter_value(value)),
            Self::Present(attr) => format!("({attr}=*)"),
        }
    }

    /// Evaluates the filter against `entry`.
    #[must_use]
    pub fn matches(&self, entry: &DirEntry) -> bool {
        match self {
            Self::Equals { attr, value } => entry
                .get_attrs(attr)
                .is_some_and(|values| values.iter().any(|v| v == value)),
            Self::Present(attr) => entry.has_attr(attr),
        }
    }
}

/// One change within a modify request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Modification {
    /// Replace every value of the attribute.
    Replace(String, Vec<String>),
    /// Remove the attribute.
    Delete(String),
}

/// Synchronous access to one bound directory connection.
///
/// Searches are one level deep under `base`.
pub trait DirectoryClient: Send {
    /// Searches the children of `base`.
    ///
    /// # Errors
    ///
    /// Returns an error on connection or protocol failure.
    fn search(&mut self, base: &str, filter: &SearchFilter) -> DirectoryResult<Vec<DirEntry>>;

    /// Creates an entry.
    ///
    /// # Errors
    ///
    /// Returns [`crate::DirectoryError::AlreadyExists`] if the DN is taken.
    fn add(&mut self, entry: &DirEntry) -> DirectoryResult<()>;

    /// Applies `changes` to the entry at `dn`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::DirectoryError::NoSuchEntry`] if `dn` does not exist.
    fn modify(&mut self, dn: &str, changes: &[Modification]) -> DirectoryResult<()>;

    /// Changes the RDN of `dn`, dropping the old RDN value.
    ///
    /// # Errors
    ///
    /// Returns [`crate::DirectoryError::AlreadyExists`] if the new DN is taken.
    fn rename(&mut self, dn: &str, new_rdn: &str) -> DirectoryResult<()>;

    /// Deletes the entry at `dn`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::DirectoryError::NoSuchEntry`] if `dn` does not exist.
    fn delete(&mut self, dn: &str) -> DirectoryResult<()>;

    /// Closes the connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the server could not be told.
    fn unbind(&mut self) -> DirectoryResult<()>;
}

/// Opens bound connections.
pub trait DirectoryConnector: Send + Sync {
    /// Connects and binds with `config`'s credentials.
    ///
    /// # Errors
    ///
    /// Returns a connection or bind error.
    fn connect(&self, config: &DirectoryConfig) -> DirectoryResult<Box<dyn DirectoryClient>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_render_escaped() {
        assert_eq!(SearchFilter::equals("uid", "a*b").to_ldap_string(), "(uid=a\\2ab)");
        assert_eq!(SearchFilter::present("cn").to_ldap_string(), "(cn=*)");
    }

    #[test]
    fn filters_match_entries() {
        let entry = DirEntry::new("uid=alice,ou=People,dc=example,dc=com")
            .with("uid", vec!["alice".to_string()])
            .with("uidNumber", vec!["1000".to_string()]);

        assert!(SearchFilter::equals("UIDNUMBER", "1000").matches(&entry));
        assert!(!SearchFilter::equals("uid", "bob").matches(&entry));
        assert!(SearchFilter::present("uid").matches(&entry));
        assert!(!SearchFilter::present("cn").matches(&entry));
    }
}
