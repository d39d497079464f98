//! Locked-credential encoding.
//!
//! A stored credential is `[tag]body`. The tag is fixed per scheme (`{CRYPT}`
//! for directory entries, nothing for shadow files). A locked credential has
//! the scheme's marker at the start of the body.

use crate::error::{LockError, LockResult};

/// One backend's convention for tagging and locking credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockScheme {
    tag: Option<&'static str>,
    marker: &'static str,
}

impl LockScheme {
    /// Shadow files: untagged crypt output, locked with `!!`.
    pub const SHADOW: Self = Self {
        tag: None,
        marker: "!!",
    };

    /// Directory entries: `{CRYPT}` tagged, locked with `!`.
    pub const DIRECTORY: Self = Self {
        tag: Some("{CRYPT}"),
        marker: "!",
    };

    /// Creates a custom scheme.
    #[must_use]
    pub const fn new(tag: Option<&'static str>, marker: &'static str) -> Self {
        Self { tag, marker }
    }

    /// Lock marker.
    #[must_use]
    pub const fn marker(&self) -> &'static str {
        self.marker
    }

    /// Scheme tag, if the scheme uses one.
    #[must_use]
    pub const fn tag(&self) -> Option<&'static str> {
        self.tag
    }

    /// Splits `stored` into its tag as written and the body.
    fn split<'a>(&self, stored: &'a str) -> LockResult<(&'a str, &'a str)> {
        match self.tag {
            Some(tag) => match stored.get(..tag.len()) {
                Some(head) if head.eq_ignore_ascii_case(tag) => Ok((head, &stored[tag.len()..])),
                _ => Err(unrecognized(stored)),
            },
            None => {
                if scheme_tag(stored).is_some() {
                    Err(unrecognized(stored))
                } else {
                    Ok(("", stored))
                }
            }
        }
    }

    /// Checks whether `stored` is in this scheme.
    #[must_use]
    pub fn recognizes(&self, stored: &str) -> bool {
        self.split(stored).is_ok()
    }

    /// Checks whether `stored` is locked.
    ///
    /// # Errors
    ///
    /// Returns [`LockError::UnrecognizedScheme`] for values in another scheme.
    pub fn is_locked(&self, stored: &str) -> LockResult<bool> {
        let (_, body) = self.split(stored)?;
        Ok(body.starts_with(self.marker))
    }

    /// Locks `stored`. Already-locked values are returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`LockError::UnrecognizedScheme`] for values in another scheme.
    pub fn lock(&self, stored: &str) -> LockResult<String> {
        let (tag, body) = self.split(stored)?;
        if body.starts_with(self.marker) {
            tracing::debug!(marker = self.marker, "credential already locked");
            return Ok(stored.to_string());
        }
        Ok(format!("{tag}{}{body}", self.marker))
    }

    /// Unlocks `stored` by removing one leading marker.
    ///
    /// # Errors
    ///
    /// Returns [`LockError::UnrecognizedScheme`] for values in another scheme
    /// and [`LockError::EmptyCredential`] when the result would be empty and
    /// `allow_empty` is false.
    pub fn unlock(&self, stored: &str, allow_empty: bool) -> LockResult<String> {
        let (tag, body) = self.split(stored)?;
        let body = body.strip_prefix(self.marker).unwrap_or(body);
        if body.is_empty() && !allow_empty {
            tracing::debug!("refusing to unlock to an empty credential");
            return Err(LockError::EmptyCredential);
        }
        Ok(format!("{tag}{body}"))
    }

    /// Wraps a hash produced by the hashing collaborator.
    #[must_use]
    pub fn wrap(&self, hash: &str) -> String {
        format!("{}{hash}", self.tag.unwrap_or_default())
    }

    /// Returns the hash inside `stored`, without tag or lock marker.
    ///
    /// # Errors
    ///
    /// Returns [`LockError::UnrecognizedScheme`] for values in another scheme.
    pub fn hash_part<'a>(&self, stored: &'a str) -> LockResult<&'a str> {
        let (_, body) = self.split(stored)?;
        Ok(body.strip_prefix(self.marker).unwrap_or(body))
    }

    /// Value stored by password removal: the tag with an empty hash.
    #[must_use]
    pub fn cleared(&self) -> String {
        self.tag.unwrap_or_default().to_string()
    }

    /// Value stored for an entry that has never had a password.
    #[must_use]
    pub fn no_password(&self) -> String {
        format!("{}!!", self.tag.unwrap_or_default())
    }
}

/// Returns the `{TAG}` prefix of an RFC 2307 style value.
fn scheme_tag(stored: &str) -> Option<&str> {
    if !stored.starts_with('{') {
        return None;
    }
    stored.find('}').map(|end| &stored[..=end])
}

fn unrecognized(stored: &str) -> LockError {
    let tag = scheme_tag(stored).map(str::to_string);
    tracing::debug!(tag = ?tag, "credential is in another scheme");
    LockError::UnrecognizedScheme { tag }
}
