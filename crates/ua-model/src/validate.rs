//! Name validation shared by users and groups.

use thiserror::Error;

/// Reasons a proposed name is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Name is empty.
    #[error("name is empty")]
    Empty,

    /// Name is longer than the configured maximum.
    #[error("name is {len} characters long, the maximum is {max}")]
    TooLong {
        /// Actual length.
        len: usize,
        /// Configured maximum.
        max: usize,
    },

    /// Name contains a character outside 7-bit ASCII.
    #[error("name contains non-ASCII character {0:?}")]
    NonAscii(char),

    /// Name contains a control character.
    #[error("name contains non-printable character {0:?}")]
    NonPrintable(char),

    /// Name contains whitespace.
    #[error("name contains whitespace")]
    Whitespace,

    /// Name starts with a hyphen.
    #[error("name starts with a hyphen")]
    LeadingHyphen,
}

/// Checks proposed user and group names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NameValidator {
    max_length: usize,
}

impl Default for NameValidator {
    fn default() -> Self {
        Self::new(32)
    }
}

impl NameValidator {
    /// Creates a validator accepting names up to `max_length` characters.
    #[must_use]
    pub const fn new(max_length: usize) -> Self {
        Self { max_length }
    }

    /// Configured maximum length.
    #[must_use]
    pub const fn max_length(&self) -> usize {
        self.max_length
    }

    /// Validates `name`. All-digit names are accepted as they are.
    ///
    /// # Errors
    ///
    /// Returns the first rule the name breaks.
    pub fn validate(&self, name: &str) -> Result<(), ValidationError> {
        if name.is_empty() {
            return Err(ValidationError::Empty);
        }

        let len = name.chars().count();
        if len > self.max_length {
            return Err(ValidationError::TooLong {
                len,
                max: self.max_length,
            });
        }

        for c in name.chars() {
            if !c.is_ascii() {
                return Err(ValidationError::NonAscii(c));
            }
            if c.is_ascii_whitespace() {
                return Err(ValidationError::Whitespace);
            }
            if c.is_ascii_control() {
                return Err(ValidationError::NonPrintable(c));
            }
        }

        if name.starts_with('-') {
            return Err(ValidationError::LeadingHyphen);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_ordinary_names() {
        let v = NameValidator::default();
        assert!(v.validate("alice").is_ok());
        assert!(v.validate("web-admins").is_ok());
        assert!(v.validate("svc_backup$").is_ok());
    }

    #[test]
    fn accepts_numeric_names() {
        let v = NameValidator::default();
        assert!(v.validate("077").is_ok());
        assert!(v.validate("1000").is_ok());
    }

    #[test]
    fn rejects_by_rule() {
        let v = NameValidator::new(8);
        assert_eq!(v.validate(""), Err(ValidationError::Empty));
        assert_eq!(
            v.validate("abcdefghi"),
            Err(ValidationError::TooLong { len: 9, max: 8 })
        );
        assert_eq!(v.validate("bad name"), Err(ValidationError::Whitespace));
        assert_eq!(v.validate("tab\tx"), Err(ValidationError::Whitespace));
        assert_eq!(v.validate("bel\u{7}"), Err(ValidationError::NonPrintable('\u{7}')));
        assert_eq!(v.validate("caf\u{e9}"), Err(ValidationError::NonAscii('\u{e9}')));
        assert_eq!(v.validate("-rf"), Err(ValidationError::LeadingHyphen));
    }

    #[test]
    fn length_counts_characters() {
        let v = NameValidator::new(3);
        assert!(v.validate("abc").is_ok());
        assert!(v.validate("abcd").is_err());
    }
}
