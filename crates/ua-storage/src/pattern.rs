//! Glob matching for enumeration.
//!
//! Shell globs (`*`, `?`, `[...]`, `[!...]`, `\\` escapes) are compiled into
//! anchored regular expressions.

use regex::Regex;

use crate::error::{StorageError, StorageResult};

/// Shell-style pattern matched against primary names only.
///
/// Names starting with `+` or `-` are directory-merge placeholders and never
/// match, not even `*`.
#[derive(Debug, Clone)]
pub struct NamePattern {
    compiled: Option<(String, Regex)>,
}

impl NamePattern {
    /// Compiles `pattern`. An empty pattern matches everything.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidData`] for malformed patterns.
    pub fn new(pattern: &str) -> StorageResult<Self> {
        if pattern.is_empty() || pattern == "*" {
            return Ok(Self::any());
        }
        let regex = Regex::new(&translate(pattern)?)
            .map_err(|e| StorageError::invalid(format!("bad pattern '{pattern}': {e}")))?;
        Ok(Self {
            compiled: Some((pattern.to_string(), regex)),
        })
    }

    /// Pattern matching every real entry.
    #[must_use]
    pub const fn any() -> Self {
        Self { compiled: None }
    }

    /// Checks `name` against the pattern.
    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        !is_placeholder(name)
            && self
                .compiled
                .as_ref()
                .map_or(true, |(_, regex)| regex.is_match(name))
    }

    /// The pattern text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.compiled.as_ref().map_or("*", |(text, _)| text.as_str())
    }
}

/// Translates a shell glob into an anchored regular expression.
fn translate(pattern: &str) -> StorageResult<String> {
    let bad = |reason: &str| StorageError::invalid(format!("bad pattern '{pattern}': {reason}"));

    let mut out = String::with_capacity(pattern.len() + 8);
    out.push('^');
    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            '\\' => {
                let escaped = chars.next().ok_or_else(|| bad("trailing escape"))?;
                out.push_str(&regex::escape(escaped.encode_utf8(&mut [0; 4])));
            }
            '[' => {
                out.push('[');
                if chars.next_if(|c| matches!(*c, '!' | '^')).is_some() {
                    out.push('^');
                }
                // A leading ']' is a literal member.
                if chars.next_if_eq(&']').is_some() {
                    out.push_str("\\]");
                }
                let mut closed = false;
                for member in chars.by_ref() {
                    match member {
                        ']' => {
                            closed = true;
                            break;
                        }
                        '\\' | '[' | '&' | '~' | '^' => {
                            out.push('\\');
                            out.push(member);
                        }
                        _ => out.push(member),
                    }
                }
                if !closed {
                    return Err(bad("unterminated character class"));
                }
                out.push(']');
            }
            _ => out.push_str(&regex::escape(c.encode_utf8(&mut [0; 4]))),
        }
    }
    out.push('$');
    Ok(out)
}

impl Default for NamePattern {
    fn default() -> Self {
        Self::any()
    }
}

/// Checks whether `name` is a placeholder entry.
#[must_use]
pub fn is_placeholder(name: &str) -> bool {
    name.starts_with('+') || name.starts_with('-')
}
