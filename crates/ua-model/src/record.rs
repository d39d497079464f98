//! Attribute records.

use std::fmt;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::error::{AttributeError, AttributeResult};
use crate::keys;
use crate::value::AttrValue;

// ============================================================================
// Entity Kind
// ============================================================================

/// Kind of account entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// A user account.
    User,
    /// A group.
    Group,
}

impl EntityKind {
    /// Key holding the primary name.
    #[must_use]
    pub const fn name_key(self) -> &'static str {
        match self {
            Self::User => keys::USER_NAME,
            Self::Group => keys::GROUP_NAME,
        }
    }

    /// Key holding the numeric id.
    #[must_use]
    pub const fn id_key(self) -> &'static str {
        match self {
            Self::User => keys::UID_NUMBER,
            Self::Group => keys::GID_NUMBER,
        }
    }

    /// Lowercase label used in messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Group => "group",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Attribute Record
// ============================================================================

/// One user or group entry as an ordered multi-valued map.
///
/// Iteration follows insertion order. Equality ignores order: two records are
/// equal when they have the same kind and the same keys with the same value
/// sequences.
#[derive(Debug, Clone)]
pub struct AttributeRecord {
    kind: EntityKind,
    entries: Vec<(String, Vec<AttrValue>)>,
}

impl AttributeRecord {
    /// Creates an empty record.
    #[must_use]
    pub const fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            entries: Vec::new(),
        }
    }

    /// Creates a record holding only its primary name.
    #[must_use]
    pub fn named(kind: EntityKind, name: impl Into<String>) -> Self {
        let mut record = Self::new(kind);
        record.set_value(kind.name_key(), AttrValue::Text(name.into()));
        record
    }

    /// Kind of entry this record describes.
    #[must_use]
    pub const fn kind(&self) -> EntityKind {
        self.kind
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|(k, _)| k == key)
    }

    /// Returns every value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`AttributeError::NotPresent`] when the key is absent.
    pub fn get(&self, key: &str) -> AttributeResult<&[AttrValue]> {
        self.position(key)
            .map(|i| self.entries[i].1.as_slice())
            .ok_or_else(|| AttributeError::NotPresent(key.to_string()))
    }

    /// Returns the first value stored under `key`.
    ///
    /// # Errors
    ///
    /// Fails when the key is absent or holds no values.
    pub fn first(&self, key: &str) -> AttributeResult<&AttrValue> {
        self.get(key)?
            .first()
            .ok_or_else(|| AttributeError::Empty(key.to_string()))
    }

    /// Returns the first value of `key` as text.
    ///
    /// # Errors
    ///
    /// Fails when the key is absent, empty, or holds an integer.
    pub fn text(&self, key: &str) -> AttributeResult<&str> {
        self.first(key)?
            .as_text()
            .ok_or_else(|| AttributeError::TypeMismatch {
                key: key.to_string(),
                expected: "text",
            })
    }

    /// Returns the first value of `key` as an integer.
    ///
    /// # Errors
    ///
    /// Fails when the key is absent, empty, or holds text.
    pub fn int(&self, key: &str) -> AttributeResult<i64> {
        self.first(key)?
            .as_int()
            .ok_or_else(|| AttributeError::TypeMismatch {
                key: key.to_string(),
                expected: "integer",
            })
    }

    /// Returns all values of `key` as text, e.g. a membership list.
    ///
    /// # Errors
    ///
    /// Fails when the key is absent or any value is an integer.
    pub fn texts(&self, key: &str) -> AttributeResult<Vec<&str>> {
        self.get(key)?
            .iter()
            .map(|v| {
                v.as_text().ok_or_else(|| AttributeError::TypeMismatch {
                    key: key.to_string(),
                    expected: "text",
                })
            })
            .collect()
    }

    /// Checks whether `key` is present, even with no values.
    #[must_use]
    pub fn has(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    /// Replaces the values of `key`, keeping its position if already present.
    pub fn set(&mut self, key: impl Into<String>, values: Vec<AttrValue>) {
        let key = key.into();
        match self.position(&key) {
            Some(i) => self.entries[i].1 = values,
            None => self.entries.push((key, values)),
        }
    }

    /// Sets `key` to a single value.
    pub fn set_value(&mut self, key: impl Into<String>, value: impl Into<AttrValue>) {
        self.set(key, vec![value.into()]);
    }

    /// Appends a value to `key`, creating the key if needed.
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<AttrValue>) {
        let key = key.into();
        let value = value.into();
        match self.position(&key) {
            Some(i) => self.entries[i].1.push(value),
            None => self.entries.push((key, vec![value])),
        }
    }

    /// Removes every occurrence of `value` from `key`. Returns whether
    /// anything was removed. The key stays present even if emptied.
    pub fn remove_value(&mut self, key: &str, value: &AttrValue) -> bool {
        let Some(i) = self.position(key) else {
            return false;
        };
        let before = self.entries[i].1.len();
        self.entries[i].1.retain(|v| v != value);
        self.entries[i].1.len() != before
    }

    /// Removes `key` entirely. Returns whether it was present.
    pub fn clear(&mut self, key: &str) -> bool {
        match self.position(key) {
            Some(i) => {
                self.entries.remove(i);
                true
            }
            None => false,
        }
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Key/value pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[AttrValue])> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Number of keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Checks whether the record has no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Primary name (`uid` for users, `cn` for groups).
    ///
    /// # Errors
    ///
    /// Fails when the name is absent or not text.
    pub fn name(&self) -> AttributeResult<&str> {
        self.text(self.kind.name_key())
    }

    /// Numeric id (`uidNumber` for users, `gidNumber` for groups).
    ///
    /// # Errors
    ///
    /// Fails when the id is absent, not an integer, or negative.
    pub fn id(&self) -> AttributeResult<u64> {
        let key = self.kind.id_key();
        u64::try_from(self.int(key)?).map_err(|_| AttributeError::TypeMismatch {
            key: key.to_string(),
            expected: "non-negative integer",
        })
    }

    /// Copies every key of `other` over this record; `other` wins.
    pub fn overlay(&mut self, other: &Self) {
        for (key, values) in other.iter() {
            self.set(key, values.to_vec());
        }
    }

    /// Copies keys of `defaults` that this record does not have.
    pub fn fill_absent(&mut self, defaults: &Self) {
        for (key, values) in defaults.iter() {
            if !self.has(key) {
                self.set(key, values.to_vec());
            }
        }
    }
}

impl PartialEq for AttributeRecord {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.entries.len() == other.entries.len()
            && self
                .entries
                .iter()
                .all(|(k, v)| other.get(k).is_ok_and(|o| o == v.as_slice()))
    }
}

impl Eq for AttributeRecord {}

impl Serialize for AttributeRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, values) in &self.entries {
            map.serialize_entry(key, values)?;
        }
        map.end()
    }
}
