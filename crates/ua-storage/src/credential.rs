//! Credential slots and the lock/set/remove state machine.
//!
//! A module may keep credential material in more than one attribute (the
//! passwd field and the shadow field, say), and a directory attribute may hold
//! several values of which only one is ours. [`resolve_slot`] is the single
//! place that decides which value an operation touches.

use ua_crypto::{CredentialHasher, LockScheme};
use ua_model::{AttrValue, AttributeRecord};

use crate::defaults::days_since_epoch;
use crate::error::{StorageError, StorageResult};

/// Credential operations, used for dry runs before a commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialChange {
    /// Lock the credential.
    Lock,
    /// Unlock the credential.
    Unlock {
        /// Whether an empty active credential is acceptable.
        allow_empty: bool,
    },
    /// Replace the credential with a new hash.
    SetPassword,
    /// Clear the credential.
    RemovePassword,
}

/// Attributes that may hold credential material for a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CredentialSlots {
    /// Field written when no better candidate exists.
    pub primary: &'static str,
    /// Field preferred when it already holds a value in the module's scheme.
    pub secondary: Option<&'static str>,
}

/// The value an operation reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CredentialSlot {
    /// Attribute key.
    pub key: &'static str,
    /// Position of the value within the attribute. `None` means the whole
    /// attribute is replaced on write.
    pub index: Option<usize>,
}

impl CredentialSlot {
    /// Current text of the slot, if any.
    #[must_use]
    pub fn current<'a>(&self, record: &'a AttributeRecord) -> Option<&'a str> {
        let values = record.get(self.key).ok()?;
        match self.index {
            Some(i) => values.get(i).and_then(AttrValue::as_text),
            None => values.first().and_then(AttrValue::as_text),
        }
    }

    /// Writes `value` into the slot.
    pub fn write(&self, record: &mut AttributeRecord, value: String) {
        let mut values = record.get(self.key).map(<[AttrValue]>::to_vec).unwrap_or_default();
        match self.index {
            Some(i) if i < values.len() => {
                values[i] = AttrValue::Text(value);
                record.set(self.key, values);
            }
            _ => record.set_value(self.key, value),
        }
    }
}

/// Picks the slot holding `record`'s credential.
///
/// A secondary field wins when one of its values is already in `scheme`.
/// Otherwise the primary field is used, pointing at its first value in
/// `scheme` if there is one, or replacing it entirely if there is none.
#[must_use]
pub fn resolve_slot(
    record: &AttributeRecord,
    slots: &CredentialSlots,
    scheme: &LockScheme,
) -> CredentialSlot {
    if let Some(secondary) = slots.secondary {
        if let Some(i) = recognized_index(record, secondary, scheme) {
            return CredentialSlot {
                key: secondary,
                index: Some(i),
            };
        }
    }
    CredentialSlot {
        key: slots.primary,
        index: recognized_index(record, slots.primary, scheme),
    }
}

fn recognized_index(record: &AttributeRecord, key: &str, scheme: &LockScheme) -> Option<usize> {
    record
        .get(key)
        .ok()?
        .iter()
        .position(|v| v.as_text().is_some_and(|t| scheme.recognizes(t)))
}

/// How one module stores and locks credentials for one entry kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CredentialPolicy {
    /// Candidate fields.
    pub slots: CredentialSlots,
    /// Lock and tag convention.
    pub scheme: LockScheme,
    /// Day-of-last-change field refreshed by set and remove, if any.
    pub last_change: Option<&'static str>,
}

impl CredentialPolicy {
    /// Slot an operation on `record` would touch.
    #[must_use]
    pub fn slot(&self, record: &AttributeRecord) -> CredentialSlot {
        resolve_slot(record, &self.slots, &self.scheme)
    }

    /// Current credential of `record`. An absent value reads as the scheme's
    /// cleared value.
    #[must_use]
    pub fn current(&self, record: &AttributeRecord) -> String {
        self.slot(record)
            .current(record)
            .map_or_else(|| self.scheme.cleared(), str::to_string)
    }

    /// Checks whether `record`'s credential is locked.
    ///
    /// # Errors
    ///
    /// Returns a lock error when the credential is in another scheme.
    pub fn is_locked(&self, record: &AttributeRecord) -> StorageResult<bool> {
        Ok(self.scheme.is_locked(&self.current(record))?)
    }

    /// Runs `change` against a copy of `record` without keeping the result.
    ///
    /// # Errors
    ///
    /// Returns the lock error the real operation would return. Setting and
    /// removing a password cannot fail on the stored value.
    pub fn check(&self, record: &AttributeRecord, change: CredentialChange) -> StorageResult<()> {
        let mut scratch = record.clone();
        match change {
            CredentialChange::Lock => self.lock(&mut scratch),
            CredentialChange::Unlock { allow_empty } => self.unlock(&mut scratch, allow_empty),
            CredentialChange::SetPassword | CredentialChange::RemovePassword => Ok(()),
        }
    }

    /// Locks the credential in `record`.
    ///
    /// # Errors
    ///
    /// Returns a lock error when the credential is in another scheme.
    pub fn lock(&self, record: &mut AttributeRecord) -> StorageResult<()> {
        let slot = self.slot(record);
        let locked = self.scheme.lock(&self.current(record))?;
        slot.write(record, locked);
        Ok(())
    }

    /// Unlocks the credential in `record`.
    ///
    /// # Errors
    ///
    /// Returns a lock error when the credential is in another scheme or
    /// would become empty without `allow_empty`.
    pub fn unlock(&self, record: &mut AttributeRecord, allow_empty: bool) -> StorageResult<()> {
        let slot = self.slot(record);
        let unlocked = self.scheme.unlock(&self.current(record), allow_empty)?;
        slot.write(record, unlocked);
        Ok(())
    }

    /// Hashes `plaintext` (or takes it as a hash) and stores it.
    ///
    /// # Errors
    ///
    /// Returns hashing failures, or invalid data for a pre-hashed value in a
    /// scheme this module cannot hold.
    pub fn set_password(
        &self,
        record: &mut AttributeRecord,
        hasher: &dyn CredentialHasher,
        plaintext: &str,
        is_prehashed: bool,
    ) -> StorageResult<()> {
        if is_prehashed {
            return self.store_prehashed(record, plaintext);
        }
        let current = self.current(record);
        let previous = self
            .scheme
            .hash_part(&current)
            .ok()
            .filter(|p| !p.is_empty());
        let reusable = previous.filter(|p| hasher.recognizes(p));
        if previous.is_some() && reusable.is_none() {
            tracing::debug!("stored hash is foreign to the hasher, using configured parameters");
        }
        let hash = hasher.hash(plaintext, reusable)?;
        let slot = self.slot(record);
        slot.write(record, self.scheme.wrap(&hash));
        self.touch(record);
        Ok(())
    }

    fn store_prehashed(&self, record: &mut AttributeRecord, hashed: &str) -> StorageResult<()> {
        let value = if self.scheme.recognizes(hashed) {
            hashed.to_string()
        } else {
            let wrapped = self.scheme.wrap(hashed);
            if !self.scheme.recognizes(&wrapped) {
                return Err(StorageError::invalid(
                    "pre-hashed value uses a scheme this module cannot store",
                ));
            }
            wrapped
        };
        let slot = self.slot(record);
        slot.write(record, value);
        self.touch(record);
        Ok(())
    }

    /// Clears the credential, keeping the scheme tag and the lock state.
    ///
    /// # Errors
    ///
    /// Returns a lock error if re-locking the cleared value fails.
    pub fn remove_password(&self, record: &mut AttributeRecord) -> StorageResult<()> {
        let slot = self.slot(record);
        let was_locked = self.scheme.is_locked(&self.current(record)).unwrap_or(false);
        let cleared = self.scheme.cleared();
        let value = if was_locked {
            self.scheme.lock(&cleared)?
        } else {
            cleared
        };
        slot.write(record, value);
        self.touch(record);
        Ok(())
    }

    /// Restores the primary credential of `updated` from `stored` when
    /// `updated` carries a value outside this scheme, such as another
    /// backend's tagged hash arriving through a merged record.
    pub fn keep_stored_if_foreign(&self, stored: &AttributeRecord, updated: &mut AttributeRecord) {
        let key = self.slots.primary;
        let foreign = updated.get(key).is_ok_and(|values| {
            values
                .iter()
                .any(|v| v.as_text().map_or(true, |t| !self.scheme.recognizes(t)))
        });
        if !foreign {
            return;
        }
        match stored.get(key) {
            Ok(values) => updated.set(key, values.to_vec()),
            Err(_) => {
                updated.clear(key);
            }
        }
    }

    fn touch(&self, record: &mut AttributeRecord) {
        if let Some(key) = self.last_change {
            record.set_value(key, days_since_epoch());
        }
    }
}
