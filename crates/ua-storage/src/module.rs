//! Backend module trait.

use ua_model::{AttributeRecord, EntityKind};

use crate::credential::CredentialChange;
use crate::error::StorageResult;
use crate::pattern::NamePattern;

/// One module's view of an entry.
///
/// `stored` holds what the backend explicitly keeps; `defaults` holds the
/// module's defaults for keys it does not keep. The dispatcher needs both to
/// let explicit values from any module beat defaults from every module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryView {
    /// Values stored in the backend.
    pub stored: AttributeRecord,
    /// Defaults for keys absent from `stored`.
    pub defaults: AttributeRecord,
}

impl EntryView {
    /// Creates a view with no defaults.
    #[must_use]
    pub fn stored(stored: AttributeRecord) -> Self {
        let defaults = AttributeRecord::new(stored.kind());
        Self { stored, defaults }
    }

    /// Primary name of the entry.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.stored.name().ok()
    }

    /// The record this module alone would return.
    #[must_use]
    pub fn merged(&self) -> AttributeRecord {
        let mut record = self.stored.clone();
        record.fill_absent(&self.defaults);
        record
    }
}

/// A storage system holding user and group entries.
///
/// Methods taking a record locate the entry by the record's primary name, so
/// callers may pass a record they built themselves rather than one returned by
/// a lookup. Implementations must be usable from one thread at a time; the
/// `Send + Sync` bound lets a session move between threads.
pub trait AccountModule: Send + Sync {
    /// Name used in configuration and error reports.
    fn name(&self) -> &str;

    /// Whether changing entries needs administrator rights.
    fn uses_elevated_privileges(&self) -> bool {
        false
    }

    /// Looks an entry up by primary name.
    ///
    /// # Errors
    ///
    /// Returns an error on backend failure; a miss is `Ok(None)`.
    fn lookup_by_name(&self, kind: EntityKind, name: &str) -> StorageResult<Option<EntryView>>;

    /// Looks an entry up by numeric id.
    ///
    /// # Errors
    ///
    /// Returns an error on backend failure; a miss is `Ok(None)`.
    fn lookup_by_id(&self, kind: EntityKind, id: u64) -> StorageResult<Option<EntryView>>;

    /// Returns `record` with this module's defaults filled into absent keys.
    /// Checks the record can be stored; touches nothing.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StorageError::InvalidData`] when the record cannot be
    /// stored by this module.
    fn prepare_add(&self, record: &AttributeRecord) -> StorageResult<AttributeRecord>;

    /// Stores a new entry and returns what was stored, defaults included.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StorageError::Duplicate`] if the name or id is taken.
    fn add(&self, record: &AttributeRecord) -> StorageResult<AttributeRecord>;

    /// Replaces the entry named by `old` with `new`. The name may change.
    /// Keys absent from `new` fall back to this module's defaults.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StorageError::NotFound`] if `old` is not stored here.
    fn modify(&self, old: &AttributeRecord, new: &AttributeRecord) -> StorageResult<()>;

    /// Removes the entry named by `record`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StorageError::NotFound`] if it is not stored here.
    fn delete(&self, record: &AttributeRecord) -> StorageResult<()>;

    /// Lists full entries whose primary name matches `pattern`.
    ///
    /// # Errors
    ///
    /// Returns an error on backend failure. No match is an empty list.
    fn enumerate_full(&self, kind: EntityKind, pattern: &NamePattern)
        -> StorageResult<Vec<EntryView>>;

    /// Lists primary names matching `pattern`.
    ///
    /// # Errors
    ///
    /// Returns an error on backend failure. No match is an empty list.
    fn enumerate_names(&self, kind: EntityKind, pattern: &NamePattern) -> StorageResult<Vec<String>> {
        Ok(self
            .enumerate_full(kind, pattern)?
            .iter()
            .filter_map(|view| view.name().map(str::to_string))
            .collect())
    }

    /// Checks whether the entry's credential is locked.
    ///
    /// # Errors
    ///
    /// Returns a lock error if the credential is in an unrecognized scheme.
    fn is_locked(&self, record: &AttributeRecord) -> StorageResult<bool>;

    /// Dry-runs a credential change against the stored entry.
    ///
    /// # Errors
    ///
    /// Returns the error the change itself would raise.
    fn check_credential(&self, record: &AttributeRecord, change: CredentialChange) -> StorageResult<()>;

    /// Locks the entry's credential.
    ///
    /// # Errors
    ///
    /// Returns a lock error if the credential is in an unrecognized scheme.
    fn lock_credential(&self, record: &AttributeRecord) -> StorageResult<()>;

    /// Unlocks the entry's credential.
    ///
    /// # Errors
    ///
    /// Returns a lock error if the credential is in an unrecognized scheme or
    /// would become empty while `allow_empty` is false.
    fn unlock_credential(&self, record: &AttributeRecord, allow_empty: bool) -> StorageResult<()>;

    /// Stores a new password, hashing it unless `is_prehashed`.
    ///
    /// # Errors
    ///
    /// Returns an error if hashing or storing fails.
    fn set_password(&self, record: &AttributeRecord, plaintext: &str, is_prehashed: bool)
        -> StorageResult<()>;

    /// Clears the password without changing the lock state.
    ///
    /// # Errors
    ///
    /// Returns an error if storing fails.
    fn remove_password(&self, record: &AttributeRecord) -> StorageResult<()>;
}
