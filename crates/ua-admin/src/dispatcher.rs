//! The module dispatcher.
//!
//! A [`Dispatcher`] owns the ordered module list for one entry kind and runs
//! every mutation in two phases:
//!
//! 1. **Validate**: the name is checked, every module is asked whether it
//!    already holds the name or id, and the change is dry-run where the
//!    module supports it. Nothing is written.
//! 2. **Commit**: the change is applied module by module in configured order.
//!
//! A failure in the commit phase stops immediately and reports the modules
//! that already applied the change as [`Error::Module`]. Those modules are
//! not rolled back; undoing them is up to the caller.
//!
//! Lookups merge every module's view left to right. An explicitly stored
//! value from a later module beats one from an earlier module; defaults only
//! fill keys no module stores.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use ua_core::{Error, Result};
use ua_model::{AttributeRecord, EntityKind, NameValidator};
use ua_storage::{AccountModule, CredentialChange, EntryView, NamePattern, StorageError, StorageResult};

/// A module shared between the user and group dispatchers.
pub type SharedModule = Arc<dyn AccountModule>;

/// Folds module views into one record, left to right.
///
/// Returns `None` when there are no views.
#[must_use]
pub fn merge<'a>(
    kind: EntityKind,
    views: impl IntoIterator<Item = &'a EntryView>,
) -> Option<AttributeRecord> {
    let mut explicit = AttributeRecord::new(kind);
    let mut defaults = AttributeRecord::new(kind);
    let mut seen = false;
    for view in views {
        seen = true;
        explicit.overlay(&view.stored);
        defaults.overlay(&view.defaults);
    }
    if !seen {
        return None;
    }
    explicit.fill_absent(&defaults);
    Some(explicit)
}

/// Runs operations for one entry kind across its configured modules.
pub struct Dispatcher {
    kind: EntityKind,
    modules: Vec<SharedModule>,
    validator: NameValidator,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("kind", &self.kind)
            .field("modules", &self.module_names())
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    /// Creates a dispatcher visiting `modules` in the given order.
    #[must_use]
    pub fn new(kind: EntityKind, modules: Vec<SharedModule>, validator: NameValidator) -> Self {
        Self {
            kind,
            modules,
            validator,
        }
    }

    /// Entry kind handled by this dispatcher.
    #[must_use]
    pub const fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Configured module names, in order.
    #[must_use]
    pub fn module_names(&self) -> Vec<&str> {
        self.modules.iter().map(|m| m.name()).collect()
    }

    /// Whether any module needs administrator rights.
    #[must_use]
    pub fn uses_elevated_privileges(&self) -> bool {
        self.modules.iter().any(|m| m.uses_elevated_privileges())
    }

    // ========================================================================
    // Lookups
    // ========================================================================

    /// Merged entry named `name`, or `None` if no module holds it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when no module is configured, or
    /// [`Error::Module`] on backend failure.
    pub fn lookup_by_name(&self, name: &str) -> Result<Option<AttributeRecord>> {
        self.ensure_configured()?;
        let mut views = Vec::new();
        for module in &self.modules {
            if let Some(view) = module
                .lookup_by_name(self.kind, name)
                .map_err(|e| self.map_error(module.name(), &[], e))?
            {
                views.push(view);
            }
        }
        Ok(merge(self.kind, &views))
    }

    /// Merged entry with numeric id `id`.
    ///
    /// The first module holding the id decides the name; the entry is then
    /// looked up by that name in every module.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when no module is configured, or
    /// [`Error::Module`] on backend failure.
    pub fn lookup_by_id(&self, id: u64) -> Result<Option<AttributeRecord>> {
        self.ensure_configured()?;
        for module in &self.modules {
            let view = module
                .lookup_by_id(self.kind, id)
                .map_err(|e| self.map_error(module.name(), &[], e))?;
            if let Some(name) = view.as_ref().and_then(EntryView::name) {
                return self.lookup_by_name(name);
            }
        }
        Ok(None)
    }

    /// Names matching `pattern` in any module, first occurrence first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when no module is configured, or
    /// [`Error::Module`] on backend failure.
    pub fn enumerate(&self, pattern: &NamePattern) -> Result<Vec<String>> {
        self.ensure_configured()?;
        let mut seen = BTreeSet::new();
        let mut names = Vec::new();
        for module in &self.modules {
            let found = module
                .enumerate_names(self.kind, pattern)
                .map_err(|e| self.map_error(module.name(), &[], e))?;
            for name in found {
                if seen.insert(name.clone()) {
                    names.push(name);
                }
            }
        }
        Ok(names)
    }

    /// Merged entries whose names match `pattern`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when no module is configured, or
    /// [`Error::Module`] on backend failure.
    pub fn enumerate_full(&self, pattern: &NamePattern) -> Result<Vec<AttributeRecord>> {
        self.ensure_configured()?;
        let mut index: BTreeMap<String, usize> = BTreeMap::new();
        let mut grouped: Vec<Vec<EntryView>> = Vec::new();
        for module in &self.modules {
            let views = module
                .enumerate_full(self.kind, pattern)
                .map_err(|e| self.map_error(module.name(), &[], e))?;
            for view in views {
                let Some(name) = view.name().map(str::to_string) else {
                    continue;
                };
                let slot = *index.entry(name).or_insert_with(|| {
                    grouped.push(Vec::new());
                    grouped.len() - 1
                });
                grouped[slot].push(view);
            }
        }
        Ok(grouped
            .iter()
            .filter_map(|views| merge(self.kind, views))
            .collect())
    }

    /// Lowest id at or above `first` that no module holds.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when no module is configured, or
    /// [`Error::Module`] on backend failure.
    pub fn next_free_id(&self, first: u64) -> Result<u64> {
        self.ensure_configured()?;
        let mut used = BTreeSet::new();
        for module in &self.modules {
            let views = module
                .enumerate_full(self.kind, &NamePattern::any())
                .map_err(|e| self.map_error(module.name(), &[], e))?;
            used.extend(views.iter().filter_map(|v| v.stored.id().ok()));
        }
        let mut id = first;
        while used.contains(&id) {
            id += 1;
        }
        Ok(id)
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Adds `record` to every module and returns the merged result.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for a bad name or id,
    /// [`Error::Duplicate`] if any module holds the name or id, or
    /// [`Error::Module`] if a module fails while committing.
    pub fn add(&self, record: &AttributeRecord) -> Result<AttributeRecord> {
        self.ensure_configured()?;
        let name = self.validate_name(record)?;
        let id = self.require_id(record)?;
        tracing::debug!(op = "add", kind = %self.kind, name = %name, modules = ?self.module_names(), "dispatching");

        self.ensure_name_free(&name)?;
        self.ensure_id_free(id, None)?;
        for module in &self.modules {
            module
                .prepare_add(record)
                .map_err(|e| self.map_error(module.name(), &[], e))?;
        }

        let mut merged = record.clone();
        let mut committed = Vec::new();
        for module in &self.modules {
            let stored = module
                .add(record)
                .map_err(|e| self.commit_failed("add", module.name(), &committed, e))?;
            merged.overlay(&stored);
            committed.push(module.name().to_string());
        }
        tracing::info!(op = "add", kind = %self.kind, name = %name, modules = ?committed, "committed");
        Ok(merged)
    }

    /// Replaces the entry named by `old` with `new` in every module holding
    /// it. The name may change.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no module holds `old`,
    /// [`Error::Duplicate`] if the new name or id belongs to another entry,
    /// or [`Error::Module`] if a module fails while committing.
    pub fn modify(&self, old: &AttributeRecord, new: &AttributeRecord) -> Result<()> {
        self.ensure_configured()?;
        let old_name = old
            .name()
            .map_err(|e| Error::validation(e.to_string()))?
            .to_string();
        let new_name = self.validate_name(new)?;
        tracing::debug!(op = "modify", kind = %self.kind, name = %old_name, new_name = %new_name, modules = ?self.module_names(), "dispatching");

        let holders = self.holders(&old_name)?;
        if new_name != old_name {
            self.ensure_name_free(&new_name)?;
        }
        if new.has(self.kind.id_key()) {
            let id = self.require_id(new)?;
            self.ensure_id_free(id, Some(&old_name))?;
        }

        self.commit("modify", &holders, |m| m.modify(old, new))
    }

    /// Removes the entry from every module holding it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no module holds it, or
    /// [`Error::Module`] if a module fails while committing.
    pub fn delete(&self, record: &AttributeRecord) -> Result<()> {
        self.ensure_configured()?;
        let name = record.name().map_err(|e| Error::validation(e.to_string()))?;
        tracing::debug!(op = "delete", kind = %self.kind, name = %name, modules = ?self.module_names(), "dispatching");
        let holders = self.holders(name)?;
        self.commit("delete", &holders, |m| m.delete(record))
    }

    // ========================================================================
    // Credentials
    // ========================================================================

    /// Whether any module holding the entry reports it locked.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no module holds it, or [`Error::Lock`]
    /// if a module's credential is in a foreign scheme.
    pub fn is_locked(&self, record: &AttributeRecord) -> Result<bool> {
        self.ensure_configured()?;
        let name = record.name().map_err(|e| Error::validation(e.to_string()))?;
        let mut locked = false;
        for module in self.holders(name)? {
            locked |= module
                .is_locked(record)
                .map_err(|e| self.map_error(module.name(), &[], e))?;
        }
        Ok(locked)
    }

    /// Locks the credential in every module holding the entry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Lock`] before anything is written if any holding
    /// module cannot lock its credential.
    pub fn lock(&self, record: &AttributeRecord) -> Result<()> {
        self.credential_op("lock", record, CredentialChange::Lock, |m| {
            m.lock_credential(record)
        })
    }

    /// Unlocks the credential in every module holding the entry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Lock`] before anything is written if any holding
    /// module cannot unlock, including when the result would be empty and
    /// `allow_empty` is false.
    pub fn unlock(&self, record: &AttributeRecord, allow_empty: bool) -> Result<()> {
        self.credential_op(
            "unlock",
            record,
            CredentialChange::Unlock { allow_empty },
            |m| m.unlock_credential(record, allow_empty),
        )
    }

    /// Stores a new password in every module holding the entry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for a pre-hashed value a module cannot
    /// store, or [`Error::Module`] on hashing or backend failure.
    pub fn set_password(
        &self,
        record: &AttributeRecord,
        plaintext: &str,
        is_prehashed: bool,
    ) -> Result<()> {
        self.credential_op("set_password", record, CredentialChange::SetPassword, |m| {
            m.set_password(record, plaintext, is_prehashed)
        })
    }

    /// Clears the password in every module holding the entry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no module holds it, or
    /// [`Error::Module`] if a module fails while committing.
    pub fn remove_password(&self, record: &AttributeRecord) -> Result<()> {
        self.credential_op(
            "remove_password",
            record,
            CredentialChange::RemovePassword,
            |m| m.remove_password(record),
        )
    }

    fn credential_op<F>(
        &self,
        op: &str,
        record: &AttributeRecord,
        change: CredentialChange,
        apply: F,
    ) -> Result<()>
    where
        F: FnMut(&dyn AccountModule) -> StorageResult<()>,
    {
        self.ensure_configured()?;
        let name = record.name().map_err(|e| Error::validation(e.to_string()))?;
        tracing::debug!(op, kind = %self.kind, name = %name, modules = ?self.module_names(), "dispatching");

        let holders = self.holders(name)?;
        for module in &holders {
            module
                .check_credential(record, change)
                .map_err(|e| self.map_error(module.name(), &[], e))?;
        }
        self.commit(op, &holders, apply)
    }

    // ========================================================================
    // Validate-phase helpers
    // ========================================================================

    fn ensure_configured(&self) -> Result<()> {
        if self.modules.is_empty() {
            return Err(Error::config(format!(
                "no modules configured for {} entries",
                self.kind
            )));
        }
        Ok(())
    }

    fn validate_name(&self, record: &AttributeRecord) -> Result<String> {
        let name = record
            .name()
            .map_err(|e| Error::validation(format!("{} record has no name: {e}", self.kind)))?;
        self.validator
            .validate(name)
            .map_err(|e| Error::validation(format!("invalid {} name '{name}': {e}", self.kind)))?;
        Ok(name.to_string())
    }

    fn require_id(&self, record: &AttributeRecord) -> Result<u64> {
        record.id().map_err(|e| {
            Error::validation(format!("invalid {}: {e}", self.kind.id_key()))
        })
    }

    fn holders(&self, name: &str) -> Result<Vec<SharedModule>> {
        let mut holders = Vec::new();
        for module in &self.modules {
            if module
                .lookup_by_name(self.kind, name)
                .map_err(|e| self.map_error(module.name(), &[], e))?
                .is_some()
            {
                holders.push(Arc::clone(module));
            }
        }
        if holders.is_empty() {
            return Err(Error::not_found(self.kind.as_str(), name));
        }
        Ok(holders)
    }

    fn ensure_name_free(&self, name: &str) -> Result<()> {
        for module in &self.modules {
            let found = module
                .lookup_by_name(self.kind, name)
                .map_err(|e| self.map_error(module.name(), &[], e))?;
            if found.is_some() {
                tracing::debug!(module = module.name(), kind = %self.kind, name = %name, "name already taken");
                return Err(Error::duplicate(self.kind.as_str(), self.kind.name_key(), name));
            }
        }
        Ok(())
    }

    /// Fails if a module holds `id` for an entry other than `owner`.
    fn ensure_id_free(&self, id: u64, owner: Option<&str>) -> Result<()> {
        for module in &self.modules {
            let found = module
                .lookup_by_id(self.kind, id)
                .map_err(|e| self.map_error(module.name(), &[], e))?;
            if let Some(view) = found {
                if owner.is_none() || view.name() != owner {
                    tracing::debug!(module = module.name(), kind = %self.kind, id, "id already taken");
                    return Err(Error::duplicate(
                        self.kind.as_str(),
                        self.kind.id_key(),
                        id.to_string(),
                    ));
                }
            }
        }
        Ok(())
    }

    // ========================================================================
    // Commit phase
    // ========================================================================

    fn commit<F>(&self, op: &str, modules: &[SharedModule], mut apply: F) -> Result<()>
    where
        F: FnMut(&dyn AccountModule) -> StorageResult<()>,
    {
        let mut committed = Vec::new();
        for module in modules {
            apply(module.as_ref())
                .map_err(|e| self.commit_failed(op, module.name(), &committed, e))?;
            committed.push(module.name().to_string());
        }
        tracing::info!(op, kind = %self.kind, modules = ?committed, "committed");
        Ok(())
    }

    fn commit_failed(&self, op: &str, module: &str, committed: &[String], err: StorageError) -> Error {
        if committed.is_empty() {
            tracing::debug!(op, kind = %self.kind, module, error = %err, "first module failed, nothing written");
        } else {
            tracing::warn!(op, kind = %self.kind, module, committed = ?committed, error = %err, "commit failed after partial success");
        }
        self.map_error(module, committed, err)
    }

    /// Maps a module error onto the session taxonomy. Once any module has
    /// committed, every failure is a module error so the partial state is
    /// reported.
    fn map_error(&self, module: &str, committed: &[String], err: StorageError) -> Error {
        if !committed.is_empty() {
            return Error::module(module, committed.to_vec(), err.to_string());
        }
        let kind = self.kind.as_str();
        match err {
            StorageError::Duplicate { field, value, .. } => Error::duplicate(kind, field, value),
            StorageError::NotFound { name, .. } => Error::not_found(kind, name),
            e if e.is_lock() => Error::lock(e.to_string()),
            e if e.is_invalid_input() => Error::validation(e.to_string()),
            e => Error::module(module, Vec::new(), e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;
    use ua_core::config::{DefaultsConfig, DirectorySection, FilesConfig};
    use ua_crypto::{Argon2Hasher, CredentialHasher, HashPolicy};
    use ua_directory::{DirectoryConfig, DirectoryModule, MemoryDirectory};
    use ua_model::{keys, AttrValue};
    use ua_storage_files::FilesModule;

    struct Fixture {
        _dir: TempDir,
        directory: MemoryDirectory,
        files: SharedModule,
        ldap: SharedModule,
        users: Dispatcher,
        groups: Dispatcher,
    }

    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let hasher: Arc<dyn CredentialHasher> =
            Arc::new(Argon2Hasher::new(HashPolicy::new().memory_cost(64).time_cost(1)));
        let defaults = DefaultsConfig::default();
        let files_config = FilesConfig {
            directory: dir.path().to_path_buf(),
            shadow: true,
            backup: false,
        };
        let files: SharedModule = Arc::new(FilesModule::new(
            &files_config,
            &defaults,
            Arc::clone(&hasher),
        ));

        let directory = MemoryDirectory::new();
        let config = DirectoryConfig::from_section(&DirectorySection::default(), "pw").unwrap();
        let ldap: SharedModule = Arc::new(
            DirectoryModule::connect(config, &defaults, &directory, Arc::clone(&hasher)).unwrap(),
        );

        let both = vec![Arc::clone(&files), Arc::clone(&ldap)];
        Fixture {
            _dir: dir,
            directory,
            users: Dispatcher::new(EntityKind::User, both.clone(), NameValidator::default()),
            groups: Dispatcher::new(EntityKind::Group, both, NameValidator::default()),
            files,
            ldap,
        }
    }

    fn user(name: &str, uid: i64) -> AttributeRecord {
        let mut record = AttributeRecord::named(EntityKind::User, name);
        record.set_value(keys::UID_NUMBER, uid);
        record
    }

    #[test]
    fn merge_prefers_later_explicit_values_over_any_default() {
        let mut first = EntryView::stored(AttributeRecord::named(EntityKind::User, "a"));
        first.stored.set_value(keys::GECOS, "from files");
        first.defaults.set_value(keys::LOGIN_SHELL, "/bin/sh");
        let mut second = EntryView::stored(AttributeRecord::named(EntityKind::User, "a"));
        second.stored.set_value(keys::GECOS, "from directory");
        second.stored.set_value(keys::HOME_DIRECTORY, "/srv/a");
        second.defaults.set_value(keys::HOME_DIRECTORY, "/home/a");

        let merged = merge(EntityKind::User, [&first, &second]).unwrap();
        assert_eq!(merged.text(keys::GECOS).unwrap(), "from directory");
        assert_eq!(merged.text(keys::HOME_DIRECTORY).unwrap(), "/srv/a");
        assert_eq!(merged.text(keys::LOGIN_SHELL).unwrap(), "/bin/sh");
        assert!(merge(EntityKind::User, Vec::<&EntryView>::new()).is_none());
    }

    #[test]
    fn add_reaches_every_module_and_merges_lookups() {
        let fx = fixture();
        let added = fx.users.add(&user("alice", 1000)).unwrap();
        assert_eq!(added.text(keys::USER_PASSWORD).unwrap(), "{CRYPT}!!");

        assert!(fx.files.lookup_by_name(EntityKind::User, "alice").unwrap().is_some());
        assert!(fx.ldap.lookup_by_name(EntityKind::User, "alice").unwrap().is_some());

        let found = fx.users.lookup_by_name("alice").unwrap().unwrap();
        assert_eq!(found.name().unwrap(), "alice");
        assert_eq!(found.text(keys::USER_PASSWORD).unwrap(), "{CRYPT}!!");
        assert_eq!(found.text(keys::SHADOW_PASSWORD).unwrap(), "!!");
        assert!(fx.users.lookup_by_name("nobody").unwrap().is_none());
    }

    #[test]
    fn collision_in_one_module_leaves_all_untouched() {
        let fx = fixture();
        fx.ldap.add(&user("bob", 2000)).unwrap();

        let err = fx.users.add(&user("bob", 2001)).unwrap_err();
        assert!(err.is_duplicate());
        assert!(err.is_clean_abort());
        assert!(fx.files.lookup_by_name(EntityKind::User, "bob").unwrap().is_none());

        let err = fx.users.add(&user("carol", 2000)).unwrap_err();
        assert!(matches!(err, Error::Duplicate { field: "uidNumber", .. }));
        assert!(fx.files.lookup_by_name(EntityKind::User, "carol").unwrap().is_none());
    }

    #[test]
    fn commit_failure_reports_committed_modules() {
        let fx = fixture();
        fx.directory.fail_writes(true);

        let err = fx.users.add(&user("alice", 1000)).unwrap_err();
        match &err {
            Error::Module { module, committed, .. } => {
                assert_eq!(module, "ldap");
                assert_eq!(committed, &vec!["files".to_string()]);
            }
            other => panic!("expected module error, got {other:?}"),
        }
        assert!(err.is_partial());
        assert!(fx.files.lookup_by_name(EntityKind::User, "alice").unwrap().is_some());
    }

    #[test]
    fn invalid_names_never_reach_modules() {
        let fx = fixture();
        for name in ["-bad", "has space", "tab\there", "caf\u{e9}", ""] {
            let err = fx.users.add(&user(name, 1000)).unwrap_err();
            assert!(err.is_validation(), "{name:?} gave {err:?}");
        }
        assert!(fx.directory.is_empty());
    }

    #[test]
    fn numeric_group_names_stay_text() {
        let fx = fixture();
        let mut group = AttributeRecord::named(EntityKind::Group, "077");
        group.set_value(keys::GID_NUMBER, 77_i64);
        fx.groups.add(&group).unwrap();

        let found = fx.groups.lookup_by_name("077").unwrap().unwrap();
        assert_eq!(found.first(keys::GROUP_NAME).unwrap(), &AttrValue::text("077"));
        assert_eq!(found.id().unwrap(), 77);
    }

    #[test]
    fn rename_onto_existing_entry_changes_nothing() {
        let fx = fixture();
        let alice = fx.users.add(&user("alice", 1000)).unwrap();
        fx.users.add(&user("bob", 1001)).unwrap();

        let mut renamed = alice.clone();
        renamed.set_value(keys::USER_NAME, "bob");
        assert!(fx.users.modify(&alice, &renamed).unwrap_err().is_duplicate());

        assert_eq!(fx.users.lookup_by_name("alice").unwrap().unwrap().id().unwrap(), 1000);
        assert_eq!(fx.users.lookup_by_name("bob").unwrap().unwrap().id().unwrap(), 1001);
    }

    #[test]
    fn modify_keeping_the_name_skips_the_name_check() {
        let fx = fixture();
        let alice = fx.users.add(&user("alice", 1000)).unwrap();
        let mut changed = alice.clone();
        changed.set_value(keys::GECOS, "Alice");
        fx.users.modify(&alice, &changed).unwrap();

        let found = fx.users.lookup_by_name("alice").unwrap().unwrap();
        assert_eq!(found.text(keys::GECOS).unwrap(), "Alice");
    }

    #[test]
    fn modify_to_taken_id_is_duplicate() {
        let fx = fixture();
        let alice = fx.users.add(&user("alice", 1000)).unwrap();
        fx.users.add(&user("bob", 1001)).unwrap();

        let mut changed = alice.clone();
        changed.set_value(keys::UID_NUMBER, 1001_i64);
        assert!(fx.users.modify(&alice, &changed).unwrap_err().is_duplicate());
    }

    #[test]
    fn mutations_on_missing_entries_are_not_found() {
        let fx = fixture();
        let ghost = user("ghost", 4000);
        assert!(fx.users.modify(&ghost, &ghost).unwrap_err().is_not_found());
        assert!(fx.users.delete(&ghost).unwrap_err().is_not_found());
        assert!(fx.users.lock(&ghost).unwrap_err().is_not_found());
    }

    #[test]
    fn delete_removes_from_all_holders() {
        let fx = fixture();
        let alice = fx.users.add(&user("alice", 1000)).unwrap();
        fx.users.delete(&alice).unwrap();
        assert!(fx.users.lookup_by_name("alice").unwrap().is_none());
        assert!(fx.directory.is_empty());
    }

    #[test]
    fn foreign_scheme_in_one_module_blocks_the_whole_lock() {
        let fx = fixture();
        let alice = fx.users.add(&user("alice", 1000)).unwrap();
        fx.users.set_password(&alice, "password", false).unwrap();
        assert!(!fx.users.is_locked(&alice).unwrap());

        let dn = "uid=alice,ou=People,dc=example,dc=com";
        let mut entry = fx.directory.get(dn).unwrap();
        entry
            .attributes
            .insert(keys::USER_PASSWORD.to_string(), vec!["{MD5}abc".to_string()]);
        fx.directory.insert(entry);

        let err = fx.users.lock(&alice).unwrap_err();
        assert!(err.is_lock());
        assert!(!fx.files.is_locked(&alice).unwrap());
    }

    #[test]
    fn unlock_to_empty_needs_permission() {
        let fx = fixture();
        let alice = fx.users.add(&user("alice", 1000)).unwrap();
        fx.users.remove_password(&alice).unwrap();
        fx.users.lock(&alice).unwrap();
        assert!(fx.users.is_locked(&alice).unwrap());

        assert!(fx.users.unlock(&alice, false).unwrap_err().is_lock());
        assert!(fx.users.is_locked(&alice).unwrap());
        fx.users.unlock(&alice, true).unwrap();
        assert!(!fx.users.is_locked(&alice).unwrap());
    }

    #[test]
    fn enumeration_unions_modules_in_order() {
        let fx = fixture();
        fx.files.add(&user("anna", 1000)).unwrap();
        fx.users.add(&user("bert", 1001)).unwrap();
        fx.ldap.add(&user("cleo", 1002)).unwrap();

        let names = fx.users.enumerate(&NamePattern::any()).unwrap();
        assert_eq!(names, vec!["anna", "bert", "cleo"]);

        let full = fx.users.enumerate_full(&NamePattern::new("b*").unwrap()).unwrap();
        assert_eq!(full.len(), 1);
        assert_eq!(full[0].text(keys::USER_PASSWORD).unwrap(), "{CRYPT}!!");
        assert!(fx.users.enumerate(&NamePattern::new("z*").unwrap()).unwrap().is_empty());
    }

    #[test]
    fn ids_beyond_signed_range() {
        let fx = fixture();
        fx.users.add(&user("big", 2_147_483_648)).unwrap();

        let found = fx.users.lookup_by_id(2_147_483_648).unwrap().unwrap();
        assert_eq!(found.name().unwrap(), "big");
        assert!(fx.users.lookup_by_id(u64::MAX).unwrap().is_none());
    }

    #[test]
    fn next_free_id_skips_used_ids() {
        let fx = fixture();
        fx.files.add(&user("a", 1000)).unwrap();
        fx.ldap.add(&user("b", 1001)).unwrap();
        fx.users.add(&user("c", 1003)).unwrap();
        assert_eq!(fx.users.next_free_id(1000).unwrap(), 1002);
        assert_eq!(fx.users.next_free_id(500).unwrap(), 500);
    }

    #[test]
    fn no_modules_is_a_config_error() {
        let empty = Dispatcher::new(EntityKind::Group, Vec::new(), NameValidator::default());
        assert!(matches!(empty.lookup_by_name("x"), Err(Error::Config(_))));
        assert!(matches!(empty.enumerate(&NamePattern::any()), Err(Error::Config(_))));
    }

    #[test]
    fn elevated_privileges_come_from_files() {
        let fx = fixture();
        assert!(fx.users.uses_elevated_privileges());
        let ldap_only = Dispatcher::new(EntityKind::User, vec![fx.ldap], NameValidator::default());
        assert!(!ldap_only.uses_elevated_privileges());
    }
}
