//! The flat-file account module.

use std::sync::Arc;

use ua_core::config::{DefaultsConfig, FilesConfig};
use ua_crypto::{CredentialHasher, LockScheme};
use ua_model::{keys, AttributeRecord, EntityKind};
use ua_storage::{
    days_since_epoch, AccountModule, CredentialChange, CredentialPolicy, CredentialSlots,
    Defaults, EntryView, NamePattern, StorageError, StorageResult,
};

use crate::layout::{line_name, Layout, GROUP, GSHADOW, PASSWD, SHADOW};
use crate::store::{FileStore, Transaction};

/// Module name used in configuration.
pub const MODULE_NAME: &str = "files";

/// Stores users in `passwd`/`shadow` and groups in `group`/`gshadow`.
///
/// With shadow enabled the password field of `passwd` and `group` always
/// reads `x` and the real credential lives in the shadow companion.
pub struct FilesModule {
    store: FileStore,
    shadow: bool,
    defaults: DefaultsConfig,
    hasher: Arc<dyn CredentialHasher>,
}

impl std::fmt::Debug for FilesModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilesModule")
            .field("directory", &self.store.directory())
            .field("shadow", &self.shadow)
            .finish_non_exhaustive()
    }
}

impl FilesModule {
    /// Creates a module over `files.directory`.
    #[must_use]
    pub fn new(
        files: &FilesConfig,
        defaults: &DefaultsConfig,
        hasher: Arc<dyn CredentialHasher>,
    ) -> Self {
        Self {
            store: FileStore::new(files),
            shadow: files.shadow,
            defaults: defaults.clone(),
            hasher,
        }
    }

    fn layouts(&self, kind: EntityKind) -> (Layout, Option<Layout>) {
        let (main, secret) = match kind {
            EntityKind::User => (PASSWD, SHADOW),
            EntityKind::Group => (GROUP, GSHADOW),
        };
        (main, self.shadow.then_some(secret))
    }

    fn policy(&self, kind: EntityKind) -> CredentialPolicy {
        let primary = if self.shadow {
            keys::SHADOW_PASSWORD
        } else {
            keys::USER_PASSWORD
        };
        let last_change = (self.shadow && kind == EntityKind::User).then_some(keys::SHADOW_LAST_CHANGE);
        CredentialPolicy {
            slots: CredentialSlots {
                primary,
                secondary: None,
            },
            scheme: LockScheme::SHADOW,
            last_change,
        }
    }

    /// Attributes a line cannot be written without.
    fn required(&self, kind: EntityKind) -> StorageResult<Defaults> {
        Ok(match kind {
            EntityKind::User => {
                Defaults::new(kind).with(keys::GID_NUMBER, id_value(self.defaults.user_gid)?)
            }
            EntityKind::Group => Defaults::new(kind),
        })
    }

    /// Defaults reported for keys an existing entry does not store.
    fn lookup_defaults(&self, kind: EntityKind, name: &str) -> Defaults {
        match kind {
            EntityKind::User => {
                let mut defaults = Defaults::new(kind)
                    .with(keys::GECOS, "")
                    .with(keys::LOGIN_SHELL, self.defaults.login_shell.as_str());
                if let Ok(home) = self.defaults.home_for(name) {
                    defaults = defaults.with(keys::HOME_DIRECTORY, home);
                }
                if let Ok(gid) = self.required(kind) {
                    defaults = defaults.extend(&gid);
                }
                if self.shadow {
                    defaults = defaults.extend(&Defaults::shadow_aging(kind));
                }
                defaults
            }
            EntityKind::Group => Defaults::new(kind),
        }
    }

    /// Defaults for a new entry.
    fn add_defaults(&self, kind: EntityKind, name: &str) -> StorageResult<Defaults> {
        let mut defaults = self.lookup_defaults(kind, name);
        if kind == EntityKind::User {
            let home = self
                .defaults
                .home_for(name)
                .map_err(|e| StorageError::invalid(e.to_string()))?;
            defaults = defaults.with(keys::HOME_DIRECTORY, home);
            if self.shadow {
                defaults = defaults.with(keys::SHADOW_LAST_CHANGE, days_since_epoch());
            }
        }
        let scheme = LockScheme::SHADOW;
        if self.shadow {
            defaults = defaults.with(keys::SHADOW_PASSWORD, scheme.no_password());
        } else {
            defaults = defaults.with(keys::USER_PASSWORD, scheme.no_password());
        }
        Ok(defaults)
    }

    /// Applies the password-field convention and fills password defaults.
    fn normalize(&self, record: &mut AttributeRecord) {
        let no_password = LockScheme::SHADOW.no_password();
        if self.shadow {
            record.set_value(keys::USER_PASSWORD, "x");
            if !record.has(keys::SHADOW_PASSWORD) {
                record.set_value(keys::SHADOW_PASSWORD, no_password);
            }
        } else if !record.has(keys::USER_PASSWORD) {
            record.set_value(keys::USER_PASSWORD, no_password);
        }
    }

    fn view(&self, stored: AttributeRecord) -> EntryView {
        let name = stored.name().unwrap_or_default().to_string();
        let defaults = self
            .lookup_defaults(stored.kind(), &name)
            .missing_from(&stored);
        EntryView { stored, defaults }
    }

    /// Every entry of `kind`, shadow values merged in.
    fn read_entries(&self, kind: EntityKind) -> StorageResult<Vec<AttributeRecord>> {
        let (main, secret) = self.layouts(kind);
        let mut secrets = Vec::new();
        if let Some(secret) = secret {
            for line in self.store.read(&secret)? {
                if let Some(record) = secret.parse(&line)? {
                    secrets.push(record);
                }
            }
        }

        let mut entries = Vec::new();
        for line in self.store.read(&main)? {
            if let Some(mut record) = main.parse(&line)? {
                let name = record.name()?.to_string();
                if let Some(extra) = secrets.iter().find(|s| s.name().is_ok_and(|n| n == name)) {
                    record.overlay(extra);
                }
                entries.push(record);
            }
        }
        Ok(entries)
    }

    fn find_stored(&self, record: &AttributeRecord) -> StorageResult<AttributeRecord> {
        let name = record.name()?;
        self.read_entries(record.kind())?
            .into_iter()
            .find(|r| r.name().is_ok_and(|n| n == name))
            .ok_or_else(|| StorageError::not_found(record.kind(), name))
    }

    /// Loads one entry inside a transaction.
    fn load_locked(
        &self,
        tx: &mut Transaction<'_>,
        kind: EntityKind,
        name: &str,
    ) -> StorageResult<Option<AttributeRecord>> {
        let (main, secret) = self.layouts(kind);
        let Some(mut record) = parse_named(&main, tx.lines(&main)?, name)? else {
            return Ok(None);
        };
        if let Some(secret) = secret {
            if let Some(extra) = parse_named(&secret, tx.lines(&secret)?, name)? {
                record.overlay(&extra);
            }
        }
        Ok(Some(record))
    }

    /// Writes `record` over the lines named `old_name`, appending where
    /// no such line exists.
    fn write_locked(
        &self,
        tx: &mut Transaction<'_>,
        old_name: &str,
        record: &AttributeRecord,
    ) -> StorageResult<()> {
        let (main, secret) = self.layouts(record.kind());
        let main_line = main.format(record)?;
        let secret_line = secret.map(|s| s.format(record).map(|l| (s, l))).transpose()?;

        replace_or_append(tx.lines(&main)?, old_name, main_line);
        if let Some((secret, line)) = secret_line {
            replace_or_append(tx.lines(&secret)?, old_name, line);
        }
        Ok(())
    }

    /// Fails with a duplicate error when another entry than `except`
    /// already has `id`.
    fn check_id_free(
        tx: &mut Transaction<'_>,
        main: &Layout,
        id: u64,
        except: Option<&str>,
    ) -> StorageResult<()> {
        for line in tx.lines(main)?.iter() {
            let Some(record) = main.parse(line)? else {
                continue;
            };
            if except.is_some_and(|e| record.name().is_ok_and(|n| n == e)) {
                continue;
            }
            if record.id().is_ok_and(|other| other == id) {
                return Err(StorageError::duplicate(
                    main.kind,
                    main.kind.id_key(),
                    id.to_string(),
                ));
            }
        }
        Ok(())
    }

    fn update_credential<F>(&self, record: &AttributeRecord, op: F) -> StorageResult<()>
    where
        F: FnOnce(&CredentialPolicy, &mut AttributeRecord) -> StorageResult<()>,
    {
        let kind = record.kind();
        let name = record.name()?.to_string();
        let mut tx = self.store.begin()?;
        let mut stored = self
            .load_locked(&mut tx, kind, &name)?
            .ok_or_else(|| StorageError::not_found(kind, name.as_str()))?;
        op(&self.policy(kind), &mut stored)?;
        self.write_locked(&mut tx, &name, &stored)?;
        tx.commit()
    }
}

fn id_value(id: u64) -> StorageResult<i64> {
    i64::try_from(id).map_err(|_| StorageError::invalid(format!("id {id} is out of range")))
}

fn find_line(lines: &[String], name: &str) -> Option<usize> {
    lines.iter().position(|l| line_name(l) == Some(name))
}

fn parse_named(
    layout: &Layout,
    lines: &[String],
    name: &str,
) -> StorageResult<Option<AttributeRecord>> {
    match find_line(lines, name) {
        Some(i) => layout.parse(&lines[i]),
        None => Ok(None),
    }
}

fn replace_or_append(lines: &mut Vec<String>, name: &str, line: String) {
    match find_line(lines, name) {
        Some(i) => lines[i] = line,
        None => lines.push(line),
    }
}

impl AccountModule for FilesModule {
    fn name(&self) -> &str {
        MODULE_NAME
    }

    fn uses_elevated_privileges(&self) -> bool {
        true
    }

    fn lookup_by_name(&self, kind: EntityKind, name: &str) -> StorageResult<Option<EntryView>> {
        Ok(self
            .read_entries(kind)?
            .into_iter()
            .find(|r| r.name().is_ok_and(|n| n == name))
            .map(|r| self.view(r)))
    }

    fn lookup_by_id(&self, kind: EntityKind, id: u64) -> StorageResult<Option<EntryView>> {
        Ok(self
            .read_entries(kind)?
            .into_iter()
            .find(|r| r.id().is_ok_and(|i| i == id))
            .map(|r| self.view(r)))
    }

    fn prepare_add(&self, record: &AttributeRecord) -> StorageResult<AttributeRecord> {
        let kind = record.kind();
        let name = record.name()?;
        record.id()?;

        let mut prepared = record.clone();
        self.add_defaults(kind, name)?.apply(&mut prepared);
        self.required(kind)?.refill(&mut prepared);
        self.normalize(&mut prepared);

        let (main, secret) = self.layouts(kind);
        main.format(&prepared)?;
        if let Some(secret) = secret {
            secret.format(&prepared)?;
        }
        Ok(prepared)
    }

    fn add(&self, record: &AttributeRecord) -> StorageResult<AttributeRecord> {
        let prepared = self.prepare_add(record)?;
        let kind = prepared.kind();
        let name = prepared.name()?.to_string();
        let (main, _) = self.layouts(kind);

        let mut tx = self.store.begin()?;
        if find_line(tx.lines(&main)?, &name).is_some() {
            return Err(StorageError::duplicate(kind, kind.name_key(), name));
        }
        Self::check_id_free(&mut tx, &main, prepared.id()?, None)?;
        self.write_locked(&mut tx, &name, &prepared)?;
        tx.commit()?;

        tracing::info!(module = MODULE_NAME, %kind, name = %name, "added entry");
        Ok(prepared)
    }

    fn modify(&self, old: &AttributeRecord, new: &AttributeRecord) -> StorageResult<()> {
        let kind = old.kind();
        let old_name = old.name()?.to_string();
        let new_name = new.name()?.to_string();
        let new_id = new.id()?;
        let (main, secret) = self.layouts(kind);

        let mut tx = self.store.begin()?;
        let current = self
            .load_locked(&mut tx, kind, &old_name)?
            .ok_or_else(|| StorageError::not_found(kind, old_name.as_str()))?;

        if new_name != old_name && find_line(tx.lines(&main)?, &new_name).is_some() {
            return Err(StorageError::duplicate(kind, kind.name_key(), new_name));
        }
        if current.id().ok() != Some(new_id) {
            Self::check_id_free(&mut tx, &main, new_id, Some(&old_name))?;
        }

        if new_name != old_name {
            if let Some(secret) = secret {
                tx.lines(&secret)?
                    .retain(|l| line_name(l) != Some(new_name.as_str()));
            }
        }
        let mut updated = new.clone();
        self.policy(kind).keep_stored_if_foreign(&current, &mut updated);
        self.required(kind)?.refill(&mut updated);
        self.normalize(&mut updated);
        self.write_locked(&mut tx, &old_name, &updated)?;
        tx.commit()?;

        tracing::info!(module = MODULE_NAME, %kind, old = %old_name, new = %new_name, "modified entry");
        Ok(())
    }

    fn delete(&self, record: &AttributeRecord) -> StorageResult<()> {
        let kind = record.kind();
        let name = record.name()?;
        let (main, secret) = self.layouts(kind);

        let mut tx = self.store.begin()?;
        let lines = tx.lines(&main)?;
        let Some(i) = find_line(lines, name) else {
            return Err(StorageError::not_found(kind, name));
        };
        lines.remove(i);
        if let Some(secret) = secret {
            let lines = tx.lines(&secret)?;
            lines.retain(|l| line_name(l) != Some(name));
        }
        tx.commit()?;

        tracing::info!(module = MODULE_NAME, %kind, name = %name, "deleted entry");
        Ok(())
    }

    fn enumerate_full(
        &self,
        kind: EntityKind,
        pattern: &NamePattern,
    ) -> StorageResult<Vec<EntryView>> {
        Ok(self
            .read_entries(kind)?
            .into_iter()
            .filter(|r| r.name().is_ok_and(|n| pattern.matches(n)))
            .map(|r| self.view(r))
            .collect())
    }

    fn is_locked(&self, record: &AttributeRecord) -> StorageResult<bool> {
        let stored = self.find_stored(record)?;
        self.policy(record.kind()).is_locked(&stored)
    }

    fn check_credential(&self, record: &AttributeRecord, change: CredentialChange) -> StorageResult<()> {
        let stored = self.find_stored(record)?;
        self.policy(record.kind()).check(&stored, change)
    }

    fn lock_credential(&self, record: &AttributeRecord) -> StorageResult<()> {
        self.update_credential(record, |policy, stored| policy.lock(stored))
    }

    fn unlock_credential(&self, record: &AttributeRecord, allow_empty: bool) -> StorageResult<()> {
        self.update_credential(record, |policy, stored| policy.unlock(stored, allow_empty))
    }

    fn set_password(
        &self,
        record: &AttributeRecord,
        plaintext: &str,
        is_prehashed: bool,
    ) -> StorageResult<()> {
        self.update_credential(record, |policy, stored| {
            policy.set_password(stored, self.hasher.as_ref(), plaintext, is_prehashed)
        })
    }

    fn remove_password(&self, record: &AttributeRecord) -> StorageResult<()> {
        self.update_credential(record, |policy, stored| policy.remove_password(stored))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use std::path::Path;
    use ua_crypto::{Argon2Hasher, HashPolicy};

    fn module(dir: &Path, shadow: bool) -> FilesModule {
        let files = FilesConfig {
            directory: dir.to_path_buf(),
            shadow,
            backup: false,
        };
        let hasher = Argon2Hasher::new(HashPolicy::new().memory_cost(64).time_cost(1));
        FilesModule::new(&files, &DefaultsConfig::default(), Arc::new(hasher))
    }

    fn user(name: &str, uid: i64) -> AttributeRecord {
        let mut record = AttributeRecord::named(EntityKind::User, name);
        record.set_value(keys::UID_NUMBER, uid);
        record
    }

    fn group(name: &str, gid: i64) -> AttributeRecord {
        let mut record = AttributeRecord::named(EntityKind::Group, name);
        record.set_value(keys::GID_NUMBER, gid);
        record
    }

    #[test]
    fn add_writes_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let files = module(dir.path(), true);

        let mut record = user("alice", 1000);
        record.set_value(keys::USER_PASSWORD, "ignored");
        let added = files.add(&record).unwrap();

        assert_eq!(added.text(keys::USER_PASSWORD).unwrap(), "x");
        assert_eq!(added.text(keys::SHADOW_PASSWORD).unwrap(), "!!");
        assert_eq!(
            fs::read_to_string(dir.path().join("passwd")).unwrap(),
            "alice:x:1000:100::/home/alice:/bin/bash\n"
        );
        let shadow = fs::read_to_string(dir.path().join("shadow")).unwrap();
        assert!(shadow.starts_with("alice:!!:"));
        assert!(shadow.trim_end().ends_with(":0:99999:7:-1:-1:-1"));
    }

    #[test]
    fn caller_shadow_password_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let files = module(dir.path(), true);

        let mut record = user("bob", 1001);
        record.set_value(keys::SHADOW_PASSWORD, "$6$salt$hash");
        files.add(&record).unwrap();

        let view = files.lookup_by_name(EntityKind::User, "bob").unwrap().unwrap();
        assert_eq!(view.stored.text(keys::SHADOW_PASSWORD).unwrap(), "$6$salt$hash");
    }

    #[test]
    fn lookup_reports_defaults_separately() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("passwd"), "carol:x:1002:100:::\n").unwrap();
        let files = module(dir.path(), false);

        let view = files.lookup_by_name(EntityKind::User, "carol").unwrap().unwrap();
        assert!(!view.stored.has(keys::LOGIN_SHELL));
        assert_eq!(view.defaults.text(keys::LOGIN_SHELL).unwrap(), "/bin/bash");
        assert_eq!(view.merged().text(keys::HOME_DIRECTORY).unwrap(), "/home/carol");
        assert!(!view.defaults.has(keys::SHADOW_MAX));
    }

    #[test]
    fn duplicate_name_and_id_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let files = module(dir.path(), true);
        files.add(&user("alice", 1000)).unwrap();

        assert!(files.add(&user("alice", 1005)).unwrap_err().is_duplicate());
        assert!(files.add(&user("other", 1000)).unwrap_err().is_duplicate());
    }

    #[test]
    fn add_needs_an_id() {
        let dir = tempfile::tempdir().unwrap();
        let files = module(dir.path(), true);
        let err = files
            .add(&AttributeRecord::named(EntityKind::User, "noid"))
            .unwrap_err();
        assert!(err.is_invalid_input());
        assert!(!dir.path().join("passwd").exists());
    }

    #[test]
    fn dot_names_get_no_home() {
        let dir = tempfile::tempdir().unwrap();
        let files = module(dir.path(), true);
        assert!(files.prepare_add(&user("..", 1000)).unwrap_err().is_invalid_input());
    }

    #[test]
    fn large_ids_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let files = module(dir.path(), true);
        files.add(&user("big", 2_147_483_648)).unwrap();

        let view = files
            .lookup_by_id(EntityKind::User, 2_147_483_648)
            .unwrap()
            .unwrap();
        assert_eq!(view.name(), Some("big"));
    }

    #[test]
    fn modify_renames_in_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let files = module(dir.path(), true);
        let old = files.add(&user("alice", 1000)).unwrap();

        let mut new = old.clone();
        new.set_value(keys::USER_NAME, "alicia");
        new.set_value(keys::LOGIN_SHELL, "/bin/zsh");
        files.modify(&old, &new).unwrap();

        assert!(files.lookup_by_name(EntityKind::User, "alice").unwrap().is_none());
        let view = files.lookup_by_name(EntityKind::User, "alicia").unwrap().unwrap();
        assert_eq!(view.stored.text(keys::LOGIN_SHELL).unwrap(), "/bin/zsh");
        assert_eq!(view.stored.text(keys::SHADOW_PASSWORD).unwrap(), "!!");
        let shadow = fs::read_to_string(dir.path().join("shadow")).unwrap();
        assert!(shadow.starts_with("alicia:"));
    }

    #[test]
    fn modify_ignores_foreign_credentials() {
        let dir = tempfile::tempdir().unwrap();
        let files = module(dir.path(), false);
        let old = files.add(&user("dave", 1003)).unwrap();

        let mut new = old.clone();
        new.set_value(keys::USER_PASSWORD, "{CRYPT}$6$abc");
        new.set_value(keys::GECOS, "Dave");
        files.modify(&old, &new).unwrap();

        let view = files.lookup_by_name(EntityKind::User, "dave").unwrap().unwrap();
        assert_eq!(view.stored.text(keys::USER_PASSWORD).unwrap(), "!!");
        assert_eq!(view.stored.text(keys::GECOS).unwrap(), "Dave");
    }

    #[test]
    fn cleared_primary_group_falls_back_to_the_default() {
        let dir = tempfile::tempdir().unwrap();
        let files = module(dir.path(), true);
        let mut record = user("alice", 1000);
        record.set_value(keys::GID_NUMBER, 500_i64);
        let old = files.add(&record).unwrap();

        let mut new = old.clone();
        new.clear(keys::GID_NUMBER);
        files.modify(&old, &new).unwrap();
        assert_eq!(
            fs::read_to_string(dir.path().join("passwd")).unwrap(),
            "alice:x:1000:100::/home/alice:/bin/bash\n"
        );

        let mut blank = old.clone();
        blank.set_value(keys::GID_NUMBER, "");
        files.modify(&old, &blank).unwrap();
        let view = files.lookup_by_name(EntityKind::User, "alice").unwrap().unwrap();
        assert_eq!(view.stored.int(keys::GID_NUMBER).unwrap(), 100);
    }

    #[test]
    fn missing_primary_group_reads_as_the_default() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("passwd"), "erin:x:1004::::\n").unwrap();
        let files = module(dir.path(), false);

        let view = files.lookup_by_name(EntityKind::User, "erin").unwrap().unwrap();
        assert!(!view.stored.has(keys::GID_NUMBER));
        assert_eq!(view.merged().int(keys::GID_NUMBER).unwrap(), 100);
    }

    #[test]
    fn rename_onto_existing_name_fails() {
        let dir = tempfile::tempdir().unwrap();
        let files = module(dir.path(), true);
        let a = files.add(&group("a", 2000)).unwrap();
        files.add(&group("b", 2001)).unwrap();

        let mut renamed = a.clone();
        renamed.set_value(keys::GROUP_NAME, "b");
        assert!(files.modify(&a, &renamed).unwrap_err().is_duplicate());
    }

    #[test]
    fn modify_missing_entry_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let files = module(dir.path(), true);
        let ghost = user("ghost", 1);
        assert!(files.modify(&ghost, &ghost).unwrap_err().is_not_found());
    }

    #[test]
    fn delete_removes_both_lines() {
        let dir = tempfile::tempdir().unwrap();
        let files = module(dir.path(), true);
        let added = files.add(&user("alice", 1000)).unwrap();

        files.delete(&added).unwrap();
        assert!(files.lookup_by_name(EntityKind::User, "alice").unwrap().is_none());
        assert_eq!(fs::read_to_string(dir.path().join("shadow")).unwrap(), "");
        assert!(files.delete(&added).unwrap_err().is_not_found());
    }

    #[test]
    fn enumerate_skips_placeholders_and_comments() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("group"),
            "# local groups\nwheel:x:10:root\n+\n-nis\n077:x:77:\n+@netgroup\n",
        )
        .unwrap();
        let files = module(dir.path(), false);

        let names = files.enumerate_names(EntityKind::Group, &NamePattern::any()).unwrap();
        assert_eq!(names, vec!["wheel", "077"]);

        let digits = NamePattern::new("0*").unwrap();
        assert_eq!(files.enumerate_names(EntityKind::Group, &digits).unwrap(), vec!["077"]);
    }

    #[test]
    fn placeholders_survive_rewrites() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("group"), "+\nwheel:x:10:\n").unwrap();
        let files = module(dir.path(), false);

        files.add(&group("staff", 50)).unwrap();
        assert_eq!(
            fs::read_to_string(dir.path().join("group")).unwrap(),
            "+\nwheel:x:10:\nstaff:!!:50:\n"
        );
    }

    #[test]
    fn lock_unlock_and_passwords() {
        let dir = tempfile::tempdir().unwrap();
        let files = module(dir.path(), true);
        let alice = files.add(&user("alice", 1000)).unwrap();

        assert!(files.is_locked(&alice).unwrap());
        assert!(files
            .check_credential(&alice, CredentialChange::Unlock { allow_empty: false })
            .is_err());

        files.set_password(&alice, "s3cret", false).unwrap();
        assert!(!files.is_locked(&alice).unwrap());
        let view = files.lookup_by_name(EntityKind::User, "alice").unwrap().unwrap();
        let hash = view.stored.text(keys::SHADOW_PASSWORD).unwrap().to_string();
        assert!(hash.starts_with("$argon2id$"));
        assert_eq!(view.stored.text(keys::USER_PASSWORD).unwrap(), "x");
        assert_eq!(
            view.stored.int(keys::SHADOW_LAST_CHANGE).unwrap(),
            days_since_epoch()
        );

        files.lock_credential(&alice).unwrap();
        assert!(files.is_locked(&alice).unwrap());
        files.unlock_credential(&alice, false).unwrap();
        let view = files.lookup_by_name(EntityKind::User, "alice").unwrap().unwrap();
        assert_eq!(view.stored.text(keys::SHADOW_PASSWORD).unwrap(), hash);

        files.remove_password(&alice).unwrap();
        let view = files.lookup_by_name(EntityKind::User, "alice").unwrap().unwrap();
        assert_eq!(view.stored.text(keys::SHADOW_PASSWORD).unwrap(), "");
    }

    #[test]
    fn group_passwords_without_shadow() {
        let dir = tempfile::tempdir().unwrap();
        let files = module(dir.path(), false);
        let staff = files.add(&group("staff", 50)).unwrap();

        files.set_password(&staff, "$6$abc$def", true).unwrap();
        assert_eq!(
            fs::read_to_string(dir.path().join("group")).unwrap(),
            "staff:$6$abc$def:50:\n"
        );
        assert!(!dir.path().join("gshadow").exists());
    }

    #[test]
    fn credential_ops_on_missing_entry() {
        let dir = tempfile::tempdir().unwrap();
        let files = module(dir.path(), true);
        assert!(files.lock_credential(&user("ghost", 1)).unwrap_err().is_not_found());
        assert!(files.is_locked(&user("ghost", 1)).unwrap_err().is_not_found());
    }
}
