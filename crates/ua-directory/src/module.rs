//! The directory-service account module.

use std::sync::Arc;

use parking_lot::Mutex;
use ua_core::config::DefaultsConfig;
use ua_crypto::{CredentialHasher, LockScheme};
use ua_model::{keys, AttrValue, AttributeRecord, EntityKind};
use ua_storage::{
    days_since_epoch, AccountModule, CredentialChange, CredentialPolicy, CredentialSlots,
    Defaults, EntryView, NamePattern, StorageError, StorageResult,
};

use crate::client::{DirEntry, DirectoryClient, DirectoryConnector, Modification, SearchFilter};
use crate::config::DirectoryConfig;
use crate::error::{DirectoryError, DirectoryResult};
use crate::mapper;

/// Module name used in configuration.
pub const MODULE_NAME: &str = "ldap";

/// Stores users and groups as POSIX entries in a directory service.
///
/// The module owns one bound connection for its whole life and unbinds it on
/// drop. Calls are serialized on that connection.
pub struct DirectoryModule {
    config: DirectoryConfig,
    defaults: DefaultsConfig,
    client: Mutex<Box<dyn DirectoryClient>>,
    hasher: Arc<dyn CredentialHasher>,
}

impl std::fmt::Debug for DirectoryModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryModule")
            .field("url", &self.config.url)
            .field("base_dn", &self.config.base_dn)
            .finish_non_exhaustive()
    }
}

impl DirectoryModule {
    /// Creates a module over an already bound client.
    #[must_use]
    pub fn new(
        config: DirectoryConfig,
        defaults: &DefaultsConfig,
        client: Box<dyn DirectoryClient>,
        hasher: Arc<dyn CredentialHasher>,
    ) -> Self {
        Self {
            config,
            defaults: defaults.clone(),
            client: Mutex::new(client),
            hasher,
        }
    }

    /// Connects through `connector` and creates a module over the result.
    ///
    /// # Errors
    ///
    /// Returns the connector's connection or bind error.
    pub fn connect(
        config: DirectoryConfig,
        defaults: &DefaultsConfig,
        connector: &dyn DirectoryConnector,
        hasher: Arc<dyn CredentialHasher>,
    ) -> DirectoryResult<Self> {
        let client = connector.connect(&config)?;
        tracing::info!(url = %config.url, base_dn = %config.base_dn, "directory module ready");
        Ok(Self::new(config, defaults, client, hasher))
    }

    /// Connection settings.
    #[must_use]
    pub const fn config(&self) -> &DirectoryConfig {
        &self.config
    }

    fn policy(kind: EntityKind) -> CredentialPolicy {
        CredentialPolicy {
            slots: CredentialSlots {
                primary: keys::USER_PASSWORD,
                secondary: None,
            },
            scheme: LockScheme::DIRECTORY,
            last_change: (kind == EntityKind::User).then_some(keys::SHADOW_LAST_CHANGE),
        }
    }

    fn primary_gid(&self) -> StorageResult<i64> {
        i64::try_from(self.defaults.user_gid)
            .map_err(|_| StorageError::invalid("default gid is out of range"))
    }

    /// Values for the attributes `posixAccount` requires.
    fn required(&self, kind: EntityKind, name: &str) -> StorageResult<Defaults> {
        if kind == EntityKind::Group {
            return Ok(Defaults::new(kind));
        }
        let home = self
            .defaults
            .home_for(name)
            .map_err(|e| StorageError::invalid(e.to_string()))?;
        Ok(Defaults::new(kind)
            .with(keys::GROUP_NAME, name)
            .with(keys::HOME_DIRECTORY, home)
            .with(keys::GID_NUMBER, self.primary_gid()?))
    }

    fn lookup_defaults(&self, kind: EntityKind, name: &str) -> Defaults {
        match kind {
            EntityKind::User => {
                let mut defaults = Defaults::new(kind)
                    .with(keys::LOGIN_SHELL, self.defaults.login_shell.as_str());
                if let Ok(home) = self.defaults.home_for(name) {
                    defaults = defaults.with(keys::HOME_DIRECTORY, home);
                }
                if let Ok(gid) = self.primary_gid() {
                    defaults = defaults.with(keys::GID_NUMBER, gid);
                }
                defaults.extend(&Defaults::shadow_aging(kind))
            }
            EntityKind::Group => Defaults::new(kind),
        }
    }

    fn add_defaults(&self, kind: EntityKind, name: &str) -> StorageResult<Defaults> {
        let classes = self
            .config
            .object_classes(kind)
            .iter()
            .map(AttrValue::text)
            .collect();
        let mut defaults = self
            .lookup_defaults(kind, name)
            .with_values(keys::OBJECT_CLASS, classes)
            .with(keys::USER_PASSWORD, LockScheme::DIRECTORY.no_password());

        if kind == EntityKind::User {
            defaults = defaults.with(keys::SHADOW_LAST_CHANGE, days_since_epoch());
        }
        Ok(defaults.extend(&self.required(kind, name)?))
    }

    fn view(&self, kind: EntityKind, entry: &DirEntry) -> EntryView {
        let stored = mapper::entry_to_record(kind, entry);
        let name = stored.name().unwrap_or_default().to_string();
        let defaults = self.lookup_defaults(kind, &name).missing_from(&stored);
        EntryView { stored, defaults }
    }

    fn search(&self, kind: EntityKind, filter: &SearchFilter) -> StorageResult<Vec<DirEntry>> {
        let base = self.config.container(kind);
        tracing::trace!(base = %base, filter = %filter.to_ldap_string(), "directory search");
        Ok(self.client.lock().search(&base, filter)?)
    }

    fn find_by_name(&self, kind: EntityKind, name: &str) -> StorageResult<Option<DirEntry>> {
        let filter = SearchFilter::equals(kind.name_key(), name);
        Ok(self.search(kind, &filter)?.into_iter().next())
    }

    fn find_by_id(&self, kind: EntityKind, id: u64) -> StorageResult<Option<DirEntry>> {
        let filter = SearchFilter::equals(kind.id_key(), id.to_string());
        Ok(self.search(kind, &filter)?.into_iter().next())
    }

    fn require(&self, record: &AttributeRecord) -> StorageResult<DirEntry> {
        let name = record.name()?;
        self.find_by_name(record.kind(), name)?
            .ok_or_else(|| StorageError::not_found(record.kind(), name))
    }

    fn apply(&self, dn: &str, changes: &[Modification]) -> StorageResult<()> {
        if changes.is_empty() {
            return Ok(());
        }
        self.client.lock().modify(dn, changes)?;
        Ok(())
    }

    fn update_credential<F>(&self, record: &AttributeRecord, op: F) -> StorageResult<()>
    where
        F: FnOnce(&CredentialPolicy, &mut AttributeRecord) -> StorageResult<()>,
    {
        let kind = record.kind();
        let entry = self.require(record)?;
        let policy = Self::policy(kind);
        let before = mapper::entry_to_record(kind, &entry);
        let mut after = before.clone();
        op(&policy, &mut after)?;

        let touched = [Some(policy.slots.primary), policy.last_change];
        let changes: Vec<Modification> = touched
            .into_iter()
            .flatten()
            .filter(|key| after.get(key).ok() != before.get(key).ok())
            .map(|key| {
                let values = after
                    .get(key)
                    .map(|v| v.iter().map(ToString::to_string).collect())
                    .unwrap_or_default();
                Modification::Replace(key.to_string(), values)
            })
            .collect();
        self.apply(&entry.dn, &changes)
    }
}

impl Drop for DirectoryModule {
    fn drop(&mut self) {
        if let Err(e) = self.client.get_mut().unbind() {
            tracing::warn!(error = %e, "failed to unbind from directory");
        }
    }
}

impl AccountModule for DirectoryModule {
    fn name(&self) -> &str {
        MODULE_NAME
    }

    fn lookup_by_name(&self, kind: EntityKind, name: &str) -> StorageResult<Option<EntryView>> {
        Ok(self.find_by_name(kind, name)?.map(|e| self.view(kind, &e)))
    }

    fn lookup_by_id(&self, kind: EntityKind, id: u64) -> StorageResult<Option<EntryView>> {
        Ok(self.find_by_id(kind, id)?.map(|e| self.view(kind, &e)))
    }

    fn prepare_add(&self, record: &AttributeRecord) -> StorageResult<AttributeRecord> {
        let kind = record.kind();
        let name = record.name()?;
        record.id()?;

        let mut prepared = record.clone();
        prepared.clear(keys::SHADOW_PASSWORD);
        self.add_defaults(kind, name)?.apply(&mut prepared);
        self.required(kind, name)?.refill(&mut prepared);
        Ok(prepared)
    }

    fn add(&self, record: &AttributeRecord) -> StorageResult<AttributeRecord> {
        let prepared = self.prepare_add(record)?;
        let kind = prepared.kind();
        let name = prepared.name()?.to_string();
        let id = prepared.id()?;

        if self.find_by_name(kind, &name)?.is_some() {
            return Err(StorageError::duplicate(kind, kind.name_key(), name));
        }
        if self.find_by_id(kind, id)?.is_some() {
            return Err(StorageError::duplicate(kind, kind.id_key(), id.to_string()));
        }

        let dn = self.config.entry_dn(kind, &name);
        let entry = mapper::record_to_entry(dn.as_str(), &prepared);
        self.client.lock().add(&entry).map_err(|e| match e {
            DirectoryError::AlreadyExists(_) => {
                StorageError::duplicate(kind, kind.name_key(), name.as_str())
            }
            other => other.into(),
        })?;

        tracing::info!(module = MODULE_NAME, %kind, dn = %dn, "added entry");
        Ok(prepared)
    }

    fn modify(&self, old: &AttributeRecord, new: &AttributeRecord) -> StorageResult<()> {
        let kind = old.kind();
        let old_name = old.name()?.to_string();
        let new_name = new.name()?.to_string();
        let new_id = new.id()?;
        let entry = self.require(old)?;
        let stored = mapper::entry_to_record(kind, &entry);

        if new_name != old_name && self.find_by_name(kind, &new_name)?.is_some() {
            return Err(StorageError::duplicate(kind, kind.name_key(), new_name));
        }
        if stored.id().ok() != Some(new_id) {
            let holder = self.find_by_id(kind, new_id)?;
            if holder.is_some_and(|h| h.get_attr(kind.name_key()) != Some(old_name.as_str())) {
                return Err(StorageError::duplicate(kind, kind.id_key(), new_id.to_string()));
            }
        }

        let mut updated = new.clone();
        updated.clear(keys::SHADOW_PASSWORD);
        Self::policy(kind).keep_stored_if_foreign(&stored, &mut updated);
        self.required(kind, &new_name)?.refill(&mut updated);

        let mut dn = entry.dn.clone();
        if new_name != old_name {
            let rdn = DirectoryConfig::rdn(kind, &new_name);
            self.client.lock().rename(&dn, &rdn).map_err(|e| match e {
                DirectoryError::AlreadyExists(_) => {
                    StorageError::duplicate(kind, kind.name_key(), new_name.as_str())
                }
                other => other.into(),
            })?;
            dn = self.config.entry_dn(kind, &new_name);
        }

        let changes = mapper::diff(&entry, &updated, &[kind.name_key()]);
        self.apply(&dn, &changes)?;

        tracing::info!(module = MODULE_NAME, %kind, dn = %dn, changes = changes.len(), "modified entry");
        Ok(())
    }

    fn delete(&self, record: &AttributeRecord) -> StorageResult<()> {
        let entry = self.require(record)?;
        self.client.lock().delete(&entry.dn)?;
        tracing::info!(module = MODULE_NAME, kind = %record.kind(), dn = %entry.dn, "deleted entry");
        Ok(())
    }

    fn enumerate_full(
        &self,
        kind: EntityKind,
        pattern: &NamePattern,
    ) -> StorageResult<Vec<EntryView>> {
        let filter = SearchFilter::present(kind.name_key());
        let mut views: Vec<EntryView> = self
            .search(kind, &filter)?
            .iter()
            .map(|e| self.view(kind, e))
            .filter(|v| v.name().is_some_and(|n| pattern.matches(n)))
            .collect();
        views.sort_by(|a, b| a.name().cmp(&b.name()));
        Ok(views)
    }

    fn is_locked(&self, record: &AttributeRecord) -> StorageResult<bool> {
        let entry = self.require(record)?;
        Self::policy(record.kind()).is_locked(&mapper::entry_to_record(record.kind(), &entry))
    }

    fn check_credential(&self, record: &AttributeRecord, change: CredentialChange) -> StorageResult<()> {
        let entry = self.require(record)?;
        Self::policy(record.kind()).check(&mapper::entry_to_record(record.kind(), &entry), change)
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
