//! The admin session.
//!
//! An [`AdminSession`] is what callers hold. It builds the configured
//! modules once (prompting for directory credentials if the directory module
//! is in use) and keeps them for its whole life, so a directory connection
//! is bound once and reused across operations.
//!
//! Mutating methods take the caller's record by `&mut` and replace it with
//! the stored state afterwards.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use ua_core::config::DirectorySection;
use ua_core::{AdminConfig, Error, Result};
use ua_crypto::{Argon2Hasher, CredentialHasher, HashPolicy};
use ua_directory::{DirectoryConfig, DirectoryConnector, DirectoryError, DirectoryModule};
use ua_model::{keys, AttributeRecord, EntityKind, NameValidator};
use ua_storage::NamePattern;
use ua_storage_files::FilesModule;

use crate::dispatcher::{Dispatcher, SharedModule};
use crate::home::{self, Owner};
use crate::prompt::{self, Prompt, Prompter};

/// Caller-facing entry point for account administration.
///
/// A session is used from one thread at a time. Callers needing concurrency
/// open one session each.
#[derive(Debug)]
pub struct AdminSession {
    config: AdminConfig,
    validator: NameValidator,
    users: Dispatcher,
    groups: Dispatcher,
}

impl AdminSession {
    /// Opens a session over the modules named in `config`.
    ///
    /// When the directory module is configured, `prompter` is asked for the
    /// server URL, base DN, bind DN and bind password before connecting
    /// through `connector`. Every prompt must be answered.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for invalid configuration, unknown module
    /// names or unanswered prompts, and [`Error::Module`] when the directory
    /// cannot be reached or rejects the bind.
    pub fn open(
        config: AdminConfig,
        prompter: &dyn Prompter,
        connector: &dyn DirectoryConnector,
    ) -> Result<Self> {
        config.validate()?;
        let defaults = &config.defaults;
        let hasher: Arc<dyn CredentialHasher> = Arc::new(Argon2Hasher::new(
            HashPolicy::new()
                .memory_cost(defaults.hash_memory_kib)
                .time_cost(defaults.hash_time_cost)
                .parallelism(defaults.hash_parallelism),
        ));

        let mut built: BTreeMap<String, SharedModule> = BTreeMap::new();
        for name in config.modules.user.iter().chain(&config.modules.group) {
            if !built.contains_key(name) {
                let module = build_module(name, &config, &hasher, prompter, connector)?;
                built.insert(name.clone(), module);
            }
        }
        let pick = |names: &[String]| -> Vec<SharedModule> {
            names.iter().filter_map(|n| built.get(n).cloned()).collect()
        };
        let users = pick(&config.modules.user);
        let groups = pick(&config.modules.group);

        tracing::info!(
            user_modules = ?config.modules.user,
            group_modules = ?config.modules.group,
            "admin session opened"
        );
        Ok(Self::with_modules(config, users, groups))
    }

    /// Creates a session over modules the caller has already built.
    #[must_use]
    pub fn with_modules(
        config: AdminConfig,
        users: Vec<SharedModule>,
        groups: Vec<SharedModule>,
    ) -> Self {
        let validator = NameValidator::new(config.defaults.max_name_length);
        Self {
            users: Dispatcher::new(EntityKind::User, users, validator),
            groups: Dispatcher::new(EntityKind::Group, groups, validator),
            validator,
            config,
        }
    }

    /// Configuration the session was opened with.
    #[must_use]
    pub const fn config(&self) -> &AdminConfig {
        &self.config
    }

    /// Dispatcher for `kind`.
    #[must_use]
    pub const fn dispatcher(&self, kind: EntityKind) -> &Dispatcher {
        match kind {
            EntityKind::User => &self.users,
            EntityKind::Group => &self.groups,
        }
    }

    /// Whether any configured module needs administrator rights.
    #[must_use]
    pub fn uses_elevated_privileges(&self) -> bool {
        self.users.uses_elevated_privileges() || self.groups.uses_elevated_privileges()
    }

    // ========================================================================
    // New entries
    // ========================================================================

    /// A user record named `name` with the next free uid, the default login
    /// shell, a home directory derived from the name and the default gid.
    /// Nothing is stored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for a bad name, including `.` and `..`.
    pub fn new_user(&self, name: &str) -> Result<AttributeRecord> {
        self.validate_name(EntityKind::User, name)?;
        let defaults = &self.config.defaults;
        let home = defaults.home_for(name)?;
        let uid = self.users.next_free_id(defaults.first_uid)?;

        let mut record = AttributeRecord::named(EntityKind::User, name);
        record.set_value(keys::UID_NUMBER, id_value(keys::UID_NUMBER, uid)?);
        record.set_value(keys::GID_NUMBER, id_value(keys::GID_NUMBER, defaults.user_gid)?);
        record.set_value(keys::LOGIN_SHELL, defaults.login_shell.as_str());
        record.set_value(keys::HOME_DIRECTORY, home);
        Ok(record)
    }

    /// A group record named `name` with the next free gid. Nothing is stored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for a bad name.
    pub fn new_group(&self, name: &str) -> Result<AttributeRecord> {
        self.validate_name(EntityKind::Group, name)?;
        let gid = self.groups.next_free_id(self.config.defaults.first_gid)?;

        let mut record = AttributeRecord::named(EntityKind::Group, name);
        record.set_value(keys::GID_NUMBER, id_value(keys::GID_NUMBER, gid)?);
        Ok(record)
    }

    // ========================================================================
    // Lookups
    // ========================================================================

    /// Merged entry named `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] or [`Error::Module`]; a miss is `Ok(None)`.
    pub fn lookup_by_name(&self, kind: EntityKind, name: &str) -> Result<Option<AttributeRecord>> {
        self.dispatcher(kind).lookup_by_name(name)
    }

    /// Merged entry with numeric id `id`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] or [`Error::Module`]; a miss is `Ok(None)`.
    pub fn lookup_by_id(&self, kind: EntityKind, id: u64) -> Result<Option<AttributeRecord>> {
        self.dispatcher(kind).lookup_by_id(id)
    }

    /// Names matching the glob `pattern`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for a malformed pattern.
    pub fn enumerate(&self, kind: EntityKind, pattern: &str) -> Result<Vec<String>> {
        self.dispatcher(kind).enumerate(&parse_pattern(pattern)?)
    }

    /// Merged entries whose names match the glob `pattern`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for a malformed pattern.
    pub fn enumerate_full(&self, kind: EntityKind, pattern: &str) -> Result<Vec<AttributeRecord>> {
        self.dispatcher(kind).enumerate_full(&parse_pattern(pattern)?)
    }

    /// Users whose primary group is `group_name`, then users listed as its
    /// members, without repeats.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the group does not exist.
    pub fn users_in_group(&self, group_name: &str) -> Result<Vec<String>> {
        let group = self
            .groups
            .lookup_by_name(group_name)?
            .ok_or_else(|| Error::not_found(EntityKind::Group.as_str(), group_name))?;
        let gid = group.id().map_err(|e| Error::validation(e.to_string()))?;

        let mut names: Vec<String> = Vec::new();
        for user in self.users.enumerate_full(&NamePattern::any())? {
            if primary_gid(&user) == Some(gid) {
                if let Ok(name) = user.name() {
                    names.push(name.to_string());
                }
            }
        }
        for member in group.texts(keys::MEMBER_UID).unwrap_or_default() {
            if !names.iter().any(|n| n == member) {
                names.push(member.to_string());
            }
        }
        Ok(names)
    }

    /// Groups that are `user_name`'s primary group or list it as a member.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the user does not exist.
    pub fn groups_of_user(&self, user_name: &str) -> Result<Vec<String>> {
        let user = self
            .users
            .lookup_by_name(user_name)?
            .ok_or_else(|| Error::not_found(EntityKind::User.as_str(), user_name))?;
        let gid = primary_gid(&user);

        Ok(self
            .groups
            .enumerate_full(&NamePattern::any())?
            .iter()
            .filter(|group| {
                group.id().ok() == gid
                    || group
                        .texts(keys::MEMBER_UID)
                        .is_ok_and(|members| members.contains(&user_name))
            })
            .filter_map(|group| group.name().ok().map(str::to_string))
            .collect())
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Stores `record` in every configured module for its kind.
    ///
    /// On success `record` holds what was stored, module defaults included.
    ///
    /// # Errors
    ///
    /// See [`Dispatcher::add`].
    pub fn add(&self, record: &mut AttributeRecord) -> Result<()> {
        *record = self.dispatcher(record.kind()).add(record)?;
        Ok(())
    }

    /// Replaces the stored entry `original` with `record`.
    ///
    /// # Errors
    ///
    /// See [`Dispatcher::modify`].
    pub fn modify(&self, original: &AttributeRecord, record: &mut AttributeRecord) -> Result<()> {
        self.dispatcher(record.kind()).modify(original, record)?;
        self.refresh(record)
    }

    /// Removes the entry from every module holding it.
    ///
    /// # Errors
    ///
    /// See [`Dispatcher::delete`].
    pub fn delete(&self, record: &AttributeRecord) -> Result<()> {
        self.dispatcher(record.kind()).delete(record)
    }

    /// Whether the entry's credential is locked.
    ///
    /// # Errors
    ///
    /// See [`Dispatcher::is_locked`].
    pub fn is_locked(&self, record: &AttributeRecord) -> Result<bool> {
        self.dispatcher(record.kind()).is_locked(record)
    }

    /// Locks the entry's credential.
    ///
    /// # Errors
    ///
    /// See [`Dispatcher::lock`].
    pub fn lock(&self, record: &mut AttributeRecord) -> Result<()> {
        self.dispatcher(record.kind()).lock(record)?;
        self.refresh(record)
    }

    /// Unlocks the entry's credential.
    ///
    /// # Errors
    ///
    /// See [`Dispatcher::unlock`].
    pub fn unlock(&self, record: &mut AttributeRecord, allow_empty: bool) -> Result<()> {
        self.dispatcher(record.kind()).unlock(record, allow_empty)?;
        self.refresh(record)
    }

    /// Sets the entry's password.
    ///
    /// # Errors
    ///
    /// See [`Dispatcher::set_password`].
    pub fn set_password(
        &self,
        record: &mut AttributeRecord,
        plaintext: &str,
        is_prehashed: bool,
    ) -> Result<()> {
        self.dispatcher(record.kind())
            .set_password(record, plaintext, is_prehashed)?;
        self.refresh(record)
    }

    /// Clears the entry's password, keeping its lock state.
    ///
    /// # Errors
    ///
    /// See [`Dispatcher::remove_password`].
    pub fn remove_password(&self, record: &mut AttributeRecord) -> Result<()> {
        self.dispatcher(record.kind()).remove_password(record)?;
        self.refresh(record)
    }

    // ========================================================================
    // Home directories
    // ========================================================================

    /// Creates `user`'s home directory from the configured skeleton, owned
    /// by the user's uid and primary gid. Returns the directory's path.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] when `user` is not a user or lacks a
    /// home directory, uid or gid, and [`Error::HomeDirectory`] when the
    /// tree cannot be created.
    pub fn create_home(&self, user: &AttributeRecord) -> Result<PathBuf> {
        let path = home_of(user)?;
        let home = &self.config.home;
        home::populate(&home.skeleton, &path, owner_of(user)?, home.mode)?;
        Ok(path)
    }

    /// Moves the home directory `original` names to the one `user` names.
    /// Nothing happens when both name the same path.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for records without a home directory
    /// and [`Error::HomeDirectory`] when the move fails.
    pub fn move_home(&self, original: &AttributeRecord, user: &AttributeRecord) -> Result<()> {
        let old = home_of(original)?;
        let new = home_of(user)?;
        if old == new {
            return Ok(());
        }
        home::relocate(&old, &new)
    }

    /// Removes `user`'s home directory tree.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for a record without a home directory
    /// and [`Error::HomeDirectory`] when the tree is missing or cannot be
    /// removed.
    pub fn remove_home(&self, user: &AttributeRecord) -> Result<()> {
        home::remove(&home_of(user)?)
    }

    /// [`add`](Self::add) followed by [`create_home`](Self::create_home).
    /// The account is kept when creating the directory fails.
    ///
    /// # Errors
    ///
    /// See [`Dispatcher::add`] and [`AdminSession::create_home`].
    pub fn add_creating_home(&self, record: &mut AttributeRecord) -> Result<PathBuf> {
        self.add(record)?;
        self.create_home(record)
    }

    /// [`modify`](Self::modify) followed by [`move_home`](Self::move_home)
    /// from `original`'s directory to the stored one.
    ///
    /// # Errors
    ///
    /// See [`Dispatcher::modify`] and [`AdminSession::move_home`].
    pub fn modify_moving_home(
        &self,
        original: &AttributeRecord,
        record: &mut AttributeRecord,
    ) -> Result<()> {
        self.modify(original, record)?;
        self.move_home(original, record)
    }

    /// [`delete`](Self::delete) followed by [`remove_home`](Self::remove_home).
    ///
    /// # Errors
    ///
    /// See [`Dispatcher::delete`] and [`AdminSession::remove_home`].
    pub fn delete_removing_home(&self, record: &AttributeRecord) -> Result<()> {
        self.delete(record)?;
        self.remove_home(record)
    }

    /// Valid login shells from the configured shells file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the file exists but cannot be read.
    pub fn user_shells(&self) -> Result<Vec<String>> {
        home::login_shells(&self.config.home.shells_file)
    }

    fn refresh(&self, record: &mut AttributeRecord) -> Result<()> {
        let name = record.name().map_err(|e| Error::validation(e.to_string()))?;
        if let Some(stored) = self.dispatcher(record.kind()).lookup_by_name(name)? {
            *record = stored;
        }
        Ok(())
    }

    fn validate_name(&self, kind: EntityKind, name: &str) -> Result<()> {
        self.validator
            .validate(name)
            .map_err(|e| Error::validation(format!("invalid {kind} name '{name}': {e}")))
    }
}

// ============================================================================
// Module construction
// ============================================================================

fn build_module(
    name: &str,
    config: &AdminConfig,
    hasher: &Arc<dyn CredentialHasher>,
    prompter: &dyn Prompter,
    connector: &dyn DirectoryConnector,
) -> Result<SharedModule> {
    match name {
        ua_storage_files::MODULE_NAME => Ok(Arc::new(FilesModule::new(
            &config.files,
            &config.defaults,
            Arc::clone(hasher),
        ))),
        ua_directory::MODULE_NAME => {
            let directory = prompt_directory(&config.directory, prompter)?;
            let module = DirectoryModule::connect(
                directory,
                &config.defaults,
                connector,
                Arc::clone(hasher),
            )
            .map_err(directory_error)?;
            Ok(Arc::new(module))
        }
        other => Err(Error::config(format!("unknown module '{other}'"))),
    }
}

/// Asks for the connection settings, offering the configured values as
/// defaults. The bind password has no default.
fn prompt_directory(section: &DirectorySection, prompter: &dyn Prompter) -> Result<DirectoryConfig> {
    let mut prompts = vec![
        Prompt::new(prompt::LDAP_SERVER, "Directory server URL", true).with_default(&section.url),
        Prompt::new(prompt::LDAP_BASE_DN, "Directory base DN", true).with_default(&section.base_dn),
        Prompt::new(prompt::LDAP_BIND_DN, "Directory bind DN", true).with_default(&section.bind_dn),
        Prompt::new(prompt::LDAP_PASSWORD, "Directory bind password", false),
    ];
    prompter.prompt(&mut prompts)?;

    let answer = |key: &str| -> Result<String> {
        prompts
            .iter()
            .find(|p| p.key == key)
            .ok_or_else(|| Error::config(format!("prompt '{key}' was dropped")))
            .and_then(|p| p.answered().map(str::to_string))
    };
    let mut answered = section.clone();
    answered.url = answer(prompt::LDAP_SERVER)?;
    answered.base_dn = answer(prompt::LDAP_BASE_DN)?;
    answered.bind_dn = answer(prompt::LDAP_BIND_DN)?;
    let password = answer(prompt::LDAP_PASSWORD)?;

    DirectoryConfig::from_section(&answered, password).map_err(directory_error)
}

fn directory_error(err: DirectoryError) -> Error {
    match err {
        DirectoryError::Configuration(_) | DirectoryError::InsecureProtocol => {
            Error::config(err.to_string())
        }
        other => Error::module(ua_directory::MODULE_NAME, Vec::new(), other.to_string()),
    }
}

fn parse_pattern(pattern: &str) -> Result<NamePattern> {
    NamePattern::new(pattern).map_err(|e| Error::validation(e.to_string()))
}

fn id_value(key: &str, id: u64) -> Result<i64> {
    i64::try_from(id).map_err(|_| Error::validation(format!("{key} {id} is out of range")))
}

fn home_of(user: &AttributeRecord) -> Result<PathBuf> {
    if user.kind() != EntityKind::User {
        return Err(Error::validation("only users have home directories"));
    }
    match user.text(keys::HOME_DIRECTORY) {
        Ok(home) if !home.is_empty() => Ok(PathBuf::from(home)),
        _ => Err(Error::validation(format!(
            "user '{}' has no {}",
            user.name().unwrap_or_default(),
            keys::HOME_DIRECTORY
        ))),
    }
}

fn owner_of(user: &AttributeRecord) -> Result<Owner> {
    let uid = user
        .id()
        .ok()
        .and_then(|uid| u32::try_from(uid).ok())
        .ok_or_else(|| Error::validation(format!("{} does not fit a file owner", keys::UID_NUMBER)))?;
    let gid = user
        .int(keys::GID_NUMBER)
        .ok()
        .and_then(|gid| u32::try_from(gid).ok())
        .ok_or_else(|| Error::validation(format!("{} does not fit a file group", keys::GID_NUMBER)))?;
    Ok(Owner { uid, gid })
}

fn primary_gid(user: &AttributeRecord) -> Option<u64> {
    user.int(keys::GID_NUMBER)
        .ok()
        .and_then(|gid| u64::try_from(gid).ok())
}
