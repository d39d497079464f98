//! Configuration for useradm.
//!
//! Loaded from a TOML file; every section falls back to its defaults so an
//! empty file describes a files-only setup rooted at `/etc`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Main configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Ordered module lists per entry kind.
    pub modules: ModulesConfig,
    /// Defaults used when building new entries.
    pub defaults: DefaultsConfig,
    /// Flat-file module settings.
    pub files: FilesConfig,
    /// Directory-service module settings.
    pub directory: DirectorySection,
    /// Home directory handling.
    pub home: HomeConfig,
}

/// Ordered backend module names for each entry kind.
///
/// Order matters: later modules win when several store the same key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModulesConfig {
    /// Modules holding user entries.
    pub user: Vec<String>,
    /// Modules holding group entries.
    pub group: Vec<String>,
}

impl Default for ModulesConfig {
    fn default() -> Self {
        Self {
            user: vec!["files".to_string()],
            group: vec!["files".to_string()],
        }
    }
}

/// Defaults applied when a new entry is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    /// Longest accepted user or group name.
    pub max_name_length: usize,
    /// Lowest uid handed out by id allocation.
    pub first_uid: u64,
    /// Lowest gid handed out by id allocation.
    pub first_gid: u64,
    /// Primary gid given to new users.
    pub user_gid: u64,
    /// Login shell given to new users.
    pub login_shell: String,
    /// Home directory template; `%n` is replaced by the user name.
    pub home_directory: String,
    /// Argon2 memory cost in KiB.
    pub hash_memory_kib: u32,
    /// Argon2 iterations.
    pub hash_time_cost: u32,
    /// Argon2 lanes.
    pub hash_parallelism: u32,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            max_name_length: 32,
            first_uid: 1000,
            first_gid: 1000,
            user_gid: 100,
            login_shell: "/bin/bash".to_string(),
            home_directory: "/home/%n".to_string(),
            hash_memory_kib: 19 * 1024,
            hash_time_cost: 2,
            hash_parallelism: 1,
        }
    }
}

impl DefaultsConfig {
    /// Expands the home directory template for `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for `.` and `..`, which would point the
    /// home directory at the template's parent.
    pub fn home_for(&self, name: &str) -> Result<String> {
        if name == "." || name == ".." {
            return Err(Error::validation(format!(
                "cannot derive a home directory from the name '{name}'"
            )));
        }
        Ok(self.home_directory.replace("%n", name))
    }
}

/// Flat-file module settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilesConfig {
    /// Directory holding `passwd`, `group` and their shadow companions.
    pub directory: PathBuf,
    /// Whether credentials live in `shadow`/`gshadow`.
    pub shadow: bool,
    /// Whether a `<file>-` backup is written before each change.
    pub backup: bool,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("/etc"),
            shadow: true,
            backup: true,
        }
    }
}

/// Home directory handling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HomeConfig {
    /// Tree copied into newly created home directories.
    pub skeleton: PathBuf,
    /// Permission bits of a new home directory.
    pub mode: u32,
    /// List of valid login shells.
    pub shells_file: PathBuf,
}

impl Default for HomeConfig {
    fn default() -> Self {
        Self {
            skeleton: PathBuf::from("/etc/skel"),
            mode: 0o700,
            shells_file: PathBuf::from("/etc/shells"),
        }
    }
}

/// Directory-service module settings.
///
/// The bind password is not part of the file. It comes from the prompt
/// collaborator when a session opens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectorySection {
    /// Server URL (`ldaps://` only).
    pub url: String,
    /// Suffix under which users and groups live.
    pub base_dn: String,
    /// Identity used to bind.
    pub bind_dn: String,
    /// Container for users, relative to `base_dn`.
    pub users_ou: String,
    /// Container for groups, relative to `base_dn`.
    pub groups_ou: String,
    /// Object classes written on new users.
    pub user_object_classes: Vec<String>,
    /// Object classes written on new groups.
    pub group_object_classes: Vec<String>,
    /// Connect and operation timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for DirectorySection {
    fn default() -> Self {
        Self {
            url: "ldaps://localhost".to_string(),
            base_dn: "dc=example,dc=com".to_string(),
            bind_dn: "cn=manager,dc=example,dc=com".to_string(),
            users_ou: "ou=People".to_string(),
            groups_ou: "ou=Group".to_string(),
            user_object_classes: vec![
                "account".to_string(),
                "posixAccount".to_string(),
                "shadowAccount".to_string(),
            ],
            group_object_classes: vec!["posixGroup".to_string()],
            timeout_secs: 10,
        }
    }
}

impl AdminConfig {
    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the text is not valid TOML for this
    /// structure or fails [`AdminConfig::validate`].
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)
            .map_err(|e| Error::config(format!("failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::config(format!("cannot read {}: {e}", path.display())))?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Self::from_toml_str(&text)
    }

    /// Loads `path` when it exists, otherwise returns the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when an existing file is unreadable or invalid.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!(path = %path.display(), "no configuration file, using defaults");
            Ok(Self::default())
        }
    }

    /// Serializes the configuration back to TOML.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if serialization fails.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| Error::config(format!("failed to serialize config: {e}")))
    }

    /// Checks values that serde cannot.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] describing the first invalid value.
    pub fn validate(&self) -> Result<()> {
        if self.defaults.max_name_length == 0 {
            return Err(Error::config("defaults.max_name_length must be positive"));
        }
        if self.defaults.home_directory.is_empty() {
            return Err(Error::config("defaults.home_directory cannot be empty"));
        }
        if self.defaults.login_shell.is_empty() {
            return Err(Error::config("defaults.login_shell cannot be empty"));
        }
        if self.home.mode > 0o7777 {
            return Err(Error::config(format!(
                "home.mode {:o} is not a permission mode",
                self.home.mode
            )));
        }
        for name in self.modules.user.iter().chain(&self.modules.group) {
            if name.trim().is_empty() {
                return Err(Error::config("module names cannot be empty"));
            }
        }
        Ok(())
    }
}
