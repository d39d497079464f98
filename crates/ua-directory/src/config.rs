//! Directory module configuration.
//!
//! Only LDAPS (TLS from connection start) is accepted. Plain `ldap://` URLs
//! are rejected before any connection attempt.

use std::time::Duration;

use serde::Serialize;
use ua_core::config::DirectorySection;
use ua_model::EntityKind;

use crate::error::{DirectoryError, DirectoryResult};

/// Settings for one directory connection.
#[derive(Debug, Clone, Serialize)]
pub struct DirectoryConfig {
    /// Server URL.
    pub url: String,
    /// Suffix under which users and groups live.
    pub base_dn: String,
    /// Identity used to bind.
    pub bind_dn: String,
    /// Bind password.
    #[serde(skip_serializing)]
    pub bind_password: String,
    /// User container relative to `base_dn`.
    pub users_ou: String,
    /// Group container relative to `base_dn`.
    pub groups_ou: String,
    /// Object classes written on new users.
    pub user_object_classes: Vec<String>,
    /// Object classes written on new groups.
    pub group_object_classes: Vec<String>,
    /// Connect and operation timeout.
    pub timeout: Duration,
}

impl DirectoryConfig {
    /// Builds a configuration from the `[directory]` section and a bind
    /// password obtained elsewhere.
    ///
    /// # Errors
    ///
    /// Returns an error when the result fails [`DirectoryConfig::validate`].
    pub fn from_section(
        section: &DirectorySection,
        bind_password: impl Into<String>,
    ) -> DirectoryResult<Self> {
        let config = Self {
            url: section.url.clone(),
            base_dn: section.base_dn.clone(),
            bind_dn: section.bind_dn.clone(),
            bind_password: bind_password.into(),
            users_ou: section.users_ou.clone(),
            groups_ou: section.groups_ou.clone(),
            user_object_classes: section.user_object_classes.clone(),
            group_object_classes: section.group_object_classes.clone(),
            timeout: Duration::from_secs(section.timeout_secs),
        };
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::InsecureProtocol`] for non-LDAPS URLs and a
    /// configuration error for missing DNs.
    pub fn validate(&self) -> DirectoryResult<()> {
        validate_ldaps_url(&self.url)?;
        if self.base_dn.trim().is_empty() {
            return Err(DirectoryError::config("base DN is required"));
        }
        if self.bind_dn.trim().is_empty() {
            return Err(DirectoryError::config("bind DN is required"));
        }
        if self.timeout.is_zero() {
            return Err(DirectoryError::config("timeout must be positive"));
        }
        Ok(())
    }

    /// Container DN for `kind`.
    #[must_use]
    pub fn container(&self, kind: EntityKind) -> String {
        let ou = match kind {
            EntityKind::User => &self.users_ou,
            EntityKind::Group => &self.groups_ou,
        };
        if ou.is_empty() {
            self.base_dn.clone()
        } else {
            format!("{ou},{}", self.base_dn)
        }
    }

    /// Relative DN of the entry named `name`.
    #[must_use]
    pub fn rdn(kind: EntityKind, name: &str) -> String {
        format!("{}={}", kind.name_key(), escape_dn_value(name))
    }

    /// Full DN of the entry named `name`.
    #[must_use]
    pub fn entry_dn(&self, kind: EntityKind, name: &str) -> String {
        format!("{},{}", Self::rdn(kind, name), self.container(kind))
    }

    /// Object classes written on new entries of `kind`.
    #[must_use]
    pub fn object_classes(&self, kind: EntityKind) -> &[String] {
        match kind {
            EntityKind::User => &self.user_object_classes,
            EntityKind::Group => &self.group_object_classes,
        }
    }
}

fn validate_ldaps_url(url: &str) -> DirectoryResult<()> {
    let lower = url.to_lowercase();
    if !lower.starts_with("ldaps://") {
        return Err(DirectoryError::InsecureProtocol);
    }
    if lower.len() <= "ldaps://".len() {
        return Err(DirectoryError::config("URL has no host"));
    }
    Ok(())
}

/// Escapes a value for use inside a search filter (RFC 4515).
#[must_use]
pub fn escape_filter_value(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => result.push_str("\\5c"),
            '*' => result.push_str("\\2a"),
            '(' => result.push_str("\\28"),
            ')' => result.push_str("\\29"),
            '\0' => result.push_str("\\00"),
            _ => result.push(c),
        }
    }
    result
}

/// Escapes a value for use inside a DN (RFC 4514).
#[must_use]
pub fn escape_dn_value(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    let last = value.chars().count().saturating_sub(1);
    for (i, c) in value.chars().enumerate() {
        match c {
            ',' | '+' | '"' | '\\' | '<' | '>' | ';' | '=' => {
                result.push('\\');
                result.push(c);
            }
            '#' if i == 0 => result.push_str("\\#"),
            ' ' if i == 0 || i == last => result.push_str("\\ "),
            '\0' => result.push_str("\\00"),
            _ => result.push(c),
        }
    }
    result
}
