//! LDAPS connections through ldap3.
//!
//! All connections use LDAPS (TLS from connection start). STARTTLS and plain
//! LDAP are refused by [`DirectoryConfig::validate`] before connecting.

use std::collections::HashSet;
use std::time::Duration;

use ldap3::{LdapConn, LdapConnSettings, Mod, Scope, SearchEntry};

use crate::client::{DirEntry, DirectoryClient, DirectoryConnector, Modification, SearchFilter};
use crate::config::DirectoryConfig;
use crate::error::{DirectoryError, DirectoryResult};

/// A bound ldap3 connection.
pub struct Ldap3Client {
    ldap: LdapConn,
    timeout: Duration,
}

impl std::fmt::Debug for Ldap3Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ldap3Client")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl Ldap3Client {
    /// Connects to `config.url` and binds as `config.bind_dn`.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::InsecureProtocol`] for non-LDAPS URLs, a
    /// connection error if the server is unreachable, or a bind error if the
    /// credentials are rejected.
    pub fn connect(config: &DirectoryConfig) -> DirectoryResult<Self> {
        config.validate()?;

        let settings = LdapConnSettings::new().set_conn_timeout(config.timeout);
        let mut ldap = LdapConn::with_settings(settings, &config.url)
            .map_err(|e| DirectoryError::connection(e.to_string()))?;

        ldap.with_timeout(config.timeout)
            .simple_bind(&config.bind_dn, &config.bind_password)
            .map_err(DirectoryError::from_ldap)?
            .success()
            .map_err(DirectoryError::from_ldap)?;

        tracing::debug!(url = %config.url, bind_dn = %config.bind_dn, "bound to directory");
        Ok(Self {
            ldap,
            timeout: config.timeout,
        })
    }
}

fn value_set(values: &[String]) -> HashSet<String> {
    values.iter().cloned().collect()
}

impl DirectoryClient for Ldap3Client {
    fn search(&mut self, base: &str, filter: &SearchFilter) -> DirectoryResult<Vec<DirEntry>> {
        let (entries, _) = self
            .ldap
            .with_timeout(self.timeout)
            .search(base, Scope::OneLevel, &filter.to_ldap_string(), vec!["*"])
            .map_err(DirectoryError::from_ldap)?
            .success()
            .map_err(DirectoryError::from_ldap)?;

        Ok(entries
            .into_iter()
            .map(|raw| {
                let entry = SearchEntry::construct(raw);
                DirEntry {
                    dn: entry.dn,
                    attributes: entry.attrs.into_iter().collect(),
                }
            })
            .collect())
    }

    fn add(&mut self, entry: &DirEntry) -> DirectoryResult<()> {
        let attrs: Vec<(String, HashSet<String>)> = entry
            .attributes
            .iter()
            .filter(|(_, v)| !v.is_empty())
            .map(|(k, v)| (k.clone(), value_set(v)))
            .collect();
        self.ldap
            .with_timeout(self.timeout)
            .add(&entry.dn, attrs)
            .map_err(DirectoryError::from_ldap)?
            .success()
            .map_err(DirectoryError::from_ldap)?;
        Ok(())
    }

    fn modify(&mut self, dn: &str, changes: &[Modification]) -> DirectoryResult<()> {
        let mods: Vec<Mod<String>> = changes
            .iter()
            .map(|change| match change {
                Modification::Replace(name, values) => Mod::Replace(name.clone(), value_set(values)),
                Modification::Delete(name) => Mod::Delete(name.clone(), HashSet::new()),
            })
            .collect();
        self.ldap
            .with_timeout(self.timeout)
            .modify(dn, mods)
            .map_err(DirectoryError::from_ldap)?
            .success()
            .map_err(DirectoryError::from_ldap)?;
        Ok(())
    }

    fn rename(&mut self, dn: &str, new_rdn: &str) -> DirectoryResult<()> {
        self.ldap
            .with_timeout(self.timeout)
            .modifydn(dn, new_rdn, true, None)
            .map_err(DirectoryError::from_ldap)?
            .success()
            .map_err(DirectoryError::from_ldap)?;
        Ok(())
    }

    fn delete(&mut self, dn: &str) -> DirectoryResult<()> {
        self.ldap
            .with_timeout(self.timeout)
            .delete(dn)
            .map_err(DirectoryError::from_ldap)?
            .success()
            .map_err(DirectoryError::from_ldap)?;
        Ok(())
    }

    fn unbind(&mut self) -> DirectoryResult<()> {
        self.ldap.unbind().map_err(DirectoryError::from_ldap)
    }
}

/// Opens [`Ldap3Client`] connections.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ldap3Connector;

impl DirectoryConnector for Ldap3Connector {
    fn connect(&self, config: &DirectoryConfig) -> DirectoryResult<Box<dyn DirectoryClient>> {
        Ok(Box::new(Ldap3Client::connect(config)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ua_core::config::DirectorySection;

    #[test]
    fn refuses_plain_ldap_before_connecting() {
        let mut config = DirectoryConfig::from_section(&DirectorySection::default(), "pw").unwrap();
        config.url = "ldap://127.0.0.1:1".to_string();

        let err = Ldap3Connector.connect(&config).err().unwrap();
        assert!(matches!(err, DirectoryError::InsecureProtocol));
    }
}
