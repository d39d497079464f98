//! In-memory directory.
//!
//! Behaves like a single-server directory for the operations
//! [`DirectoryClient`] exposes. Clones share one tree, so a test can keep a
//! handle while a module owns another.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::client::{DirEntry, DirectoryClient, DirectoryConnector, Modification, SearchFilter};
use crate::config::DirectoryConfig;
use crate::error::{DirectoryError, DirectoryResult};

#[derive(Debug, Default)]
struct State {
    entries: BTreeMap<String, DirEntry>,
    password: Option<String>,
    fail_writes: bool,
    binds: usize,
}

/// A directory tree held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryDirectory {
    state: Arc<Mutex<State>>,
}

impl MemoryDirectory {
    /// Creates an empty directory that accepts any bind.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty directory that only accepts `password` on bind.
    #[must_use]
    pub fn with_password(password: impl Into<String>) -> Self {
        let directory = Self::new();
        directory.state.lock().password = Some(password.into());
        directory
    }

    /// Stores `entry`, replacing any entry with the same DN.
    pub fn insert(&self, entry: DirEntry) {
        self.state.lock().entries.insert(normalize(&entry.dn), entry);
    }

    /// Entry at `dn`, if any.
    #[must_use]
    pub fn get(&self, dn: &str) -> Option<DirEntry> {
        self.state.lock().entries.get(&normalize(dn)).cloned()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    /// Checks whether the tree is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.lock().entries.is_empty()
    }

    /// Makes every later write fail until turned off again.
    pub fn fail_writes(&self, fail: bool) {
        self.state.lock().fail_writes = fail;
    }

    /// Number of successful binds so far.
    #[must_use]
    pub fn bind_count(&self) -> usize {
        self.state.lock().binds
    }

    fn writable(state: &State) -> DirectoryResult<()> {
        if state.fail_writes {
            return Err(DirectoryError::protocol("server is unwilling to perform"));
        }
        Ok(())
    }
}

fn normalize(dn: &str) -> String {
    dn.to_ascii_lowercase()
}

/// Splits `dn` at its first unescaped comma.
fn split_rdn(dn: &str) -> (&str, &str) {
    let mut escaped = false;
    for (i, c) in dn.char_indices() {
        match c {
            '\\' if !escaped => escaped = true,
            ',' if !escaped => return (&dn[..i], &dn[i + 1..]),
            _ => escaped = false,
        }
    }
    (dn, "")
}

/// Splits an RDN into attribute and unescaped value.
fn rdn_parts(rdn: &str) -> (&str, String) {
    let (attr, raw) = rdn.split_once('=').unwrap_or((rdn, ""));
    let mut value = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                value.push(next);
            }
        } else {
            value.push(c);
        }
    }
    (attr, value)
}

fn attribute_key(entry: &DirEntry, name: &str) -> Option<String> {
    entry
        .attributes
        .keys()
        .find(|k| k.eq_ignore_ascii_case(name))
        .cloned()
}

impl DirectoryClient for MemoryDirectory {
    fn search(&mut self, base: &str, filter: &SearchFilter) -> DirectoryResult<Vec<DirEntry>> {
        let base = normalize(base);
        let state = self.state.lock();
        Ok(state
            .entries
            .values()
            .filter(|e| normalize(split_rdn(&e.dn).1) == base && filter.matches(e))
            .cloned()
            .collect())
    }

    fn add(&mut self, entry: &DirEntry) -> DirectoryResult<()> {
        let mut state = self.state.lock();
        Self::writable(&state)?;
        let key = normalize(&entry.dn);
        if state.entries.contains_key(&key) {
            return Err(DirectoryError::AlreadyExists(entry.dn.clone()));
        }
        state.entries.insert(key, entry.clone());
        Ok(())
    }

    fn modify(&mut self, dn: &str, changes: &[Modification]) -> DirectoryResult<()> {
        let mut state = self.state.lock();
        Self::writable(&state)?;
        let entry = state
            .entries
            .get_mut(&normalize(dn))
            .ok_or_else(|| DirectoryError::NoSuchEntry(dn.to_string()))?;

        for change in changes {
            match change {
                Modification::Replace(name, values) => {
                    if let Some(existing) = attribute_key(entry, name) {
                        entry.attributes.remove(&existing);
                    }
                    if !values.is_empty() {
                        entry.attributes.insert(name.clone(), values.clone());
                    }
                }
                Modification::Delete(name) => {
                    if let Some(existing) = attribute_key(entry, name) {
                        entry.attributes.remove(&existing);
                    }
                }
            }
        }
        Ok(())
    }

    fn rename(&mut self, dn: &str, new_rdn: &str) -> DirectoryResult<()> {
        let mut state = self.state.lock();
        Self::writable(&state)?;
        let (old_rdn, parent) = split_rdn(dn);
        let new_dn = format!("{new_rdn},{parent}");
        if state.entries.contains_key(&normalize(&new_dn)) {
            return Err(DirectoryError::AlreadyExists(new_dn));
        }
        let mut entry = state
            .entries
            .remove(&normalize(dn))
            .ok_or_else(|| DirectoryError::NoSuchEntry(dn.to_string()))?;

        let (old_attr, old_value) = rdn_parts(old_rdn);
        if let Some(key) = attribute_key(&entry, old_attr) {
            if let Some(values) = entry.attributes.get_mut(&key) {
                values.retain(|v| *v != old_value);
            }
        }
        let (new_attr, new_value) = rdn_parts(new_rdn);
        let key = attribute_key(&entry, new_attr).unwrap_or_else(|| new_attr.to_string());
        let values = entry.attributes.entry(key).or_default();
        if !values.contains(&new_value) {
            values.insert(0, new_value);
        }

        entry.dn = new_dn;
        state.entries.insert(normalize(&entry.dn), entry);
        Ok(())
    }

    fn delete(&mut self, dn: &str) -> DirectoryResult<()> {
        let mut state = self.state.lock();
        Self::writable(&state)?;
        state
            .entries
            .remove(&normalize(dn))
            .map(|_| ())
            .ok_or_else(|| DirectoryError::NoSuchEntry(dn.to_string()))
    }

    fn unbind(&mut self) -> DirectoryResult<()> {
        Ok(())
    }
}

impl DirectoryConnector for MemoryDirectory {
    fn connect(&self, config: &DirectoryConfig) -> DirectoryResult<Box<dyn DirectoryClient>> {
        config.validate()?;
        let mut state = self.state.lock();
        if state
            .password
            .as_ref()
            .is_some_and(|p| *p != config.bind_password)
        {
            return Err(DirectoryError::Bind("invalid credentials".to_string()));
        }
        state.binds += 1;
        Ok(Box::new(self.clone()))
    }
}
