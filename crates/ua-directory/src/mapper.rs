//! Mapping between attribute records and directory entries.
//!
//! Record keys are POSIX schema attribute names, so the mapping is mostly a
//! change of value type. Attribute names from the server are matched to the
//! key catalogue case-insensitively. The shadow password key has no
//! directory counterpart and is never written.

use std::collections::BTreeMap;

use ua_model::{keys, AttrValue, AttributeRecord, EntityKind};

use crate::client::{DirEntry, Modification};

const CATALOGUE: [&str; 20] = [
    keys::USER_NAME,
    keys::GROUP_NAME,
    keys::UID_NUMBER,
    keys::GID_NUMBER,
    keys::OBJECT_CLASS,
    keys::USER_PASSWORD,
    keys::GECOS,
    keys::HOME_DIRECTORY,
    keys::LOGIN_SHELL,
    keys::SHADOW_PASSWORD,
    keys::SHADOW_LAST_CHANGE,
    keys::SHADOW_MIN,
    keys::SHADOW_MAX,
    keys::SHADOW_WARNING,
    keys::SHADOW_INACTIVE,
    keys::SHADOW_EXPIRE,
    keys::SHADOW_FLAG,
    keys::MEMBER_UID,
    keys::ADMINISTRATOR_UID,
    "description",
];

/// Catalogue spelling of `name`, or `name` itself if unknown.
#[must_use]
pub fn canonical_key(name: &str) -> &str {
    CATALOGUE
        .iter()
        .find(|k| k.eq_ignore_ascii_case(name))
        .copied()
        .unwrap_or(name)
}

fn is_unmapped(key: &str) -> bool {
    key.eq_ignore_ascii_case(keys::SHADOW_PASSWORD)
}

/// Converts a directory entry into a record. The primary name comes first.
#[must_use]
pub fn entry_to_record(kind: EntityKind, entry: &DirEntry) -> AttributeRecord {
    let mut record = AttributeRecord::new(kind);
    let name_key = kind.name_key();
    if let Some(values) = entry.get_attrs(name_key) {
        record.set(name_key, values.iter().map(AttrValue::text).collect());
    }

    for (name, values) in &entry.attributes {
        let key = canonical_key(name);
        if key == name_key || is_unmapped(key) {
            continue;
        }
        record.set(
            key,
            values.iter().map(|v| keys::parse_value(key, v)).collect(),
        );
    }
    record
}

/// Attribute map for `record`. Empty attributes are left out.
#[must_use]
pub fn record_attributes(record: &AttributeRecord) -> BTreeMap<String, Vec<String>> {
    record
        .iter()
        .filter(|(key, values)| !is_unmapped(key) && !values.is_empty())
        .map(|(key, values)| {
            (
                key.to_string(),
                values.iter().map(ToString::to_string).collect(),
            )
        })
        .collect()
}

/// Builds the entry to add for `record` at `dn`.
#[must_use]
pub fn record_to_entry(dn: impl Into<String>, record: &AttributeRecord) -> DirEntry {
    DirEntry {
        dn: dn.into(),
        attributes: record_attributes(record),
    }
}

/// Changes turning `stored` into `record`.
///
/// Keys in `skip` are left alone. Attributes present in `stored` but absent
/// from `record` are deleted, except object classes.
#[must_use]
pub fn diff(stored: &DirEntry, record: &AttributeRecord, skip: &[&str]) -> Vec<Modification> {
    let skipped = |key: &str| skip.iter().any(|s| s.eq_ignore_ascii_case(key));
    let wanted = record_attributes(record);
    let mut changes = Vec::new();

    for (key, values) in &wanted {
        if skipped(key) {
            continue;
        }
        if stored.get_attrs(key) != Some(values) {
            changes.push(Modification::Replace(key.clone(), values.clone()));
        }
    }

    for key in stored.attributes.keys() {
        let canonical = canonical_key(key);
        if skipped(canonical)
            || is_unmapped(canonical)
            || canonical == keys::OBJECT_CLASS
            || wanted.keys().any(|w| w.eq_ignore_ascii_case(key))
        {
            continue;
        }
        changes.push(Modification::Delete(key.clone()));
    }
    changes
}
