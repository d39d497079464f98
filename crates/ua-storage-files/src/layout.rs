//! Line layouts of the colon-separated account files.

use ua_model::{keys, AttrValue, AttributeRecord, EntityKind};
use ua_storage::pattern::is_placeholder;
use ua_storage::{StorageError, StorageResult};

/// One colon-separated field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    /// Attribute key stored in this field.
    pub key: &'static str,
    /// Comma-separated list rather than a scalar.
    pub list: bool,
    /// Empty text is a value rather than an absent key.
    pub keep_empty: bool,
}

const fn scalar(key: &'static str) -> Field {
    Field {
        key,
        list: false,
        keep_empty: false,
    }
}

const fn kept(key: &'static str) -> Field {
    Field {
        key,
        list: false,
        keep_empty: true,
    }
}

const fn list(key: &'static str) -> Field {
    Field {
        key,
        list: true,
        keep_empty: false,
    }
}

/// Layout of one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    /// File name inside the configured directory.
    pub file: &'static str,
    /// Entry kind the file holds.
    pub kind: EntityKind,
    /// Fields in order; the first is the primary name.
    pub fields: &'static [Field],
    /// Index of the numeric id field, if the file has one.
    pub id_field: Option<usize>,
    /// Whether the file holds secrets.
    pub secret: bool,
}

/// `name:password:uid:gid:gecos:home:shell`
pub const PASSWD: Layout = Layout {
    file: "passwd",
    kind: EntityKind::User,
    fields: &[
        kept(keys::USER_NAME),
        kept(keys::USER_PASSWORD),
        kept(keys::UID_NUMBER),
        scalar(keys::GID_NUMBER),
        scalar(keys::GECOS),
        scalar(keys::HOME_DIRECTORY),
        scalar(keys::LOGIN_SHELL),
    ],
    id_field: Some(2),
    secret: false,
};

/// `name:password:lastchg:min:max:warn:inactive:expire:flag`
pub const SHADOW: Layout = Layout {
    file: "shadow",
    kind: EntityKind::User,
    fields: &[
        kept(keys::USER_NAME),
        kept(keys::SHADOW_PASSWORD),
        scalar(keys::SHADOW_LAST_CHANGE),
        scalar(keys::SHADOW_MIN),
        scalar(keys::SHADOW_MAX),
        scalar(keys::SHADOW_WARNING),
        scalar(keys::SHADOW_INACTIVE),
        scalar(keys::SHADOW_EXPIRE),
        scalar(keys::SHADOW_FLAG),
    ],
    id_field: None,
    secret: true,
};

/// `name:password:gid:members`
pub const GROUP: Layout = Layout {
    file: "group",
    kind: EntityKind::Group,
    fields: &[
        kept(keys::GROUP_NAME),
        kept(keys::USER_PASSWORD),
        kept(keys::GID_NUMBER),
        list(keys::MEMBER_UID),
    ],
    id_field: Some(2),
    secret: false,
};

/// `name:password:admins:members`
pub const GSHADOW: Layout = Layout {
    file: "gshadow",
    kind: EntityKind::Group,
    fields: &[
        kept(keys::GROUP_NAME),
        kept(keys::SHADOW_PASSWORD),
        list(keys::ADMINISTRATOR_UID),
        list(keys::MEMBER_UID),
    ],
    id_field: None,
    secret: true,
};

/// Lines kept verbatim on rewrite and never returned as entries.
#[must_use]
pub fn is_passthrough(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.is_empty() || trimmed.starts_with('#') || is_placeholder(trimmed)
}

/// Primary name of a line, or `None` for comments, blanks and placeholders.
#[must_use]
pub fn line_name(line: &str) -> Option<&str> {
    if is_passthrough(line) {
        return None;
    }
    line.split(':').next()
}

impl Layout {
    /// Parses one line. Returns `None` for lines that are not entries.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Corrupt`] when the field count is wrong or a
    /// required field is empty.
    pub fn parse(&self, line: &str) -> StorageResult<Option<AttributeRecord>> {
        if is_passthrough(line) {
            return Ok(None);
        }

        let parts: Vec<&str> = line.split(':').collect();
        if parts.len() != self.fields.len() {
            return Err(StorageError::corrupt(format!(
                "{}: expected {} fields, found {} in entry '{}'",
                self.file,
                self.fields.len(),
                parts.len(),
                parts[0]
            )));
        }

        let mut record = AttributeRecord::new(self.kind);
        for (field, raw) in self.fields.iter().zip(parts) {
            if field.list {
                let items: Vec<AttrValue> = raw
                    .split(',')
                    .filter(|s| !s.is_empty())
                    .map(AttrValue::text)
                    .collect();
                if !items.is_empty() {
                    record.set(field.key, items);
                }
            } else if !raw.is_empty() || field.keep_empty {
                record.set_value(field.key, keys::parse_value(field.key, raw));
            }
        }

        if record.name().map_or(true, str::is_empty) {
            return Err(StorageError::corrupt(format!("{}: entry without a name", self.file)));
        }
        if let Some(i) = self.id_field {
            let key = self.fields[i].key;
            if record.int(key).is_err() {
                return Err(StorageError::corrupt(format!(
                    "{}: entry '{}' has a non-numeric {key}",
                    self.file,
                    record.name().unwrap_or_default()
                )));
            }
        }
        Ok(Some(record))
    }

    /// Formats `record` as one line.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidData`] when a value contains a
    /// separator or a newline.
    pub fn format(&self, record: &AttributeRecord) -> StorageResult<String> {
        let mut parts = Vec::with_capacity(self.fields.len());
        for field in self.fields {
            let values = record.get(field.key).unwrap_or(&[]);
            if field.list {
                let mut items = Vec::with_capacity(values.len());
                for value in values {
                    let text = value.to_string();
                    check_value(self.file, field.key, &text, true)?;
                    items.push(text);
                }
                parts.push(items.join(","));
            } else {
                let text = values.first().map(ToString::to_string).unwrap_or_default();
                check_value(self.file, field.key, &text, false)?;
                parts.push(text);
            }
        }
        Ok(parts.join(":"))
    }
}

fn check_value(file: &str, key: &str, value: &str, in_list: bool) -> StorageResult<()> {
    let bad = value.contains(':') || value.contains('\n') || (in_list && value.contains(','));
    if bad {
        return Err(StorageError::invalid(format!(
            "{key} cannot be stored in {file}: value contains a separator"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_passwd_line() {
        let record = PASSWD
            .parse("alice:x:1000:100:Alice:/home/alice:/bin/bash")
            .unwrap()
            .unwrap();

        assert_eq!(record.name().unwrap(), "alice");
        assert_eq!(record.text(keys::USER_PASSWORD).unwrap(), "x");
        assert_eq!(record.id().unwrap(), 1000);
        assert_eq!(record.int(keys::GID_NUMBER).unwrap(), 100);
        assert_eq!(record.text(keys::LOGIN_SHELL).unwrap(), "/bin/bash");
    }

    #[test]
    fn empty_optional_fields_are_absent() {
        let record = SHADOW.parse("alice:!!:19000::::::").unwrap().unwrap();

        assert_eq!(record.text(keys::SHADOW_PASSWORD).unwrap(), "!!");
        assert_eq!(record.int(keys::SHADOW_LAST_CHANGE).unwrap(), 19000);
        assert!(!record.has(keys::SHADOW_MAX));
    }

    #[test]
    fn empty_password_is_kept() {
        let record = SHADOW.parse("bob::::::::").unwrap().unwrap();
        assert_eq!(record.text(keys::SHADOW_PASSWORD).unwrap(), "");
    }

    #[test]
    fn members_are_lists() {
        let record = GROUP.parse("staff:x:50:alice,bob").unwrap().unwrap();
        assert_eq!(record.texts(keys::MEMBER_UID).unwrap(), vec!["alice", "bob"]);

        let empty = GROUP.parse("empty:x:51:").unwrap().unwrap();
        assert!(!empty.has(keys::MEMBER_UID));
    }

    #[test]
    fn numeric_names_stay_text() {
        let record = GROUP.parse("077:x:77:").unwrap().unwrap();
        assert_eq!(record.name().unwrap(), "077");
    }

    #[test]
    fn placeholders_are_skipped() {
        assert!(PASSWD.parse("+").unwrap().is_none());
        assert!(PASSWD.parse("-bob").unwrap().is_none());
        assert!(PASSWD.parse("# comment").unwrap().is_none());
        assert!(PASSWD.parse("").unwrap().is_none());
        assert_eq!(line_name("+@admins"), None);
        assert_eq!(line_name("root:x:0:0::/root:/bin/sh"), Some("root"));
    }

    #[test]
    fn wrong_field_count_is_corrupt() {
        let err = PASSWD.parse("alice:x:1000").unwrap_err();
        assert!(matches!(err, StorageError::Corrupt(_)));
    }

    #[test]
    fn non_numeric_id_is_corrupt() {
        assert!(GROUP.parse("g:x:abc:").is_err());
    }

    #[test]
    fn format_round_trips() {
        let line = "staff:x:50:alice,bob";
        let record = GROUP.parse(line).unwrap().unwrap();
        assert_eq!(GROUP.format(&record).unwrap(), line);

        let shadow = "alice:$argon2id$v=19$m=64,t=1,p=1$c2FsdA$aGFzaA:19000:0:99999:7:::";
        let record = SHADOW.parse(shadow).unwrap().unwrap();
        assert_eq!(SHADOW.format(&record).unwrap(), shadow);
    }

    #[test]
    fn separators_are_rejected() {
        let mut record = AttributeRecord::named(EntityKind::User, "alice");
        record.set_value(keys::UID_NUMBER, 1000_i64);
        record.set_value(keys::GECOS, "Alice: the admin");
        assert!(PASSWD.format(&record).unwrap_err().is_invalid_input());

        let mut group = AttributeRecord::named(EntityKind::Group, "staff");
        group.set_value(keys::GID_NUMBER, 50_i64);
        group.push(keys::MEMBER_UID, "a,b");
        assert!(GROUP.format(&group).is_err());
    }
}
