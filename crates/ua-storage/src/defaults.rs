//! Per-module default values.

use ua_model::{keys, AttrValue, AttributeRecord, EntityKind};

/// Days since the Unix epoch, the unit of shadow date fields.
#[must_use]
pub fn days_since_epoch() -> i64 {
    chrono::Utc::now().timestamp().div_euclid(86_400)
}

/// Default values a module applies to keys the caller left absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Defaults {
    values: AttributeRecord,
}

impl Defaults {
    /// Creates an empty default set.
    #[must_use]
    pub const fn new(kind: EntityKind) -> Self {
        Self {
            values: AttributeRecord::new(kind),
        }
    }

    /// Standard shadow aging values: no minimum, 99999 days maximum,
    /// 7 days warning, no inactivity limit, no expiry.
    #[must_use]
    pub fn shadow_aging(kind: EntityKind) -> Self {
        Self::new(kind)
            .with(keys::SHADOW_MIN, 0_i64)
            .with(keys::SHADOW_MAX, 99_999_i64)
            .with(keys::SHADOW_WARNING, 7_i64)
            .with(keys::SHADOW_INACTIVE, -1_i64)
            .with(keys::SHADOW_EXPIRE, -1_i64)
            .with(keys::SHADOW_FLAG, -1_i64)
    }

    /// Adds a single-valued default.
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<AttrValue>) -> Self {
        self.values.set_value(key, value);
        self
    }

    /// Adds a multi-valued default.
    #[must_use]
    pub fn with_values(mut self, key: &str, values: Vec<AttrValue>) -> Self {
        self.values.set(key, values);
        self
    }

    /// Merges another default set; `other` wins on shared keys.
    #[must_use]
    pub fn extend(mut self, other: &Self) -> Self {
        self.values.overlay(&other.values);
        self
    }

    /// Default for `key`, if any.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&[AttrValue]> {
        self.values.get(key).ok()
    }

    /// Fills keys of `record` that are absent. Present keys, even empty
    /// ones, are never touched.
    pub fn apply(&self, record: &mut AttributeRecord) {
        record.fill_absent(&self.values);
    }

    /// Fills keys of `record` that are absent, empty, or hold only empty
    /// text. Used for attributes an entry cannot be stored without.
    pub fn refill(&self, record: &mut AttributeRecord) {
        for (key, values) in self.values.iter() {
            let blank = record
                .get(key)
                .map_or(true, |current| current.iter().all(AttrValue::is_empty_text));
            if blank {
                record.set(key, values.to_vec());
            }
        }
    }

    /// Defaults for keys `record` does not have.
    #[must_use]
    pub fn missing_from(&self, record: &AttributeRecord) -> AttributeRecord {
        let mut missing = AttributeRecord::new(record.kind());
        for (key, values) in self.values.iter() {
            if !record.has(key) {
                missing.set(key, values.to_vec());
            }
        }
        missing
    }

    /// The defaults as a record.
    #[must_use]
    pub const fn as_record(&self) -> &AttributeRecord {
        &self.values
    }
}
