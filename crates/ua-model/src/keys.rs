//! Attribute key catalogue.
//!
//! Key names follow the POSIX account schema so the directory module can use
//! them unchanged.

use crate::value::AttrValue;

// ============================================================================
// Identity
// ============================================================================

/// Primary name of a user.
pub const USER_NAME: &str = "uid";
/// Primary name of a group.
pub const GROUP_NAME: &str = "cn";
/// Numeric user id.
pub const UID_NUMBER: &str = "uidNumber";
/// Numeric group id (primary group for users).
pub const GID_NUMBER: &str = "gidNumber";
/// Object classes of a directory entry.
pub const OBJECT_CLASS: &str = "objectClass";

// ============================================================================
// Account details
// ============================================================================

/// Password-equivalent field.
pub const USER_PASSWORD: &str = "userPassword";
/// Free-text description.
pub const GECOS: &str = "gecos";
/// Home path.
pub const HOME_DIRECTORY: &str = "homeDirectory";
/// Login shell.
pub const LOGIN_SHELL: &str = "loginShell";

// ============================================================================
// Shadow
// ============================================================================

/// Explicit shadow-style password field.
pub const SHADOW_PASSWORD: &str = "shadowPassword";
/// Day of the last password change.
pub const SHADOW_LAST_CHANGE: &str = "shadowLastChange";
/// Minimum days between changes.
pub const SHADOW_MIN: &str = "shadowMin";
/// Maximum days a password stays valid.
pub const SHADOW_MAX: &str = "shadowMax";
/// Days of warning before expiry.
pub const SHADOW_WARNING: &str = "shadowWarning";
/// Days after expiry until the account is disabled.
pub const SHADOW_INACTIVE: &str = "shadowInactive";
/// Day the account expires.
pub const SHADOW_EXPIRE: &str = "shadowExpire";
/// Reserved flag field.
pub const SHADOW_FLAG: &str = "shadowFlag";

/// Every shadow aging key, in on-disk order.
pub const SHADOW_AGING: [&str; 7] = [
    SHADOW_LAST_CHANGE,
    SHADOW_MIN,
    SHADOW_MAX,
    SHADOW_WARNING,
    SHADOW_INACTIVE,
    SHADOW_EXPIRE,
    SHADOW_FLAG,
];

// ============================================================================
// Groups
// ============================================================================

/// Group membership list.
pub const MEMBER_UID: &str = "memberUid";
/// Group administrator list.
pub const ADMINISTRATOR_UID: &str = "administratorUid";

/// Value type of a catalogue key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    /// Opaque text.
    Text,
    /// Integer.
    Integer,
}

/// Returns the value type for `key`. Unknown keys are text.
#[must_use]
pub fn value_type(key: &str) -> ValueType {
    if key == UID_NUMBER || key == GID_NUMBER || SHADOW_AGING.contains(&key) {
        ValueType::Integer
    } else {
        ValueType::Text
    }
}

/// Parses a raw stored string into the value type `key` expects.
///
/// Integer keys whose text does not parse are kept as text so nothing is
/// silently dropped.
#[must_use]
pub fn parse_value(key: &str, raw: &str) -> AttrValue {
    match value_type(key) {
        ValueType::Integer => raw
            .trim()
            .parse::<i64>()
            .map_or_else(|_| AttrValue::text(raw), AttrValue::Int),
        ValueType::Text => AttrValue::text(raw),
    }
}
