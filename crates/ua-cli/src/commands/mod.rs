//! Command implementations.

pub mod group;
pub mod user;

pub use group::run_group;
pub use user::run_user;

use ua_admin::AdminSession;
use ua_model::{AttrValue, AttributeRecord, EntityKind};

use crate::cli::PasswordArgs;
use crate::output::{confirm, error, prompt_new_password, success};
use crate::{CliError, CliResult};

/// Looks an entry up by name, or by numeric id when `by_id` is set.
pub(crate) fn find(
    session: &AdminSession,
    kind: EntityKind,
    key: &str,
    by_id: bool,
) -> CliResult<AttributeRecord> {
    let found = if by_id {
        session.lookup_by_id(kind, parse_id(key)?)?
    } else {
        session.lookup_by_name(kind, key)?
    };
    found.ok_or_else(|| not_found(kind, key))
}

fn parse_id(text: &str) -> CliResult<u64> {
    text.parse()
        .map_err(|_| CliError::InvalidArgument(format!("'{text}' is not a numeric id")))
}

/// Looks an entry up by name only.
pub(crate) fn require(
    session: &AdminSession,
    kind: EntityKind,
    name: &str,
) -> CliResult<AttributeRecord> {
    session
        .lookup_by_name(kind, name)?
        .ok_or_else(|| not_found(kind, name))
}

fn not_found(kind: EntityKind, name: &str) -> CliError {
    CliError::NotFound {
        kind: kind.as_str(),
        name: name.to_string(),
    }
}

/// Converts a command-line id into a stored value.
pub(crate) fn id_value(key: &str, id: u64) -> CliResult<AttrValue> {
    i64::try_from(id)
        .map(AttrValue::from)
        .map_err(|_| CliError::InvalidArgument(format!("{key} {id} is out of range")))
}

/// Text value of `key`, or an empty string.
pub(crate) fn text_or_empty(record: &AttributeRecord, key: &str) -> String {
    record
        .first(key)
        .map(ToString::to_string)
        .unwrap_or_default()
}

/// Shared `passwd` handling for users and groups.
pub(crate) fn set_password(
    session: &AdminSession,
    kind: EntityKind,
    args: PasswordArgs,
) -> CliResult<()> {
    let mut record = require(session, kind, &args.name)?;
    let password = match args.password {
        Some(password) => password,
        None if args.prehashed => {
            return Err(CliError::InvalidArgument(
                "--prehashed needs --password".to_string(),
            ))
        }
        None => prompt_new_password()?,
    };
    session.set_password(&mut record, &password, args.prehashed)?;
    success(&format!("Password for {kind} '{}' updated", args.name));
    Ok(())
}

/// Shared `lock` handling for users and groups.
pub(crate) fn lock(session: &AdminSession, kind: EntityKind, name: &str) -> CliResult<()> {
    let mut record = require(session, kind, name)?;
    session.lock(&mut record)?;
    success(&format!("{kind} '{name}' locked"));
    Ok(())
}

/// Shared `unlock` handling for users and groups.
pub(crate) fn unlock(
    session: &AdminSession,
    kind: EntityKind,
    name: &str,
    allow_empty: bool,
) -> CliResult<()> {
    let mut record = require(session, kind, name)?;
    session.unlock(&mut record, allow_empty)?;
    success(&format!("{kind} '{name}' unlocked"));
    Ok(())
}

/// Shared `del` handling for users and groups. Only users have a home
/// directory to remove.
pub(crate) fn delete(
    session: &AdminSession,
    kind: EntityKind,
    name: &str,
    force: bool,
    remove_home: bool,
) -> CliResult<()> {
    let record = require(session, kind, name)?;
    if !force && !confirm(&format!("Are you sure you want to delete {kind} '{name}'?"))? {
        error("Operation cancelled");
        return Ok(());
    }
    if remove_home {
        session.delete_removing_home(&record)?;
    } else {
        session.delete(&record)?;
    }
    success(&format!("{kind} '{name}' deleted"));
    Ok(())
}
