//! Group management commands.

use serde::Serialize;
use tabled::Tabled;
use ua_admin::AdminSession;
use ua_model::{keys, AttrValue, AttributeRecord, EntityKind};

use crate::cli::GroupCommand;
use crate::output::{info, output, output_record, success, OutputFormat};

use super::{find, id_value, require, text_or_empty};

/// Group representation for display.
#[derive(Debug, Clone, Serialize, Tabled)]
pub struct GroupDisplay {
    /// Group name.
    pub name: String,
    /// Numeric group id.
    pub gid: String,
    /// Listed members, comma separated.
    pub members: String,
}

impl From<&AttributeRecord> for GroupDisplay {
    fn from(record: &AttributeRecord) -> Self {
        Self {
            name: text_or_empty(record, keys::GROUP_NAME),
            gid: text_or_empty(record, keys::GID_NUMBER),
            members: record
                .texts(keys::MEMBER_UID)
                .map(|members| members.join(","))
                .unwrap_or_default(),
        }
    }
}

/// Member row for `group members`.
#[derive(Debug, Clone, Serialize, Tabled)]
pub struct MemberDisplay {
    /// User name.
    pub user: String,
}

/// Runs a group command.
pub fn run_group(
    cmd: GroupCommand,
    session: &AdminSession,
    output_format: OutputFormat,
) -> crate::CliResult<()> {
    match cmd {
        GroupCommand::Add { name, gid, members } => {
            add_group(session, &name, gid, members, output_format)
        }
        GroupCommand::Del { name, force } => {
            super::delete(session, EntityKind::Group, &name, force, false)
        }
        GroupCommand::Mod {
            name,
            rename,
            gid,
            add_member,
            remove_member,
        } => {
            let original = require(session, EntityKind::Group, &name)?;
            let mut record = original.clone();
            if let Some(new_name) = &rename {
                record.set_value(keys::GROUP_NAME, new_name.as_str());
            }
            if let Some(gid) = gid {
                record.set_value(keys::GID_NUMBER, id_value(keys::GID_NUMBER, gid)?);
            }
            edit_members(&mut record, add_member, &remove_member);
            session.modify(&original, &mut record)?;
            success(&format!("Group '{name}' updated"));
            Ok(())
        }
        GroupCommand::Show { name, id } => {
            let record = find(session, EntityKind::Group, &name, id)?;
            output_record(&record, output_format)?;
            if output_format == OutputFormat::Table && session.is_locked(&record)? {
                info("Password is locked");
            }
            Ok(())
        }
        GroupCommand::List { pattern } => {
            let groups: Vec<GroupDisplay> = session
                .enumerate_full(EntityKind::Group, &pattern)?
                .iter()
                .map(GroupDisplay::from)
                .collect();
            output(&groups, output_format)
        }
        GroupCommand::Lock { name } => super::lock(session, EntityKind::Group, &name),
        GroupCommand::Unlock { name, allow_empty } => {
            super::unlock(session, EntityKind::Group, &name, allow_empty)
        }
        GroupCommand::Passwd(args) => super::set_password(session, EntityKind::Group, args),
        GroupCommand::Members { name } => {
            let members: Vec<MemberDisplay> = session
                .users_in_group(&name)?
                .into_iter()
                .map(|user| MemberDisplay { user })
                .collect();
            output(&members, output_format)
        }
    }
}

/// Creates a group with optional explicit gid and member list.
fn add_group(
    session: &AdminSession,
    name: &str,
    gid: Option<u64>,
    members: Vec<String>,
    format: OutputFormat,
) -> crate::CliResult<()> {
    let mut record = session.new_group(name)?;
    if let Some(gid) = gid {
        record.set_value(keys::GID_NUMBER, id_value(keys::GID_NUMBER, gid)?);
    }
    edit_members(&mut record, members, &[]);
    session.add(&mut record)?;

    success(&format!("Group '{name}' created"));
    if format == OutputFormat::Json {
        output_record(&record, format)?;
    }
    Ok(())
}

/// Adds then removes member names. Existing members are not repeated.
fn edit_members(record: &mut AttributeRecord, add: Vec<String>, remove: &[String]) {
    for member in add {
        let listed = record
            .texts(keys::MEMBER_UID)
            .is_ok_and(|members| members.contains(&member.as_str()));
        if !listed {
            record.push(keys::MEMBER_UID, member);
        }
    }
    for member in remove {
        record.remove_value(keys::MEMBER_UID, &AttrValue::text(member.as_str()));
    }
}
