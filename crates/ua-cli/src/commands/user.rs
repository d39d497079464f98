//! User management commands.

use serde::Serialize;
use tabled::Tabled;
use ua_admin::AdminSession;
use ua_model::{keys, AttributeRecord, EntityKind};

use crate::cli::UserCommand;
use crate::output::{info, output, output_record, success, OutputFormat};

use super::{find, id_value, require, text_or_empty};

/// User representation for display.
#[derive(Debug, Clone, Serialize, Tabled)]
pub struct UserDisplay {
    /// User name.
    pub name: String,
    /// Numeric user id.
    pub uid: String,
    /// Primary group id.
    pub gid: String,
    /// Full name / comment.
    #[tabled(rename = "Full Name")]
    pub gecos: String,
    /// Home directory.
    pub home: String,
    /// Login shell.
    pub shell: String,
}

impl From<&AttributeRecord> for UserDisplay {
    fn from(record: &AttributeRecord) -> Self {
        Self {
            name: text_or_empty(record, keys::USER_NAME),
            uid: text_or_empty(record, keys::UID_NUMBER),
            gid: text_or_empty(record, keys::GID_NUMBER),
            gecos: text_or_empty(record, keys::GECOS),
            home: text_or_empty(record, keys::HOME_DIRECTORY),
            shell: text_or_empty(record, keys::LOGIN_SHELL),
        }
    }
}

/// Group name row for `user groups`.
#[derive(Debug, Clone, Serialize, Tabled)]
pub struct GroupNameDisplay {
    /// Group name.
    pub group: String,
}

/// Shell row for `user shells`.
#[derive(Debug, Clone, Serialize, Tabled)]
pub struct ShellDisplay {
    /// Login shell path.
    pub shell: String,
}

/// Attribute edits shared by `add` and `mod`.
#[derive(Debug, Default)]
struct UserEdits {
    uid: Option<u64>,
    gid: Option<u64>,
    home: Option<String>,
    shell: Option<String>,
    gecos: Option<String>,
}

impl UserEdits {
    fn apply(self, record: &mut AttributeRecord) -> crate::CliResult<()> {
        if let Some(uid) = self.uid {
            record.set_value(keys::UID_NUMBER, id_value(keys::UID_NUMBER, uid)?);
        }
        if let Some(gid) = self.gid {
            record.set_value(keys::GID_NUMBER, id_value(keys::GID_NUMBER, gid)?);
        }
        if let Some(home) = self.home {
            record.set_value(keys::HOME_DIRECTORY, home);
        }
        if let Some(shell) = self.shell {
            record.set_value(keys::LOGIN_SHELL, shell);
        }
        if let Some(gecos) = self.gecos {
            record.set_value(keys::GECOS, gecos);
        }
        Ok(())
    }
}

/// Runs a user command.
pub fn run_user(
    cmd: UserCommand,
    session: &AdminSession,
    output_format: OutputFormat,
) -> crate::CliResult<()> {
    match cmd {
        UserCommand::Add {
            name,
            uid,
            gid,
            home,
            shell,
            gecos,
            create_home,
        } => {
            let edits = UserEdits {
                uid,
                gid,
                home,
                shell,
                gecos,
            };
            add_user(session, &name, edits, create_home, output_format)
        }
        UserCommand::Del {
            name,
            force,
            remove_home,
        } => super::delete(session, EntityKind::User, &name, force, remove_home),
        UserCommand::Mod {
            name,
            rename,
            uid,
            gid,
            home,
            shell,
            gecos,
            move_home,
        } => {
            let edits = UserEdits {
                uid,
                gid,
                home,
                shell,
                gecos,
            };
            modify_user(session, &name, rename, edits, move_home)
        }
        UserCommand::Show { name, id } => show_user(session, &name, id, output_format),
        UserCommand::List { pattern } => list_users(session, &pattern, output_format),
        UserCommand::Lock { name } => super::lock(session, EntityKind::User, &name),
        UserCommand::Unlock { name, allow_empty } => {
            super::unlock(session, EntityKind::User, &name, allow_empty)
        }
        UserCommand::Passwd(args) => super::set_password(session, EntityKind::User, args),
        UserCommand::Unpasswd { name } => {
            let mut record = require(session, EntityKind::User, &name)?;
            session.remove_password(&mut record)?;
            success(&format!("Password for user '{name}' removed"));
            Ok(())
        }
        UserCommand::Groups { name } => list_groups_of(session, &name, output_format),
        UserCommand::Shells => {
            let shells: Vec<ShellDisplay> = session
                .user_shells()?
                .into_iter()
                .map(|shell| ShellDisplay { shell })
                .collect();
            output(&shells, output_format)
        }
    }
}

/// Creates a user from the session defaults plus explicit edits.
fn add_user(
    session: &AdminSession,
    name: &str,
    edits: UserEdits,
    create_home: bool,
    format: OutputFormat,
) -> crate::CliResult<()> {
    let mut record = session.new_user(name)?;
    edits.apply(&mut record)?;
    if create_home {
        let home = session.add_creating_home(&mut record)?;
        info(&format!("Created home directory {}", home.display()));
    } else {
        session.add(&mut record)?;
    }

    success(&format!("User '{name}' created"));
    if format == OutputFormat::Json {
        output_record(&record, format)?;
    }
    Ok(())
}

fn modify_user(
    session: &AdminSession,
    name: &str,
    rename: Option<String>,
    edits: UserEdits,
    move_home: bool,
) -> crate::CliResult<()> {
    let original = require(session, EntityKind::User, name)?;
    let mut record = original.clone();
    if let Some(new_name) = &rename {
        record.set_value(keys::USER_NAME, new_name.as_str());
    }
    edits.apply(&mut record)?;
    if move_home {
        session.modify_moving_home(&original, &mut record)?;
    } else {
        session.modify(&original, &mut record)?;
    }

    match rename {
        Some(new_name) if new_name != name => {
            success(&format!("User '{name}' renamed to '{new_name}'"));
        }
        _ => success(&format!("User '{name}' updated")),
    }
    Ok(())
}

fn show_user(
    session: &AdminSession,
    name: &str,
    by_id: bool,
    format: OutputFormat,
) -> crate::CliResult<()> {
    let record = find(session, EntityKind::User, name, by_id)?;
    output_record(&record, format)?;
    if format == OutputFormat::Table && session.is_locked(&record)? {
        info("Password is locked");
    }
    Ok(())
}

fn list_users(session: &AdminSession, pattern: &str, format: OutputFormat) -> crate::CliResult<()> {
    let users: Vec<UserDisplay> = session
        .enumerate_full(EntityKind::User, pattern)?
        .iter()
        .map(UserDisplay::from)
        .collect();
    output(&users, format)
}

fn list_groups_of(
    session: &AdminSession,
    name: &str,
    format: OutputFormat,
) -> crate::CliResult<()> {
    let groups: Vec<GroupNameDisplay> = session
        .groups_of_user(name)?
        .into_iter()
        .map(|group| GroupNameDisplay { group })
        .collect();
    output(&groups, format)
}
