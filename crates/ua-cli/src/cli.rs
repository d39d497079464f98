//! CLI argument parsing.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::output::OutputFormat;

/// Default configuration file.
pub const DEFAULT_CONFIG: &str = "/etc/useradm.toml";

/// useradm - manage users and groups across files and directory backends.
#[derive(Debug, Parser)]
#[command(name = "useradm")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Configuration file.
    #[arg(short, long, env = "USERADM_CONFIG", default_value = DEFAULT_CONFIG)]
    pub config: PathBuf,

    /// Output format.
    #[arg(short, long, value_enum, default_value = "table")]
    pub output: OutputFormat,

    /// Accept prompt defaults without asking. Passwords are still asked for
    /// unless USERADM_BIND_PASSWORD is set.
    #[arg(short, long)]
    pub quiet_prompts: bool,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// User management commands.
    #[command(subcommand)]
    User(UserCommand),

    /// Group management commands.
    #[command(subcommand)]
    Group(GroupCommand),
}

/// Password options shared by `passwd` subcommands.
#[derive(Debug, Args)]
pub struct PasswordArgs {
    /// Entry name.
    pub name: String,

    /// New password (prompted for if omitted).
    #[arg(long, env = "USERADM_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// The password is already hashed.
    #[arg(long)]
    pub prehashed: bool,
}

/// User commands.
#[derive(Debug, Subcommand)]
pub enum UserCommand {
    /// Create a user.
    Add {
        /// User name.
        name: String,

        /// Numeric user id (next free id if omitted).
        #[arg(short, long)]
        uid: Option<u64>,

        /// Primary group id.
        #[arg(short, long)]
        gid: Option<u64>,

        /// Home directory.
        #[arg(long)]
        home: Option<String>,

        /// Login shell.
        #[arg(short, long)]
        shell: Option<String>,

        /// Full name / comment field.
        #[arg(short = 'c', long)]
        gecos: Option<String>,

        /// Create the home directory from the skeleton.
        #[arg(short = 'm', long)]
        create_home: bool,
    },

    /// Delete a user.
    Del {
        /// User name.
        name: String,

        /// Skip confirmation prompt.
        #[arg(short, long)]
        force: bool,

        /// Remove the home directory too.
        #[arg(short, long)]
        remove_home: bool,
    },

    /// Modify a user.
    Mod {
        /// User name.
        name: String,

        /// New user name.
        #[arg(short = 'l', long)]
        rename: Option<String>,

        /// New numeric user id.
        #[arg(short, long)]
        uid: Option<u64>,

        /// New primary group id.
        #[arg(short, long)]
        gid: Option<u64>,

        /// New home directory.
        #[arg(long)]
        home: Option<String>,

        /// New login shell.
        #[arg(short, long)]
        shell: Option<String>,

        /// New full name / comment field.
        #[arg(short = 'c', long)]
        gecos: Option<String>,

        /// Move the home directory's contents to the new home directory.
        #[arg(short = 'm', long)]
        move_home: bool,
    },

    /// Show a user.
    Show {
        /// User name, or numeric id with `--id`.
        name: String,

        /// Look the argument up as a numeric id.
        #[arg(long)]
        id: bool,
    },

    /// List users.
    List {
        /// Glob pattern on the user name.
        #[arg(default_value = "*")]
        pattern: String,
    },

    /// Lock a user's password.
    Lock {
        /// User name.
        name: String,
    },

    /// Unlock a user's password.
    Unlock {
        /// User name.
        name: String,

        /// Allow unlocking to an empty password.
        #[arg(long)]
        allow_empty: bool,
    },

    /// Set a user's password.
    Passwd(PasswordArgs),

    /// Remove a user's password, keeping the lock state.
    Unpasswd {
        /// User name.
        name: String,
    },

    /// List the groups a user belongs to.
    Groups {
        /// User name.
        name: String,
    },

    /// List valid login shells.
    Shells,
}

/// Group commands.
#[derive(Debug, Subcommand)]
pub enum GroupCommand {
    /// Create a group.
    Add {
        /// Group name.
        name: String,

        /// Numeric group id (next free id if omitted).
        #[arg(short, long)]
        gid: Option<u64>,

        /// Member user names.
        #[arg(short, long = "member")]
        members: Vec<String>,
    },

    /// Delete a group.
    Del {
        /// Group name.
        name: String,

        /// Skip confirmation prompt.
        #[arg(short, long)]
        force: bool,
    },

    /// Modify a group.
    Mod {
        /// Group name.
        name: String,

        /// New group name.
        #[arg(short = 'n', long)]
        rename: Option<String>,

        /// New numeric group id.
        #[arg(short, long)]
        gid: Option<u64>,

        /// Members to add.
        #[arg(short, long)]
        add_member: Vec<String>,

        /// Members to remove.
        #[arg(short, long)]
        remove_member: Vec<String>,
    },

    /// Show a group.
    Show {
        /// Group name, or numeric id with `--id`.
        name: String,

        /// Look the argument up as a numeric id.
        #[arg(long)]
        id: bool,
    },

    /// List groups.
    List {
        /// Glob pattern on the group name.
        #[arg(default_value = "*")]
        pattern: String,
    },

    /// Lock a group's password.
    Lock {
        /// Group name.
        name: String,
    },

    /// Unlock a group's password.
    Unlock {
        /// Group name.
        name: String,

        /// Allow unlocking to an empty password.
        #[arg(long)]
        allow_empty: bool,
    },

    /// Set a group's password.
    Passwd(PasswordArgs),

    /// List a group's members.
    Members {
        /// Group name.
        name: String,
    },
}
