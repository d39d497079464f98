//! # useradm
//!
//! Manage users and groups across the configured account modules.

#![forbid(unsafe_code)]

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use ua_admin::AdminSession;
use ua_core::AdminConfig;
use ua_directory::Ldap3Connector;
use ua_cli::{
    cli::{Cli, Command},
    commands::{run_group, run_user},
    output::error,
    prompt::ConsolePrompter,
    CliResult,
};

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        error(&e.to_string());
        std::process::exit(e.exit_code());
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn,ua_admin=info" };
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| default.to_string());
    tracing_subscriber::registry()
        .with(EnvFilter::new(filter))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run(cli: Cli) -> CliResult<()> {
    let config = AdminConfig::load_or_default(&cli.config)?;
    let prompter = ConsolePrompter::new(cli.quiet_prompts);
    let session = AdminSession::open(config, &prompter, &Ldap3Connector)?;

    tracing::debug!(
        elevated = session.uses_elevated_privileges(),
        "Admin session ready"
    );

    match cli.command {
        Command::User(cmd) => run_user(cmd, &session, cli.output),
        Command::Group(cmd) => run_group(cmd, &session, cli.output),
    }
}
