//! Common test utilities and fixtures.

use std::path::Path;

use tempfile::TempDir;
use ua_admin::{AdminSession, Prompt};
use ua_core::config::ModulesConfig;
use ua_core::{AdminConfig, Result};
use ua_directory::{DirEntry, MemoryDirectory};
use ua_model::EntityKind;

/// Bind password accepted by the test directory.
pub const BIND_PASSWORD: &str = "s3cret";

/// A session plus the stores behind it.
pub struct TestEnv {
    /// Directory served by the in-memory server.
    pub directory: MemoryDirectory,
    /// The admin session under test.
    pub session: AdminSession,
    /// Temporary files directory; dropped last.
    pub dir: TempDir,
}

impl TestEnv {
    /// Session over the files module only.
    pub fn files_only() -> Self {
        Self::open(&["files"], |_| {})
    }

    /// Session over the files module followed by the directory module.
    pub fn files_and_directory() -> Self {
        Self::open(&["files", "ldap"], |_| {})
    }

    /// Session over `modules`, after `seed` has prepared the files directory.
    pub fn open(modules: &[&str], seed: impl FnOnce(&Path)) -> Self {
        init_tracing();
        let dir = TempDir::new().unwrap();
        seed(dir.path());
        let directory = MemoryDirectory::with_password(BIND_PASSWORD);
        let session = AdminSession::open(
            config(dir.path(), modules),
            &bind_prompter(BIND_PASSWORD),
            &directory,
        )
        .unwrap();
        Self {
            directory,
            session,
            dir,
        }
    }

    /// Contents of a file in the files directory, empty when missing.
    pub fn read(&self, file: &str) -> String {
        std::fs::read_to_string(self.dir.path().join(file)).unwrap_or_default()
    }

    /// Directory entry for `name`, if stored.
    pub fn dir_entry(&self, kind: EntityKind, name: &str) -> Option<DirEntry> {
        self.directory.get(&dn(kind, name))
    }
}

/// Configuration over `path` with a cheap password hash.
pub fn config(path: &Path, modules: &[&str]) -> AdminConfig {
    let mut config = AdminConfig::default();
    config.files.directory = path.to_path_buf();
    config.files.backup = false;
    config.defaults.hash_memory_kib = 64;
    config.defaults.hash_time_cost = 1;
    config.defaults.hash_parallelism = 1;
    let names: Vec<String> = modules.iter().map(|m| (*m).to_string()).collect();
    config.modules = ModulesConfig {
        user: names.clone(),
        group: names,
    };
    config
}

/// Accepts every visible default and answers hidden prompts with `password`.
pub fn bind_prompter(password: &'static str) -> impl Fn(&mut [Prompt]) -> Result<()> {
    move |prompts: &mut [Prompt]| {
        for prompt in prompts.iter_mut() {
            if prompt.visible {
                prompt.accept_default();
            } else {
                prompt.answer(password);
            }
        }
        Ok(())
    }
}

/// DN of `name` under the default base.
pub fn dn(kind: EntityKind, name: &str) -> String {
    match kind {
        EntityKind::User => format!("uid={name},ou=People,dc=example,dc=com"),
        EntityKind::Group => format!("cn={name},ou=Group,dc=example,dc=com"),
    }
}

/// A posixAccount entry stored directly in the directory.
pub fn directory_user(name: &str, uid: u64) -> DirEntry {
    DirEntry::new(dn(EntityKind::User, name))
        .with(
            "objectClass",
            vec!["account".to_string(), "posixAccount".to_string()],
        )
        .with("uid", vec![name.to_string()])
        .with("cn", vec![name.to_string()])
        .with("uidNumber", vec![uid.to_string()])
        .with("gidNumber", vec!["100".to_string()])
        .with("homeDirectory", vec![format!("/home/{name}")])
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("ua_admin=debug,ua_directory=debug")
        .with_test_writer()
        .try_init();
}
