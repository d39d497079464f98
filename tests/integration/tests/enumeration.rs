//! Enumeration over several modules and hand-maintained files.

use std::fs;

use pretty_assertions::assert_eq;
use ua_model::{keys, EntityKind};

use crate::common::{directory_user, TestEnv};

#[test]
fn placeholder_lines_are_skipped_and_preserved() {
    let env = TestEnv::open(&["files"], |dir| {
        fs::write(
            dir.join("passwd"),
            "# local accounts\nroot:x:0:0:root:/root:/bin/bash\n+@admins\n-mallory\n+\n",
        )
        .unwrap();
    });

    assert_eq!(
        env.session.enumerate(EntityKind::User, "*").unwrap(),
        vec!["root"]
    );

    let mut alice = env.session.new_user("alice").unwrap();
    env.session.add(&mut alice).unwrap();

    let passwd = env.read("passwd");
    assert!(passwd.starts_with("# local accounts\nroot:x:0:0:"));
    assert!(passwd.contains("\n+@admins\n-mallory\n+\n"));
    assert!(passwd.ends_with("alice:x:1000:100::/home/alice:/bin/bash\n"));
    assert_eq!(
        env.session.enumerate(EntityKind::User, "*").unwrap(),
        vec!["root", "alice"]
    );
}

#[test]
fn enumeration_is_a_union_in_module_order() {
    let env = TestEnv::files_and_directory();
    let mut anna = env.session.new_user("anna").unwrap();
    env.session.add(&mut anna).unwrap();
    env.directory.insert(directory_user("zoe", 2000));
    env.directory.insert(directory_user("bert", 2001));

    let names = env.session.enumerate(EntityKind::User, "*").unwrap();
    assert_eq!(names.first().map(String::as_str), Some("anna"));
    assert_eq!(names.len(), 3);
    assert!(names.contains(&"zoe".to_string()));
    assert!(names.contains(&"bert".to_string()));

    let full = env.session.enumerate_full(EntityKind::User, "*").unwrap();
    let anna = full
        .iter()
        .find(|r| r.name().is_ok_and(|n| n == "anna"))
        .unwrap();
    assert_eq!(anna.text(keys::LOGIN_SHELL).unwrap(), "/bin/bash");
    let zoe = full
        .iter()
        .find(|r| r.name().is_ok_and(|n| n == "zoe"))
        .unwrap();
    assert_eq!(zoe.id().unwrap(), 2000);
    assert_eq!(zoe.text(keys::LOGIN_SHELL).unwrap(), "/bin/bash");
}

#[test]
fn glob_patterns_filter_names() {
    let env = TestEnv::files_only();
    for name in ["adm", "admin", "audio", "bin"] {
        let mut group = env.session.new_group(name).unwrap();
        env.session.add(&mut group).unwrap();
    }

    assert_eq!(
        env.session.enumerate(EntityKind::Group, "adm*").unwrap(),
        vec!["adm", "admin"]
    );
    assert_eq!(
        env.session.enumerate(EntityKind::Group, "?udio").unwrap(),
        vec!["audio"]
    );
    assert!(env
        .session
        .enumerate(EntityKind::Group, "[")
        .unwrap_err()
        .is_validation());
}
