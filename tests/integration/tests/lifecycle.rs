//! Add, modify and delete across both modules.

use pretty_assertions::assert_eq;
use ua_admin::{AdminSession, DefaultsPrompter};
use ua_core::AdminConfig;
use ua_directory::MemoryDirectory;
use ua_model::{keys, EntityKind};

use crate::common::TestEnv;

#[test]
fn user_lifecycle_across_modules() {
    let env = TestEnv::files_and_directory();
    let session = &env.session;

    let mut alice = session.new_user("alice").unwrap();
    alice.set_value(keys::GECOS, "Alice Liddell");
    session.add(&mut alice).unwrap();

    assert!(env
        .read("passwd")
        .starts_with("alice:x:1000:100:Alice Liddell:/home/alice:/bin/bash"));
    assert!(env.read("shadow").starts_with("alice:!!:"));
    let entry = env.dir_entry(EntityKind::User, "alice").unwrap();
    assert_eq!(entry.get_attr("uidNumber"), Some("1000"));
    assert_eq!(entry.get_attr("userPassword"), Some("{CRYPT}!!"));

    let found = session
        .lookup_by_name(EntityKind::User, "alice")
        .unwrap()
        .unwrap();
    assert_eq!(found.id().unwrap(), 1000);
    assert_eq!(found.text(keys::GECOS).unwrap(), "Alice Liddell");

    let original = found.clone();
    let mut renamed = found;
    renamed.set_value(keys::USER_NAME, "alicia");
    renamed.set_value(keys::LOGIN_SHELL, "/bin/zsh");
    session.modify(&original, &mut renamed).unwrap();

    assert_eq!(renamed.name().unwrap(), "alicia");
    assert!(session
        .lookup_by_name(EntityKind::User, "alice")
        .unwrap()
        .is_none());
    assert!(env.read("passwd").contains("alicia:x:1000:100:"));
    assert!(env.dir_entry(EntityKind::User, "alice").is_none());
    let entry = env.dir_entry(EntityKind::User, "alicia").unwrap();
    assert_eq!(entry.get_attr("loginShell"), Some("/bin/zsh"));

    session.delete(&renamed).unwrap();
    assert!(session
        .lookup_by_name(EntityKind::User, "alicia")
        .unwrap()
        .is_none());
    assert!(!env.read("passwd").contains("alicia"));
    assert!(env.dir_entry(EntityKind::User, "alicia").is_none());
}

#[test]
fn clearing_the_primary_group_restores_the_default() {
    let env = TestEnv::files_and_directory();
    let session = &env.session;

    let mut alice = session.new_user("alice").unwrap();
    alice.set_value(keys::GID_NUMBER, 500_i64);
    session.add(&mut alice).unwrap();

    let original = alice.clone();
    alice.set_value(keys::GID_NUMBER, "");
    session.modify(&original, &mut alice).unwrap();

    assert_eq!(alice.int(keys::GID_NUMBER).unwrap(), 100);
    assert!(env.read("passwd").starts_with("alice:x:1000:100:"));
    let entry = env.dir_entry(EntityKind::User, "alice").unwrap();
    assert_eq!(entry.get_attr("gidNumber"), Some("100"));
}

#[test]
fn numeric_group_names_stay_names() {
    let env = TestEnv::files_and_directory();
    let session = &env.session;

    let mut group = session.new_group("077").unwrap();
    group.set_value(keys::GID_NUMBER, 5000_i64);
    session.add(&mut group).unwrap();

    let by_name = session
        .lookup_by_name(EntityKind::Group, "077")
        .unwrap()
        .unwrap();
    assert_eq!(by_name.text(keys::GROUP_NAME).unwrap(), "077");
    assert_eq!(by_name.id().unwrap(), 5000);

    let by_id = session
        .lookup_by_id(EntityKind::Group, 5000)
        .unwrap()
        .unwrap();
    assert_eq!(by_id.name().unwrap(), "077");
    assert!(session.lookup_by_id(EntityKind::Group, 77).unwrap().is_none());
    assert!(env.read("group").starts_with("077:x:5000:"));
}

#[test]
fn ids_above_the_signed_32_bit_range() {
    let env = TestEnv::files_and_directory();
    let session = &env.session;

    let mut big = session.new_user("big").unwrap();
    big.set_value(keys::UID_NUMBER, 4_294_967_294_i64);
    session.add(&mut big).unwrap();

    let found = session
        .lookup_by_id(EntityKind::User, 4_294_967_294)
        .unwrap()
        .unwrap();
    assert_eq!(found.name().unwrap(), "big");
    assert_eq!(
        env.dir_entry(EntityKind::User, "big")
            .unwrap()
            .get_attr("uidNumber"),
        Some("4294967294")
    );
}

#[test]
fn configuration_file_drives_the_session() {
    let dir = tempfile::tempdir().unwrap();
    let config = crate::common::config(dir.path(), &["files"]);
    let path = dir.path().join("useradm.toml");
    std::fs::write(&path, config.to_toml_string().unwrap()).unwrap();

    let loaded = AdminConfig::load(&path).unwrap();
    assert_eq!(loaded, config);
    let session = AdminSession::open(loaded, &DefaultsPrompter, &MemoryDirectory::new()).unwrap();
    let mut alice = session.new_user("alice").unwrap();
    session.add(&mut alice).unwrap();
    assert!(dir.path().join("passwd").exists());
}
