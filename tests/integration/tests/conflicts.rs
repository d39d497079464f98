//! Collisions and partial failures.

use pretty_assertions::assert_eq;
use ua_core::Error;
use ua_model::{keys, EntityKind};

use crate::common::{directory_user, TestEnv};

#[test]
fn name_held_by_one_module_blocks_the_add_everywhere() {
    let env = TestEnv::files_and_directory();
    env.directory.insert(directory_user("bob", 1500));

    let mut bob = env.session.new_user("bob").unwrap();
    let err = env.session.add(&mut bob).unwrap_err();
    assert!(err.is_duplicate());
    assert!(err.is_clean_abort());
    assert!(!env.read("passwd").contains("bob"));
}

#[test]
fn id_allocation_skips_ids_used_in_any_module() {
    let env = TestEnv::files_and_directory();
    env.directory.insert(directory_user("bob", 1000));

    let carl = env.session.new_user("carl").unwrap();
    assert_eq!(carl.id().unwrap(), 1001);

    let mut clash = env.session.new_user("dave").unwrap();
    clash.set_value(keys::UID_NUMBER, 1000_i64);
    let err = env.session.add(&mut clash).unwrap_err();
    assert!(matches!(err, Error::Duplicate { field, .. } if field == keys::UID_NUMBER));
}

#[test]
fn rename_onto_an_existing_name_changes_nothing() {
    let env = TestEnv::files_and_directory();
    let mut alice = env.session.new_user("alice").unwrap();
    env.session.add(&mut alice).unwrap();
    let mut bob = env.session.new_user("bob").unwrap();
    env.session.add(&mut bob).unwrap();

    let original = alice.clone();
    alice.set_value(keys::USER_NAME, "bob");
    let err = env.session.modify(&original, &mut alice).unwrap_err();
    assert!(err.is_duplicate());

    assert!(env
        .session
        .lookup_by_name(EntityKind::User, "alice")
        .unwrap()
        .is_some());
    assert!(env.dir_entry(EntityKind::User, "alice").is_some());
}

#[test]
fn failing_second_module_reports_partial_commit() {
    let env = TestEnv::files_and_directory();
    env.directory.fail_writes(true);

    let mut erin = env.session.new_user("erin").unwrap();
    let err = env.session.add(&mut erin).unwrap_err();
    assert!(err.is_partial());
    match err {
        Error::Module {
            module, committed, ..
        } => {
            assert_eq!(module, "ldap");
            assert_eq!(committed, vec!["files".to_string()]);
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert!(env.read("passwd").contains("erin:x:"));
    assert!(env.dir_entry(EntityKind::User, "erin").is_none());
}

#[test]
fn invalid_names_are_rejected_before_any_write() {
    let env = TestEnv::files_and_directory();
    let long = "x".repeat(40);
    for name in ["", "-rf", "with space", "..", "caf\u{e9}", long.as_str()] {
        let err = env.session.new_user(name).unwrap_err();
        assert!(err.is_validation(), "{name:?} should be rejected");
    }
    assert_eq!(env.read("passwd"), "");
    assert!(env.directory.is_empty());
}

#[test]
fn missing_entries_are_not_found() {
    let env = TestEnv::files_and_directory();
    let ghost = env.session.new_user("ghost").unwrap();
    assert!(env.session.delete(&ghost).unwrap_err().is_not_found());
    assert!(env.session.is_locked(&ghost).unwrap_err().is_not_found());
    assert!(env
        .session
        .users_in_group("nobody")
        .unwrap_err()
        .is_not_found());
}
