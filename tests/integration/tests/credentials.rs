//! Password, lock and unlock behavior across both modules.

use pretty_assertions::assert_eq;
use ua_crypto::{Argon2Hasher, CredentialHasher, HashPolicy};
use ua_directory::DirEntry;
use ua_model::{keys, AttributeRecord, EntityKind};

use crate::common::{directory_user, TestEnv};

fn shadow_field(env: &TestEnv, file: &str, name: &str) -> String {
    env.read(file)
        .lines()
        .find(|line| line.split(':').next() == Some(name))
        .and_then(|line| line.split(':').nth(1))
        .unwrap_or_default()
        .to_string()
}

fn directory_password(env: &TestEnv, kind: EntityKind, name: &str) -> String {
    env.dir_entry(kind, name)
        .and_then(|entry: DirEntry| entry.get_attr("userPassword").map(str::to_string))
        .unwrap_or_default()
}

fn added_user(env: &TestEnv, name: &str) -> AttributeRecord {
    let mut record = env.session.new_user(name).unwrap();
    env.session.add(&mut record).unwrap();
    record
}

#[test]
fn new_entries_start_locked_without_a_password() {
    let env = TestEnv::files_and_directory();
    let mut alice = added_user(&env, "alice");

    assert!(env.session.is_locked(&alice).unwrap());
    let err = env.session.unlock(&mut alice, false).unwrap_err();
    assert!(err.is_lock());
    assert!(err.is_clean_abort());
    assert_eq!(shadow_field(&env, "shadow", "alice"), "!!");
    assert_eq!(directory_password(&env, EntityKind::User, "alice"), "{CRYPT}!!");
}

#[test]
fn unlocking_to_empty_needs_consent() {
    let env = TestEnv::files_only();
    let mut alice = added_user(&env, "alice");

    env.session.unlock(&mut alice, true).unwrap();
    assert!(!env.session.is_locked(&alice).unwrap());
    assert_eq!(shadow_field(&env, "shadow", "alice"), "");
}

#[test]
fn password_round_trip_lock_and_unlock() {
    let env = TestEnv::files_and_directory();
    let mut alice = added_user(&env, "alice");

    env.session
        .set_password(&mut alice, "correct horse", false)
        .unwrap();
    let shadow_hash = shadow_field(&env, "shadow", "alice");
    let directory_hash = directory_password(&env, EntityKind::User, "alice");
    assert!(shadow_hash.starts_with("$argon2id$"));
    assert!(directory_hash.starts_with("{CRYPT}$argon2id$"));

    let hasher = Argon2Hasher::new(HashPolicy::new());
    assert!(hasher.verify("correct horse", &shadow_hash).unwrap());
    assert!(!hasher.verify("battery staple", &shadow_hash).unwrap());
    let stripped = directory_hash.trim_start_matches("{CRYPT}");
    assert_eq!(hasher.rehash("correct horse", stripped).unwrap(), stripped);

    env.session.lock(&mut alice).unwrap();
    assert!(env.session.is_locked(&alice).unwrap());
    assert_eq!(shadow_field(&env, "shadow", "alice"), format!("!!{shadow_hash}"));
    assert_eq!(
        directory_password(&env, EntityKind::User, "alice"),
        format!("{{CRYPT}}!{stripped}")
    );

    env.session.unlock(&mut alice, false).unwrap();
    assert_eq!(shadow_field(&env, "shadow", "alice"), shadow_hash);
    assert_eq!(directory_password(&env, EntityKind::User, "alice"), directory_hash);
}

#[test]
fn removing_a_password_keeps_the_lock() {
    let env = TestEnv::files_only();
    let mut alice = added_user(&env, "alice");
    env.session.set_password(&mut alice, "pw", false).unwrap();
    env.session.lock(&mut alice).unwrap();

    env.session.remove_password(&mut alice).unwrap();
    assert!(env.session.is_locked(&alice).unwrap());
    assert_eq!(shadow_field(&env, "shadow", "alice"), "!!");
    assert!(env.session.unlock(&mut alice, false).unwrap_err().is_lock());
}

#[test]
fn prehashed_passwords_are_stored_verbatim() {
    let env = TestEnv::files_and_directory();
    let mut staff = env.session.new_group("staff").unwrap();
    env.session.add(&mut staff).unwrap();

    env.session
        .set_password(&mut staff, "$6$salt$hash", true)
        .unwrap();
    assert_eq!(shadow_field(&env, "gshadow", "staff"), "$6$salt$hash");
    assert_eq!(
        directory_password(&env, EntityKind::Group, "staff"),
        "{CRYPT}$6$salt$hash"
    );
    assert!(!env.session.is_locked(&staff).unwrap());
}

#[test]
fn foreign_directory_hashes_block_locking() {
    let env = TestEnv::files_and_directory();
    let mut entry = directory_user("dora", 1500);
    entry
        .attributes
        .insert("userPassword".to_string(), vec!["{MD5}abcd".to_string()]);
    env.directory.insert(entry);

    let mut dora = env
        .session
        .lookup_by_name(EntityKind::User, "dora")
        .unwrap()
        .unwrap();
    let err = env.session.lock(&mut dora).unwrap_err();
    assert!(err.is_lock());
    assert!(err.is_clean_abort());
    assert_eq!(directory_password(&env, EntityKind::User, "dora"), "{MD5}abcd");
    assert_eq!(dora.text(keys::USER_NAME).unwrap(), "dora");
}
