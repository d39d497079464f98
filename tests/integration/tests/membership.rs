//! Primary groups and supplementary membership.

use pretty_assertions::assert_eq;
use ua_model::{keys, EntityKind};

use crate::common::TestEnv;

#[test]
fn members_come_from_primary_gid_and_member_list() {
    let env = TestEnv::files_and_directory();
    let session = &env.session;

    let mut staff = session.new_group("staff").unwrap();
    staff.set_value(keys::GID_NUMBER, 50_i64);
    staff.set(keys::MEMBER_UID, vec!["bob".into(), "carol".into()]);
    session.add(&mut staff).unwrap();

    let mut alice = session.new_user("alice").unwrap();
    alice.set_value(keys::GID_NUMBER, 50_i64);
    session.add(&mut alice).unwrap();
    let mut bob = session.new_user("bob").unwrap();
    session.add(&mut bob).unwrap();

    assert_eq!(
        session.users_in_group("staff").unwrap(),
        vec!["alice", "bob", "carol"]
    );
    assert_eq!(session.groups_of_user("alice").unwrap(), vec!["staff"]);
    assert_eq!(session.groups_of_user("bob").unwrap(), vec!["staff"]);
    assert!(env.read("group").starts_with("staff:x:50:bob,carol"));
}

#[test]
fn membership_edits_follow_modify() {
    let env = TestEnv::files_only();
    let session = &env.session;

    let mut wheel = session.new_group("wheel").unwrap();
    session.add(&mut wheel).unwrap();
    let mut dave = session.new_user("dave").unwrap();
    session.add(&mut dave).unwrap();
    assert!(session.groups_of_user("dave").unwrap().is_empty());

    let original = wheel.clone();
    wheel.push(keys::MEMBER_UID, "dave");
    session.modify(&original, &mut wheel).unwrap();

    assert_eq!(session.groups_of_user("dave").unwrap(), vec!["wheel"]);
    assert_eq!(
        session
            .lookup_by_name(EntityKind::Group, "wheel")
            .unwrap()
            .unwrap()
            .texts(keys::MEMBER_UID)
            .unwrap(),
        vec!["dave"]
    );
}
