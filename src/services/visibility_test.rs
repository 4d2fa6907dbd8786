use super::*;
use crate::identity::{DEFAULT_BOT, Participant, SYSTEM};
use crate::state::test_helpers::{dm, msg, test_room};

fn bodies<'a>(messages: &[&'a Message]) -> Vec<&'a str> {
    messages.iter().map(|m| m.body.as_str()).collect()
}

#[test]
fn admin_all_mode_returns_entire_log_in_order() {
    let room = test_room();
    let log = vec![
        msg(SYSTEM, "maintenance tonight"),
        dm("mallory", "dispatch", "my order is stuck"),
        msg("dispatch", "on it"),
        dm("rivera", "mallory", "psst"),
    ];

    let got = visible(&log, &room.roster, "dispatch", Role::Admin, &ViewMode::All);
    assert_eq!(got.len(), log.len());
    assert_eq!(
        bodies(&got),
        vec!["maintenance tonight", "my order is stuck", "on it", "psst"]
    );
}

#[test]
fn dashboard_mode_yields_no_messages() {
    let room = test_room();
    let log = vec![msg("mallory", "hello"), msg(SYSTEM, "hi")];

    let got = visible(&log, &room.roster, "dispatch", Role::Admin, &ViewMode::Dashboard);
    assert!(got.is_empty());
}

#[test]
fn conversation_keeps_two_way_traffic_and_system_lines() {
    let mut room = test_room();
    room.roster.upsert(Participant::user("rivera"));
    let log = vec![
        msg(SYSTEM, "maintenance tonight"),
        dm("mallory", "dispatch", "my order is stuck"),
        msg("mallory", "anyone here?"),
        dm("dispatch", "mallory", "looking into it"),
        dm("mallory", "rivera", "psst"),
        dm("dispatch", "rivera", "separate thread"),
        msg("rivera", "hello"),
    ];

    let mode = ViewMode::Conversation("mallory".into());
    let got = visible(&log, &room.roster, "dispatch", Role::Admin, &mode);
    assert_eq!(
        bodies(&got),
        vec!["maintenance tonight", "my order is stuck", "anyone here?", "looking into it"]
    );
}

#[test]
fn conversation_never_shows_third_party_private_traffic() {
    let mut room = test_room();
    room.roster.upsert(Participant::user("rivera"));
    let log = vec![dm("rivera", "mallory", "between us")];

    for counterpart in ["mallory", "rivera"] {
        let mode = ViewMode::Conversation(counterpart.into());
        let got = visible(&log, &room.roster, "dispatch", Role::Admin, &mode);
        assert!(got.is_empty(), "leaked via counterpart {counterpart}");
    }
}

#[test]
fn conversation_with_unknown_counterpart_leaves_only_system_lines() {
    let room = test_room();
    let log = vec![msg(SYSTEM, "hi"), msg("mallory", "anyone?")];

    let mode = ViewMode::Conversation("nobody".into());
    let got = visible(&log, &room.roster, "dispatch", Role::Admin, &mode);
    assert_eq!(bodies(&got), vec!["hi"]);
}

#[test]
fn user_sees_staff_system_and_own_messages() {
    let room = test_room();
    let log = vec![
        msg(SYSTEM, "hi"),
        msg("dispatch", "x"),
        dm("mallory", "dispatch", "y"),
    ];

    let got = visible(&log, &room.roster, "mallory", Role::User, &ViewMode::All);
    assert_eq!(bodies(&got), vec!["hi", "x", "y"]);
}

#[test]
fn user_rule_checks_sender_not_recipient() {
    let mut room = test_room();
    room.roster.upsert(Participant::user("rivera"));
    let log = vec![dm("dispatch", "rivera", "your ticket is closed")];

    // Staff messages stay in every user's support stream even when
    // addressed to someone else.
    let got = visible(&log, &room.roster, "mallory", Role::User, &ViewMode::All);
    assert_eq!(bodies(&got), vec!["your ticket is closed"]);
}

#[test]
fn user_never_sees_other_users_traffic() {
    let mut room = test_room();
    room.roster.upsert(Participant::user("rivera"));
    let log = vec![
        msg("rivera", "hey"),
        dm("rivera", "dispatch", "private to staff"),
    ];

    let got = visible(&log, &room.roster, "mallory", Role::User, &ViewMode::All);
    assert!(got.is_empty());
}

#[test]
fn user_sees_designated_bot_messages() {
    let room = test_room();
    let log = vec![msg(DEFAULT_BOT, "automated notice")];

    let got = visible(&log, &room.roster, "mallory", Role::User, &ViewMode::All);
    assert_eq!(bodies(&got), vec!["automated notice"]);
}

#[test]
fn user_result_ignores_view_mode() {
    let room = test_room();
    let log = vec![msg("dispatch", "x"), msg(SYSTEM, "hi")];

    let all = visible(&log, &room.roster, "mallory", Role::User, &ViewMode::All);
    let dash = visible(&log, &room.roster, "mallory", Role::User, &ViewMode::Dashboard);
    let conv = visible(
        &log,
        &room.roster,
        "mallory",
        Role::User,
        &ViewMode::Conversation("dispatch".into()),
    );
    assert_eq!(bodies(&all), bodies(&dash));
    assert_eq!(bodies(&all), bodies(&conv));
}

#[test]
fn empty_log_is_empty_for_every_viewer() {
    let room = test_room();
    let log: Vec<Message> = Vec::new();

    for mode in [ViewMode::Dashboard, ViewMode::All, ViewMode::Conversation("mallory".into())] {
        assert!(visible(&log, &room.roster, "dispatch", Role::Admin, &mode).is_empty());
    }
    assert!(visible(&log, &room.roster, "stranger", Role::User, &ViewMode::All).is_empty());
}

#[test]
fn watcher_rule_matches_roles() {
    let room = test_room();
    let third_party = dm("rivera", "dispatch", "private to staff");
    let staff_note = msg("dispatch", "heads up");

    assert!(watcher_can_see(&third_party, &room.roster, "dispatch", Role::Admin));
    assert!(!watcher_can_see(&third_party, &room.roster, "mallory", Role::User));
    assert!(watcher_can_see(&staff_note, &room.roster, "mallory", Role::User));
}
