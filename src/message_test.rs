use super::*;

#[test]
fn new_sets_fields() {
    let msg = Message::new("mallory", "hello there");
    assert_eq!(msg.sender, "mallory");
    assert_eq!(msg.body, "hello there");
    assert!(msg.recipient.is_none());
    assert!(!msg.delivered);
    assert!(!msg.read);
    assert!(msg.ts > 0);
}

#[test]
fn builders_compose() {
    let msg = Message::new("agent", "on it").with_recipient("mallory").with_ts(1_700_000_000_000).as_delivered();
    assert_eq!(msg.recipient.as_deref(), Some("mallory"));
    assert_eq!(msg.ts, 1_700_000_000_000);
    assert!(msg.delivered);
    assert!(!msg.read);
}

#[test]
fn as_read_implies_delivered() {
    let msg = Message::new("System", "welcome").as_read();
    assert!(msg.delivered);
    assert!(msg.read);
}

#[test]
fn broadcast_and_addressing_predicates() {
    let broadcast = Message::new("mallory", "anyone there?");
    assert!(broadcast.is_broadcast());
    assert!(broadcast.reaches("agent"));
    assert!(!broadcast.is_addressed_to("agent"));

    let private = Message::new("agent", "yes").with_recipient("mallory");
    assert!(!private.is_broadcast());
    assert!(private.is_addressed_to("mallory"));
    assert!(private.reaches("mallory"));
    assert!(!private.reaches("eve"));
}

#[test]
fn system_predicate_matches_exact_identity() {
    assert!(Message::new("System", "hi").is_system());
    assert!(!Message::new("system", "hi").is_system());
    assert!(!Message::new("mallory", "hi").is_system());
}

#[test]
fn flag_transitions_are_monotone() {
    let mut msg = Message::new("mallory", "x");

    assert!(msg.mark_delivered());
    assert!(!msg.mark_delivered());
    assert!(msg.delivered);

    assert!(msg.mark_read());
    assert!(!msg.mark_read());
    assert!(msg.read);
}

#[test]
fn mark_read_implies_delivered() {
    let mut msg = Message::new("mallory", "x");
    assert!(msg.mark_read());
    assert!(msg.delivered);
}

#[test]
fn json_round_trip() {
    let original = Message::new("agent", "checking now").with_recipient("mallory").as_delivered();
    let json = serde_json::to_string(&original).expect("serialize");
    let restored: Message = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(restored, original);
}

#[test]
fn broadcast_omits_recipient_field_in_json() {
    let json = serde_json::to_string(&Message::new("mallory", "hi")).expect("serialize");
    assert!(!json.contains("recipient"));
}
