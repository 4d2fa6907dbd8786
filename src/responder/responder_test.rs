use super::*;
use super::scripted::{PRIVATE_REPLIES, SUPPORT_REPLIES};

#[test]
fn admin_script_brings_simulated_users() {
    let script = PresenceScript::for_role(Role::Admin);

    assert_eq!(script.joins.len(), 3);
    for join in &script.joins {
        assert_eq!(join.participant.role, Role::User);
        assert_eq!(join.delay, PRESENCE_DELAY);
        assert!(join.greeting.is_none());
    }
    let names: Vec<&str> = script.joins.iter().map(|j| j.participant.name.as_str()).collect();
    assert_eq!(names, vec!["Alice", "Bob", "Charlie"]);
}

#[test]
fn user_script_brings_support_desk_with_greeting() {
    let script = PresenceScript::for_role(Role::User);

    assert_eq!(script.joins.len(), 1);
    let join = &script.joins[0];
    assert_eq!(join.participant.name, SUPPORT_IDENTITY);
    assert_eq!(join.participant.role, Role::Admin);
    assert_eq!(join.greeting.as_deref(), Some(SUPPORT_GREETING));
}

#[test]
fn empty_script_schedules_nothing() {
    assert!(PresenceScript::empty().joins.is_empty());
    assert!(PresenceScript::default().joins.is_empty());
}

#[tokio::test]
async fn private_staff_message_always_draws_counterpart_ack() {
    let responder = ScriptedResponder;
    let message = Message::new("dispatch", "checking in").with_recipient("mallory");

    let reply = responder.reply_to(&message, Role::Admin).await.unwrap().unwrap();
    assert_eq!(reply.sender, "mallory");
    assert_eq!(reply.recipient.as_deref(), Some("dispatch"));
    assert!(PRIVATE_REPLIES.contains(&reply.body.as_str()));
    assert!(reply.delay >= Duration::from_millis(1000));
    assert!(reply.delay < Duration::from_millis(3000));
}

#[tokio::test]
async fn staff_broadcast_draws_nothing() {
    let responder = ScriptedResponder;
    let message = Message::new("dispatch", "heads up all");

    assert!(responder.reply_to(&message, Role::Admin).await.unwrap().is_none());
}

#[tokio::test]
async fn system_lines_never_draw_replies() {
    let responder = ScriptedResponder;
    let message = Message::new(crate::identity::SYSTEM, "maintenance tonight");

    assert!(responder.reply_to(&message, Role::Admin).await.unwrap().is_none());
    assert!(responder.reply_to(&message, Role::User).await.unwrap().is_none());
}

#[tokio::test]
async fn user_private_message_draws_nothing() {
    let responder = ScriptedResponder;
    let message = Message::new("mallory", "just for you").with_recipient("dispatch");

    assert!(responder.reply_to(&message, Role::User).await.unwrap().is_none());
}

#[tokio::test]
async fn user_broadcast_sometimes_draws_a_support_reply() {
    let responder = ScriptedResponder;
    let message = Message::new("mallory", "my order is stuck");

    let mut saw_reply = false;
    let mut saw_silence = false;
    for _ in 0..200 {
        match responder.reply_to(&message, Role::User).await.unwrap() {
            Some(reply) => {
                saw_reply = true;
                assert_eq!(reply.sender, SUPPORT_IDENTITY);
                assert_eq!(reply.recipient.as_deref(), Some("mallory"));
                assert!(SUPPORT_REPLIES.contains(&reply.body.as_str()));
                assert!(reply.delay >= Duration::from_millis(1500));
                assert!(reply.delay < Duration::from_millis(3500));
            }
            None => saw_silence = true,
        }
    }
    // 200 draws at 0.4 make both outcomes a statistical certainty.
    assert!(saw_reply);
    assert!(saw_silence);
}
