//! Scripted responder — canned acknowledgement pools with random delays.
//!
//! DESIGN
//! ======
//! Mirrors a demo support desk. A private message from staff always draws
//! an acknowledgement from its recipient; a user broadcast sometimes
//! draws a support reply. Pool picks and delays use thread-local
//! randomness, so output is probabilistic by construction and tests
//! assert on shape and bounds rather than exact text.

use std::ops::Range;
use std::time::Duration;

use rand::Rng;

use super::{Responder, ResponderError, SUPPORT_IDENTITY, ScheduledReply};
use crate::identity::Role;
use crate::message::Message;

// =============================================================================
// REPLY POOLS
// =============================================================================

pub(super) const PRIVATE_REPLIES: [&str; 5] = [
    "Thanks for reaching out!",
    "I'll help you with that.",
    "Let me check on that for you.",
    "Sure, I can assist with that.",
    "Got it, working on it now.",
];

pub(super) const SUPPORT_REPLIES: [&str; 4] = [
    "Thank you for your message. We'll get back to you shortly.",
    "We've received your request and are reviewing it.",
    "Our team will assist you with this issue.",
    "Thanks for contacting support!",
];

/// Chance that a user broadcast draws a support reply.
const SUPPORT_REPLY_PROBABILITY: f64 = 0.4;

const PRIVATE_DELAY_MS: Range<u64> = 1000..3000;
const SUPPORT_DELAY_MS: Range<u64> = 1500..3500;

// =============================================================================
// RESPONDER
// =============================================================================

/// Default simulation: canned pools, randomized delays.
#[derive(Debug, Default)]
pub struct ScriptedResponder;

#[async_trait::async_trait]
impl Responder for ScriptedResponder {
    async fn reply_to(
        &self,
        message: &Message,
        sender_role: Role,
    ) -> Result<Option<ScheduledReply>, ResponderError> {
        if message.is_system() {
            return Ok(None);
        }
        let mut rng = rand::rng();
        match sender_role {
            Role::Admin => {
                // The counterpart of a private staff message always
                // acknowledges; broadcasts from staff draw nothing.
                let Some(recipient) = message.recipient.as_deref() else {
                    return Ok(None);
                };
                let body = PRIVATE_REPLIES[rng.random_range(0..PRIVATE_REPLIES.len())];
                Ok(Some(ScheduledReply {
                    sender: recipient.to_string(),
                    recipient: Some(message.sender.clone()),
                    body: body.to_string(),
                    delay: Duration::from_millis(rng.random_range(PRIVATE_DELAY_MS)),
                }))
            }
            Role::User => {
                if message.recipient.is_some()
                    || !rng.random_bool(SUPPORT_REPLY_PROBABILITY)
                {
                    return Ok(None);
                }
                let body = SUPPORT_REPLIES[rng.random_range(0..SUPPORT_REPLIES.len())];
                Ok(Some(ScheduledReply {
                    sender: SUPPORT_IDENTITY.to_string(),
                    recipient: Some(message.sender.clone()),
                    body: body.to_string(),
                    delay: Duration::from_millis(rng.random_range(SUPPORT_DELAY_MS)),
                }))
            }
        }
    }
}
