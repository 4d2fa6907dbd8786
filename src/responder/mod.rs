//! Responder — injectable counterpart simulation.
//!
//! DESIGN
//! ======
//! The simulated other party is an interface, not a hard-wired timer.
//! Given a freshly posted message, a responder asynchronously decides on
//! zero or one reply and how long to wait before it lands. The engine
//! owns the actual scheduling, so a deterministic test double with zero
//! delay runs instantly and a real backend can be swapped in unchanged.

pub mod scripted;

use std::time::Duration;

use crate::identity::{Participant, Role};
use crate::message::Message;

pub use scripted::ScriptedResponder;

// =============================================================================
// ERROR
// =============================================================================

/// Errors produced by responder implementations.
#[derive(Debug, thiserror::Error)]
pub enum ResponderError {
    /// The backing reply source failed.
    #[error("reply source failed: {0}")]
    Backend(String),
}

impl crate::event::ErrorCode for ResponderError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Backend(_) => "E_RESPONDER_BACKEND",
        }
    }

    fn retryable(&self) -> bool {
        true
    }
}

// =============================================================================
// RESPONDER TRAIT
// =============================================================================

/// A reply a responder wants appended after a bounded delay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledReply {
    pub sender: String,
    /// `None` posts the reply as a broadcast.
    pub recipient: Option<String>,
    pub body: String,
    pub delay: Duration,
}

/// Produces replies from the "other side" of a conversation. Enables
/// deterministic doubles in tests.
#[async_trait::async_trait]
pub trait Responder: Send + Sync {
    /// Decide on zero or one reply to a freshly posted message.
    ///
    /// # Errors
    ///
    /// Returns a [`ResponderError`] when the backing reply source fails;
    /// the engine logs the failure and drops the reply.
    async fn reply_to(
        &self,
        message: &Message,
        sender_role: Role,
    ) -> Result<Option<ScheduledReply>, ResponderError>;
}

// =============================================================================
// PRESENCE SCRIPTS
// =============================================================================

/// Identity the simulated support desk posts under.
pub const SUPPORT_IDENTITY: &str = "Support Team";

/// Greeting the support desk sends a freshly joined user.
pub const SUPPORT_GREETING: &str = "Hello! How can we help you today?";

/// How long after the first human join scripted participants show up.
pub const PRESENCE_DELAY: Duration = Duration::from_secs(2);

const SIMULATED_USERS: [&str; 3] = ["Alice", "Bob", "Charlie"];

/// One scripted arrival: who shows up, how long after the first human
/// join, and an optional private greeting addressed to that human.
#[derive(Debug, Clone)]
pub struct ScriptedJoin {
    pub participant: Participant,
    pub delay: Duration,
    pub greeting: Option<String>,
}

/// Simulated presence for a fresh room.
#[derive(Debug, Clone, Default)]
pub struct PresenceScript {
    pub joins: Vec<ScriptedJoin>,
}

impl PresenceScript {
    /// No simulated arrivals.
    #[must_use]
    pub fn empty() -> Self {
        Self { joins: Vec::new() }
    }

    /// Default script for a room opened by `role`: admins see a handful
    /// of users drift in; users see the support desk arrive and greet
    /// them.
    #[must_use]
    pub fn for_role(role: Role) -> Self {
        let joins = match role {
            Role::Admin => SIMULATED_USERS
                .iter()
                .map(|name| ScriptedJoin {
                    participant: Participant::user(*name),
                    delay: PRESENCE_DELAY,
                    greeting: None,
                })
                .collect(),
            Role::User => vec![ScriptedJoin {
                participant: Participant::admin(SUPPORT_IDENTITY),
                delay: PRESENCE_DELAY,
                greeting: Some(SUPPORT_GREETING.to_string()),
            }],
        };
        Self { joins }
    }
}

#[cfg(test)]
#[path = "responder_test.rs"]
mod tests;
