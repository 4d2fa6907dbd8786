//! Message — the chat log entry type.
//!
//! DESIGN
//! ======
//! Every room owns an append-only log of `Message` values. A message with a
//! recipient is private traffic between two identities; a message without
//! one is a broadcast that all staff can see. Once appended, the only legal
//! mutation is flipping `delivered` or `read` from false to true — bodies,
//! senders, and timestamps never change, and entries are never removed.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum body length in characters, counted after trimming.
pub const MAX_BODY_LEN: usize = 500;

/// Current time as milliseconds since Unix epoch.
#[must_use]
pub fn now_ms() -> i64 {
    let Ok(dur) = SystemTime::now().duration_since(UNIX_EPOCH) else {
        return 0;
    };
    i64::try_from(dur.as_millis()).unwrap_or(0)
}

/// One entry in a room's message log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    /// Sender identity.
    pub sender: String,
    pub body: String,
    /// Milliseconds since Unix epoch. Set automatically at construction.
    pub ts: i64,
    /// Absent = broadcast.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient: Option<String>,
    pub delivered: bool,
    pub read: bool,
}

// =============================================================================
// CONSTRUCTORS
// =============================================================================

impl Message {
    /// Create an undelivered, unread broadcast message.
    pub fn new(sender: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender: sender.into(),
            body: body.into(),
            ts: now_ms(),
            recipient: None,
            delivered: false,
            read: false,
        }
    }

    /// Address the message to a single recipient.
    #[must_use]
    pub fn with_recipient(mut self, recipient: impl Into<String>) -> Self {
        self.recipient = Some(recipient.into());
        self
    }

    /// Override the creation timestamp (milliseconds since Unix epoch).
    #[must_use]
    pub fn with_ts(mut self, ts: i64) -> Self {
        self.ts = ts;
        self
    }

    /// Mark the message delivered at construction.
    #[must_use]
    pub fn as_delivered(mut self) -> Self {
        self.delivered = true;
        self
    }

    /// Mark the message delivered and read at construction.
    #[must_use]
    pub fn as_read(mut self) -> Self {
        self.delivered = true;
        self.read = true;
        self
    }
}

// =============================================================================
// PREDICATES
// =============================================================================

impl Message {
    /// No recipient set.
    #[must_use]
    pub fn is_broadcast(&self) -> bool {
        self.recipient.is_none()
    }

    /// Explicitly addressed to `name`.
    #[must_use]
    pub fn is_addressed_to(&self, name: &str) -> bool {
        self.recipient.as_deref() == Some(name)
    }

    /// Addressed to `name` or broadcast.
    #[must_use]
    pub fn reaches(&self, name: &str) -> bool {
        self.is_broadcast() || self.is_addressed_to(name)
    }

    /// Authored by the system identity.
    #[must_use]
    pub fn is_system(&self) -> bool {
        self.sender == crate::identity::SYSTEM
    }
}

// =============================================================================
// FLAG TRANSITIONS
// =============================================================================

impl Message {
    /// Flip `delivered` to true. Returns whether the flag changed.
    pub fn mark_delivered(&mut self) -> bool {
        let changed = !self.delivered;
        self.delivered = true;
        changed
    }

    /// Flip `read` to true. A read message is necessarily delivered.
    /// Returns whether the read flag changed.
    pub fn mark_read(&mut self) -> bool {
        self.delivered = true;
        let changed = !self.read;
        self.read = true;
        changed
    }
}

#[cfg(test)]
#[path = "message_test.rs"]
mod tests;
