//! Room events delivered to subscribed watchers.
//!
//! DESIGN
//! ======
//! A watcher is a presentation-layer subscriber holding the receiving end
//! of a per-watcher channel. The engine fans every state change out as a
//! `RoomEvent`, applying the visibility rules per watcher, so a consumer
//! only ever sees events it would be allowed to render.

use serde::{Deserialize, Serialize};

use crate::identity::Participant;
use crate::message::Message;
use crate::settings::ChatSettings;

/// State change pushed to room watchers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RoomEvent {
    /// A message was appended to the log.
    MessagePosted { message: Message },
    /// A participant joined the room (human or scripted).
    ParticipantJoined { participant: Participant },
    /// A participant left the room.
    ParticipantParted { name: String },
    /// `reader` marked `count` messages from `sender` as read.
    MessagesRead { reader: String, sender: String, count: usize },
    /// The engine-wide settings changed.
    SettingsUpdated { settings: ChatSettings },
}

// =============================================================================
// ERROR CODES
// =============================================================================

/// Grepable error code and retryable flag for engine errors.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    fn retryable(&self) -> bool {
        false
    }
}

#[cfg(test)]
#[path = "event_test.rs"]
mod tests;
