//! Engine state.
//!
//! DESIGN
//! ======
//! `EngineState` is owned by the engine task and mutated only from its
//! command loop, so no locking is needed. Each room holds an append-only
//! message log, a roster in join order, connected watchers keyed by
//! subscription ID, and the handles of any pending reply timers so they
//! can be aborted when the room is torn down.

use std::collections::HashMap;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::event::RoomEvent;
use crate::identity::{DEFAULT_BOT, Participant, Role};
use crate::message::Message;
use crate::settings::ChatSettings;

/// Outgoing event buffer per watcher. Slow consumers drop events rather
/// than stalling the engine loop.
pub const WATCHER_CHANNEL_CAPACITY: usize = 256;

// =============================================================================
// ROSTER
// =============================================================================

/// Room participants in join order, plus the designated bot identities.
///
/// The roster is the authority for roles. Visibility never inspects a
/// name's shape, only the role recorded here.
#[derive(Debug, Clone)]
pub struct Roster {
    participants: Vec<Participant>,
    bots: Vec<String>,
}

impl Roster {
    #[must_use]
    pub fn new() -> Self {
        Self { participants: Vec::new(), bots: vec![DEFAULT_BOT.to_string()] }
    }

    /// Add a participant, or update the role of an existing one in place.
    /// Returns `true` if the participant was not already present.
    pub fn upsert(&mut self, participant: Participant) -> bool {
        if let Some(existing) =
            self.participants.iter_mut().find(|p| p.name == participant.name)
        {
            existing.role = participant.role;
            return false;
        }
        self.participants.push(participant);
        true
    }

    /// Remove a participant by name. Returns `true` if one was removed.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.participants.len();
        self.participants.retain(|p| p.name != name);
        self.participants.len() != before
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Participant> {
        self.participants.iter().find(|p| p.name == name)
    }

    #[must_use]
    pub fn role_of(&self, name: &str) -> Option<Role> {
        self.get(name).map(|p| p.role)
    }

    #[must_use]
    pub fn is_admin(&self, name: &str) -> bool {
        self.role_of(name) == Some(Role::Admin)
    }

    /// Whether `name` is a designated bot identity. Bot messages are
    /// visible to everyone regardless of role.
    #[must_use]
    pub fn is_bot(&self, name: &str) -> bool {
        self.bots.iter().any(|b| b == name)
    }

    /// Register an additional bot identity.
    pub fn register_bot(&mut self, name: impl Into<String>) {
        let name = name.into();
        if !self.is_bot(&name) {
            self.bots.push(name);
        }
    }

    /// Participants in join order.
    pub fn iter(&self) -> impl Iterator<Item = &Participant> {
        self.participants.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.participants.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }
}

impl Default for Roster {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// ROOM STATE
// =============================================================================

/// A connected subscriber: the participant it authenticates as and the
/// sender half of its event channel.
#[derive(Debug)]
pub struct Watcher {
    pub participant: Participant,
    pub tx: mpsc::Sender<RoomEvent>,
}

/// Per-room live state.
pub struct RoomState {
    pub name: String,
    /// Append-only message log in insertion order.
    pub log: Vec<Message>,
    pub roster: Roster,
    /// Connected watchers: subscription ID -> watcher.
    pub watchers: HashMap<Uuid, Watcher>,
    /// Pending simulation timers. Aborted when the room is evicted.
    pub timers: Vec<JoinHandle<()>>,
}

impl RoomState {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            log: Vec::new(),
            roster: Roster::new(),
            watchers: HashMap::new(),
            timers: Vec::new(),
        }
    }
}

// =============================================================================
// ENGINE STATE
// =============================================================================

/// Top-level state owned by the engine task.
pub struct EngineState {
    /// Live rooms keyed by name. A room exists while it has watchers.
    pub rooms: HashMap<String, RoomState>,
    pub settings: ChatSettings,
}

impl EngineState {
    #[must_use]
    pub fn new(settings: ChatSettings) -> Self {
        Self { rooms: HashMap::new(), settings }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================

#[cfg(test)]
pub mod test_helpers {
    use super::*;

    /// Room with one admin ("dispatch") and one user ("mallory") on the roster.
    #[must_use]
    pub fn test_room() -> RoomState {
        let mut room = RoomState::new("support-desk");
        room.roster.upsert(Participant::admin("dispatch"));
        room.roster.upsert(Participant::user("mallory"));
        room
    }

    /// Delivered broadcast message, as the room service would append it.
    #[must_use]
    pub fn msg(sender: &str, body: &str) -> Message {
        Message::new(sender, body).as_delivered()
    }

    /// Delivered private message.
    #[must_use]
    pub fn dm(sender: &str, recipient: &str, body: &str) -> Message {
        Message::new(sender, body).with_recipient(recipient).as_delivered()
    }

    /// Watcher wired to a fresh channel, plus the receiving end.
    #[must_use]
    pub fn channel_watcher(
        participant: Participant,
    ) -> (Watcher, mpsc::Receiver<RoomEvent>) {
        let (tx, rx) = mpsc::channel(WATCHER_CHANNEL_CAPACITY);
        (Watcher { participant, tx }, rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roster_keeps_join_order() {
        let mut roster = Roster::new();
        roster.upsert(Participant::user("mallory"));
        roster.upsert(Participant::admin("dispatch"));
        roster.upsert(Participant::user("rivera"));

        let names: Vec<&str> = roster.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["mallory", "dispatch", "rivera"]);
    }

    #[test]
    fn upsert_updates_role_without_duplicating() {
        let mut roster = Roster::new();
        assert!(roster.upsert(Participant::user("rivera")));
        assert!(!roster.upsert(Participant::admin("rivera")));

        assert_eq!(roster.len(), 1);
        assert!(roster.is_admin("rivera"));
    }

    #[test]
    fn remove_reports_membership() {
        let mut roster = Roster::new();
        roster.upsert(Participant::user("mallory"));

        assert!(roster.remove("mallory"));
        assert!(!roster.remove("mallory"));
        assert!(roster.is_empty());
    }

    #[test]
    fn default_bot_is_registered() {
        let roster = Roster::new();
        assert!(roster.is_bot(DEFAULT_BOT));
        assert!(!roster.is_bot("mallory"));
    }

    #[test]
    fn register_bot_is_idempotent() {
        let mut roster = Roster::new();
        roster.register_bot("TriageBot");
        roster.register_bot("TriageBot");

        assert!(roster.is_bot("TriageBot"));
        assert_eq!(roster.bots.len(), 2);
    }

    #[test]
    fn new_room_is_empty() {
        let room = RoomState::new("support-desk");
        assert!(room.log.is_empty());
        assert!(room.watchers.is_empty());
        assert!(room.timers.is_empty());
        assert_eq!(room.name, "support-desk");
    }
}
