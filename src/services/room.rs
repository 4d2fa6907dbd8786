//! Room service — join/part, append, and read-state transitions.
//!
//! DESIGN
//! ======
//! Operations are synchronous functions over `&mut RoomState`; the engine
//! command loop serializes all calls, so apply-order is arrival order and
//! appends are atomic. Every mutation fans a `RoomEvent` out to
//! subscribed watchers, with message events filtered per watcher by the
//! visibility rules.
//!
//! ERROR HANDLING
//! ==============
//! Body validation and unknown ids are typed errors. Fan-out is
//! best-effort and never fails the operation: a watcher with a full or
//! closed channel misses the event.

use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::event::RoomEvent;
use crate::identity::{Participant, Role, SYSTEM};
use crate::message::{MAX_BODY_LEN, Message, now_ms};
use crate::services::visibility::watcher_can_see;
use crate::state::{RoomState, WATCHER_CHANNEL_CAPACITY, Watcher};

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    #[error("message body is empty")]
    EmptyBody,
    #[error("message body too long: {got} chars (max {max})")]
    BodyTooLong { max: usize, got: usize },
    #[error("message not found: {0}")]
    MessageNotFound(Uuid),
    #[error("unknown sender: {0}")]
    UnknownSender(String),
}

impl crate::event::ErrorCode for RoomError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::EmptyBody => "E_EMPTY_BODY",
            Self::BodyTooLong { .. } => "E_BODY_TOO_LONG",
            Self::MessageNotFound(_) => "E_MESSAGE_NOT_FOUND",
            Self::UnknownSender(_) => "E_UNKNOWN_SENDER",
        }
    }
}

// =============================================================================
// WELCOME SEEDING
// =============================================================================

/// Backdates for the seeded system pair, so the greeting reads as
/// pre-existing room history.
const WELCOME_BACKDATE_MS: i64 = 120_000;
const ORIENTATION_BACKDATE_MS: i64 = 60_000;

const ADMIN_ORIENTATION: &str =
    "You have admin privileges. Click on any user to start a private conversation.";
const USER_ORIENTATION: &str =
    "You can chat with support staff here. Your messages are private.";

/// Seed the two system welcome messages for a fresh room. The orientation
/// line depends on the role of the first participant to arrive. Both are
/// stamped delivered and read.
pub fn seed_welcome(room: &mut RoomState, first: &Participant) {
    let greeting = format!("Welcome to {}! 🎉", room.name);
    let orientation = match first.role {
        Role::Admin => ADMIN_ORIENTATION,
        Role::User => USER_ORIENTATION,
    };
    let now = now_ms();
    room.log.push(Message::new(SYSTEM, greeting).with_ts(now - WELCOME_BACKDATE_MS).as_read());
    room.log
        .push(Message::new(SYSTEM, orientation).with_ts(now - ORIENTATION_BACKDATE_MS).as_read());
    debug!(room = %room.name, "seeded welcome messages");
}

// =============================================================================
// JOIN / PART
// =============================================================================

/// Join a room: register the participant on the roster and subscribe a
/// watcher channel. Other watchers are notified; the joiner reads history
/// through the visibility queries.
pub fn join(room: &mut RoomState, participant: Participant) -> (Uuid, mpsc::Receiver<RoomEvent>) {
    let (tx, rx) = mpsc::channel(WATCHER_CHANNEL_CAPACITY);
    let watcher_id = Uuid::new_v4();
    room.roster.upsert(participant.clone());
    room.watchers.insert(watcher_id, Watcher { participant: participant.clone(), tx });
    info!(
        room = %room.name,
        name = %participant.name,
        connected = room.watchers.len(),
        "participant joined"
    );
    broadcast(room, &RoomEvent::ParticipantJoined { participant }, Some(watcher_id));
    (watcher_id, rx)
}

/// Record a scripted participant's arrival. No watcher channel is created;
/// the participant exists only on the roster.
pub fn arrive(room: &mut RoomState, participant: Participant) {
    room.roster.upsert(participant.clone());
    info!(room = %room.name, name = %participant.name, "participant arrived");
    broadcast(room, &RoomEvent::ParticipantJoined { participant }, None);
}

/// Unsubscribe a watcher. When no remaining watcher authenticates as the
/// same participant, the participant leaves the roster and the rest are
/// notified. Returns `true` when the room has no watchers left; the
/// caller is responsible for aborting timers and evicting the room.
pub fn part(room: &mut RoomState, watcher_id: Uuid) -> bool {
    let Some(watcher) = room.watchers.remove(&watcher_id) else {
        return room.watchers.is_empty();
    };
    let name = watcher.participant.name;
    let still_connected = room.watchers.values().any(|w| w.participant.name == name);
    if !still_connected && room.roster.remove(&name) {
        broadcast(room, &RoomEvent::ParticipantParted { name: name.clone() }, None);
    }
    info!(room = %room.name, %name, remaining = room.watchers.len(), "participant left");
    room.watchers.is_empty()
}

// =============================================================================
// APPEND
// =============================================================================

/// Append a message to the log and fan it out to permitted watchers.
///
/// The body is trimmed before validation; the stored message is stamped
/// delivered. Senders must be on the roster, a designated bot, or the
/// system author.
///
/// # Errors
///
/// Returns a validation error for an empty or oversized body or an
/// unknown sender.
pub fn post(
    room: &mut RoomState,
    sender: &str,
    body: &str,
    recipient: Option<String>,
    exclude: Option<Uuid>,
) -> Result<Message, RoomError> {
    if room.roster.get(sender).is_none() && !room.roster.is_bot(sender) && sender != SYSTEM {
        return Err(RoomError::UnknownSender(sender.to_string()));
    }
    let body = body.trim();
    if body.is_empty() {
        return Err(RoomError::EmptyBody);
    }
    let got = body.chars().count();
    if got > MAX_BODY_LEN {
        return Err(RoomError::BodyTooLong { max: MAX_BODY_LEN, got });
    }

    let mut message = Message::new(sender, body).as_delivered();
    if let Some(recipient) = recipient {
        message = message.with_recipient(recipient);
    }
    room.log.push(message.clone());
    info!(
        room = %room.name,
        %sender,
        private = message.recipient.is_some(),
        "message appended"
    );
    broadcast(room, &RoomEvent::MessagePosted { message: message.clone() }, exclude);
    Ok(message)
}

// =============================================================================
// READ STATE
// =============================================================================

/// Mark a message delivered. Returns whether the flag changed.
///
/// # Errors
///
/// Returns `MessageNotFound` if no message has this id.
pub fn mark_delivered(room: &mut RoomState, id: Uuid) -> Result<bool, RoomError> {
    let msg =
        room.log.iter_mut().find(|m| m.id == id).ok_or(RoomError::MessageNotFound(id))?;
    Ok(msg.mark_delivered())
}

/// Mark a message read (implies delivered). Returns whether the flag
/// changed.
///
/// # Errors
///
/// Returns `MessageNotFound` if no message has this id.
pub fn mark_read(room: &mut RoomState, id: Uuid) -> Result<bool, RoomError> {
    let msg =
        room.log.iter_mut().find(|m| m.id == id).ok_or(RoomError::MessageNotFound(id))?;
    Ok(msg.mark_read())
}

/// Bulk read transition for every unread message from `counterpart` that
/// reaches `viewer`. This is what opening a private conversation does.
/// Watchers are notified when anything changed. Returns the count.
pub fn mark_conversation_read(room: &mut RoomState, viewer: &str, counterpart: &str) -> usize {
    let mut count = 0;
    for msg in &mut room.log {
        if msg.sender == counterpart && msg.reaches(viewer) && msg.mark_read() {
            count += 1;
        }
    }
    if count > 0 {
        info!(
            room = %room.name,
            reader = %viewer,
            sender = %counterpart,
            count,
            "conversation marked read"
        );
        let event = RoomEvent::MessagesRead {
            reader: viewer.to_string(),
            sender: counterpart.to_string(),
            count,
        };
        broadcast(room, &event, None);
    }
    count
}

// =============================================================================
// QUERIES
// =============================================================================

/// Connected watcher count.
#[must_use]
pub fn connected(room: &RoomState) -> usize {
    room.watchers.len()
}

/// Roster members holding the admin role, in join order.
#[must_use]
pub fn admins(room: &RoomState) -> Vec<&Participant> {
    room.roster.iter().filter(|p| p.role.is_admin()).collect()
}

/// First roster admin that has authored a message, if any.
#[must_use]
pub fn active_admin(room: &RoomState) -> Option<&Participant> {
    admins(room).into_iter().find(|p| room.log.iter().any(|m| m.sender == p.name))
}

// =============================================================================
// BROADCAST
// =============================================================================

/// Fan an event out to watchers, optionally excluding one. Message events
/// are filtered per watcher by the visibility rules; everything else goes
/// to all watchers. Best-effort: a full or closed channel drops the event.
pub fn broadcast(room: &RoomState, event: &RoomEvent, exclude: Option<Uuid>) {
    for (watcher_id, watcher) in &room.watchers {
        if exclude == Some(*watcher_id) {
            continue;
        }
        if let RoomEvent::MessagePosted { message } = event {
            if !watcher_can_see(
                message,
                &room.roster,
                &watcher.participant.name,
                watcher.participant.role,
            ) {
                continue;
            }
        }
        if watcher.tx.try_send(event.clone()).is_err() {
            warn!(room = %room.name, watcher = %watcher_id, "dropped event for slow watcher");
        }
    }
}

#[cfg(test)]
#[path = "room_test.rs"]
mod tests;
