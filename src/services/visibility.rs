//! Message visibility filter.
//!
//! DESIGN
//! ======
//! A pure function over the append-only log: given a viewer, their role,
//! and (for admins) a view mode, return references to the messages that
//! viewer may see, in insertion order. Roles come from the roster, never
//! from the shape of a name. Admins read everything in `All` mode and a
//! two-party slice in `Conversation` mode; users get one filtered stream
//! regardless of mode. The filter is total: an empty log, an unknown
//! viewer, or a counterpart with no traffic yields an empty result, and a
//! message with no relationship to the viewer is skipped silently.

use crate::identity::Role;
use crate::message::Message;
use crate::state::Roster;

// =============================================================================
// VIEW MODE
// =============================================================================

/// What slice of the room an admin is looking at. Users have no mode
/// selection; the engine passes `All` on their behalf and the filter
/// applies the user rule regardless.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewMode {
    /// Admin landing view: per-sender aggregates, no message stream.
    Dashboard,
    /// Every message in the room.
    All,
    /// Private view scoped to one counterpart identity.
    Conversation(String),
}

// =============================================================================
// FILTER
// =============================================================================

/// Messages `viewer` is authorized to see, in log order.
#[must_use]
pub fn visible<'a>(
    log: &'a [Message],
    roster: &Roster,
    viewer: &str,
    role: Role,
    mode: &ViewMode,
) -> Vec<&'a Message> {
    match role {
        Role::User => log.iter().filter(|m| user_can_see(m, roster, viewer)).collect(),
        Role::Admin => match mode {
            ViewMode::Dashboard => Vec::new(),
            ViewMode::All => log.iter().collect(),
            ViewMode::Conversation(counterpart) => log
                .iter()
                .filter(|m| in_conversation(m, viewer, counterpart))
                .collect(),
        },
    }
}

/// Two-party slice: traffic between `viewer` and `counterpart`, where the
/// counterpart's broadcasts count as addressed to the viewer, plus every
/// system line.
fn in_conversation(msg: &Message, viewer: &str, counterpart: &str) -> bool {
    if msg.is_system() {
        return true;
    }
    (msg.sender == counterpart && msg.reaches(viewer))
        || (msg.sender == viewer && msg.is_addressed_to(counterpart))
}

/// User rule: staff, the viewer's own messages, system lines, and
/// designated bots. Other users' traffic is invisible.
fn user_can_see(msg: &Message, roster: &Roster, viewer: &str) -> bool {
    msg.sender == viewer
        || msg.is_system()
        || roster.is_admin(&msg.sender)
        || roster.is_bot(&msg.sender)
}

/// Push-side predicate for event fan-out: may this watcher be shown this
/// message at all? Admins see everything; users see the user-rule subset.
#[must_use]
pub fn watcher_can_see(msg: &Message, roster: &Roster, viewer: &str, role: Role) -> bool {
    match role {
        Role::Admin => true,
        Role::User => user_can_see(msg, roster, viewer),
    }
}

#[cfg(test)]
#[path = "visibility_test.rs"]
mod tests;
