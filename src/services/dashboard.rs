//! Per-sender aggregates for the admin dashboard.
//!
//! DESIGN
//! ======
//! Dashboard mode shows no message stream. Instead each active sender gets
//! a row of statistics computed here: total message count, unread count
//! from the viewer's perspective, and the latest entry of the two-way
//! conversation for previews. All functions are pure reads over the log;
//! an empty log produces zero rows and zero totals.

use serde::{Deserialize, Serialize};

use crate::identity::display_code;
use crate::message::Message;
use crate::state::Roster;

// =============================================================================
// AGGREGATES
// =============================================================================

/// Distinct senders in first-appearance order, excluding system lines,
/// designated bots, and the viewer.
#[must_use]
pub fn active_senders<'a>(log: &'a [Message], roster: &Roster, viewer: &str) -> Vec<&'a str> {
    let mut senders: Vec<&str> = Vec::new();
    for msg in log {
        let sender = msg.sender.as_str();
        if msg.is_system() || roster.is_bot(sender) || sender == viewer {
            continue;
        }
        if !senders.contains(&sender) {
            senders.push(sender);
        }
    }
    senders
}

/// Unread messages from `sender` that reach `viewer` (addressed to them or
/// broadcast).
#[must_use]
pub fn unread_from(log: &[Message], viewer: &str, sender: &str) -> usize {
    log.iter()
        .filter(|m| m.sender == sender && !m.read && m.reaches(viewer))
        .count()
}

/// Latest entry of the two-way conversation between `viewer` and `sender`.
#[must_use]
pub fn last_message<'a>(log: &'a [Message], viewer: &str, sender: &str) -> Option<&'a Message> {
    log.iter().rev().find(|m| {
        (m.sender == sender && m.reaches(viewer))
            || (m.sender == viewer && m.is_addressed_to(sender))
    })
}

/// All log entries authored by `sender`, regardless of recipient.
#[must_use]
pub fn message_count(log: &[Message], sender: &str) -> usize {
    log.iter().filter(|m| m.sender == sender).count()
}

// =============================================================================
// SUMMARY
// =============================================================================

/// One dashboard row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SenderStats {
    pub sender: String,
    /// Display code shown next to the name, derived from the identity.
    pub code: String,
    pub messages: usize,
    pub unread: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last: Option<Message>,
}

/// Aggregate view an admin lands on: one row per active sender plus the
/// whole-log total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    pub senders: Vec<SenderStats>,
    pub total_messages: usize,
}

/// Assemble the dashboard for `viewer` over the full log.
#[must_use]
pub fn dashboard(log: &[Message], roster: &Roster, viewer: &str) -> Dashboard {
    let senders = active_senders(log, roster, viewer)
        .into_iter()
        .map(|sender| SenderStats {
            sender: sender.to_string(),
            code: display_code(sender),
            messages: message_count(log, sender),
            unread: unread_from(log, viewer, sender),
            last: last_message(log, viewer, sender).cloned(),
        })
        .collect();
    Dashboard { senders, total_messages: log.len() }
}

#[cfg(test)]
#[path = "dashboard_test.rs"]
mod tests;
