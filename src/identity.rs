//! Identities, roles, and display codes.
//!
//! DESIGN
//! ======
//! Role is explicit data supplied by the session layer, never inferred from
//! the identity string. The filter and aggregate code treat identities as
//! opaque strings; the only two names with built-in meaning are the system
//! author and the default bot.

use serde::{Deserialize, Serialize};

/// Identity that authors system messages. Always visible to every viewer.
pub const SYSTEM: &str = "System";

/// Default designated bot identity. Rooms may register additional bots.
pub const DEFAULT_BOT: &str = "ChatBot";

/// Viewer/participant role. Opaque to the filter beyond admin-or-not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    #[must_use]
    pub fn is_admin(self) -> bool {
        matches!(self, Role::Admin)
    }
}

/// A named identity with its explicit role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub name: String,
    pub role: Role,
}

impl Participant {
    pub fn new(name: impl Into<String>, role: Role) -> Self {
        Self { name: name.into(), role }
    }

    #[must_use]
    pub fn user(name: impl Into<String>) -> Self {
        Self::new(name, Role::User)
    }

    #[must_use]
    pub fn admin(name: impl Into<String>) -> Self {
        Self::new(name, Role::Admin)
    }
}

// =============================================================================
// DISPLAY CODE
// =============================================================================

/// Deterministic operator-facing code for an identity.
///
/// 31-based rolling hash over the name's UTF-16 code units, wrapped to i32
/// at every step, rendered as `USR` plus the absolute value zero-padded to
/// six digits. Not a security token; collisions are acceptable.
#[must_use]
pub fn display_code(name: &str) -> String {
    let mut hash: i32 = 0;
    for unit in name.encode_utf16() {
        hash = hash.wrapping_mul(31).wrapping_add(i32::from(unit));
    }
    format!("USR{:06}", hash.unsigned_abs())
}

#[cfg(test)]
#[path = "identity_test.rs"]
mod tests;
