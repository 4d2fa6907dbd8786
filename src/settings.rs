//! Chat settings — an explicitly passed configuration object.
//!
//! DESIGN
//! ======
//! Settings are plain data owned by the engine and handed to whoever needs
//! them; nothing reads them from ambient context. Updates arrive as a
//! `SettingsPatch` with every field optional and merge last-write-wins.

use serde::{Deserialize, Serialize};

const DEFAULT_ALLOW_EMOJIS: bool = true;
const DEFAULT_ALLOW_FILE_SHARING: bool = true;
const DEFAULT_MUTE_NOTIFICATIONS: bool = false;

/// UI color scheme preference carried alongside the behavioral toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
}

impl std::str::FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(format!("unknown theme: {other}")),
        }
    }
}

/// Room-wide feature toggles and presentation preferences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatSettings {
    pub allow_emojis: bool,
    pub allow_file_sharing: bool,
    pub mute_notifications: bool,
    pub theme: Theme,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            allow_emojis: DEFAULT_ALLOW_EMOJIS,
            allow_file_sharing: DEFAULT_ALLOW_FILE_SHARING,
            mute_notifications: DEFAULT_MUTE_NOTIFICATIONS,
            theme: Theme::Dark,
        }
    }
}

impl ChatSettings {
    /// Load settings from `CHATDESK_*` environment variables, falling back
    /// to defaults for anything unset or unparsable.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            allow_emojis: env_parse("CHATDESK_ALLOW_EMOJIS", defaults.allow_emojis),
            allow_file_sharing: env_parse("CHATDESK_ALLOW_FILE_SHARING", defaults.allow_file_sharing),
            mute_notifications: env_parse("CHATDESK_MUTE_NOTIFICATIONS", defaults.mute_notifications),
            theme: env_parse("CHATDESK_THEME", defaults.theme),
        }
    }

    /// Merge a partial update, last write wins.
    pub fn apply(&mut self, patch: &SettingsPatch) {
        if let Some(allow_emojis) = patch.allow_emojis {
            self.allow_emojis = allow_emojis;
        }
        if let Some(allow_file_sharing) = patch.allow_file_sharing {
            self.allow_file_sharing = allow_file_sharing;
        }
        if let Some(mute_notifications) = patch.mute_notifications {
            self.mute_notifications = mute_notifications;
        }
        if let Some(theme) = patch.theme {
            self.theme = theme;
        }
    }
}

/// Partial settings update. `None` fields keep their current value.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SettingsPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_emojis: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_file_sharing: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mute_notifications: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<Theme>,
}

/// Parse an environment variable, falling back to `default` when the
/// variable is unset or does not parse.
pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[path = "settings_test.rs"]
mod tests;
