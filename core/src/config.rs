//! Overlay UI preferences.
//!
//! The preferences the overlay owns at runtime: notification placement,
//! achievement display toggles and the UI language. Persisted through
//! confy; everything else (identity, avatars, game configuration) belongs
//! to the host's settings loader.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Languages the overlay UI can be switched to.
pub const VALID_LANGUAGES: &[&str] = &[
    "english",
    "arabic",
    "bulgarian",
    "schinese",
    "tchinese",
    "czech",
    "danish",
    "dutch",
    "finnish",
    "french",
    "german",
    "greek",
    "hungarian",
    "italian",
    "japanese",
    "koreana",
    "norwegian",
    "polish",
    "portuguese",
    "brazilian",
    "romanian",
    "russian",
    "spanish",
    "latam",
    "swedish",
    "thai",
    "turkish",
    "ukrainian",
    "vietnamese",
];

/// Index of `language` in [`VALID_LANGUAGES`], falling back to english.
pub fn language_index(language: &str) -> usize {
    VALID_LANGUAGES
        .iter()
        .position(|l| *l == language)
        .unwrap_or(0)
}

/// Screen corner notifications stack from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationCorner {
    TopLeft,
    TopRight,
    #[default]
    BottomLeft,
    BottomRight,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayPrefs {
    #[serde(default)]
    pub notification_corner: NotificationCorner,
    /// Horizontal inset of the notification stack, in pixels.
    #[serde(default)]
    pub h_inset: i32,
    /// Vertical inset of the notification stack, in pixels.
    #[serde(default)]
    pub v_inset: i32,
    #[serde(default = "default_true")]
    pub show_achievement_desc_on_unlock: bool,
    #[serde(default)]
    pub show_achievement_hidden_unearned: bool,
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_true() -> bool {
    true
}

fn default_language() -> String {
    "english".to_string()
}

impl Default for OverlayPrefs {
    fn default() -> Self {
        Self {
            notification_corner: NotificationCorner::default(),
            h_inset: 0,
            v_inset: 0,
            show_achievement_desc_on_unlock: true,
            show_achievement_hidden_unearned: false,
            language: default_language(),
        }
    }
}

/// Persistence extension for [`OverlayPrefs`].
pub trait OverlayPrefsExt: Sized {
    fn load() -> Self;
    fn save(&self) -> Result<(), ConfigError>;
}

impl OverlayPrefsExt for OverlayPrefs {
    fn load() -> Self {
        confy::load("scrim", "overlay").unwrap_or_else(|err| {
            tracing::warn!(%err, "failed to load overlay preferences, using defaults");
            OverlayPrefs::default()
        })
    }

    fn save(&self) -> Result<(), ConfigError> {
        confy::store("scrim", "overlay", self).map_err(ConfigError::Save)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_index_falls_back_to_english() {
        assert_eq!(language_index("english"), 0);
        assert_eq!(language_index("german"), 10);
        assert_eq!(language_index("klingon"), 0);
    }

    #[test]
    fn defaults_match_overlay_expectations() {
        let prefs = OverlayPrefs::default();
        assert_eq!(prefs.notification_corner, NotificationCorner::BottomLeft);
        assert!(prefs.show_achievement_desc_on_unlock);
        assert!(!prefs.show_achievement_hidden_unearned);
        assert_eq!(prefs.language, "english");
    }
}
