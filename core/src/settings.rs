//! Session settings boundary.
//!
//! Identity, language and warning flags come from the host's settings
//! loader; the overlay only reads them, except for the profile image
//! mutator and the settings-window save path.

use crate::ids::UserId;
use crate::image::{ImageData, SizeClass};

/// Fields the overlay settings window can edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsUpdate {
    pub local_name: String,
    pub language: String,
    pub show_achievement_desc_on_unlock: bool,
    pub show_achievement_hidden_unearned: bool,
}

pub trait SessionSettings: Send + Sync {
    fn local_user(&self) -> UserId;
    fn local_name(&self) -> String;
    fn app_id(&self) -> u32;
    fn language(&self) -> String;

    /// Settings are pinned by force-files; edits would be ignored.
    fn forced_settings(&self) -> bool;
    /// The host is saving to the game folder instead of the user profile.
    fn warn_local_save(&self) -> bool;

    fn show_achievement_desc_on_unlock(&self) -> bool;
    fn show_achievement_hidden_unearned(&self) -> bool;

    /// Replace the local user's profile image for one size class.
    fn set_profile_image(&self, size: SizeClass, image: &ImageData) -> bool;

    /// Persist an edit made in the overlay settings window.
    fn persist(&self, update: &SettingsUpdate) -> bool;
}
