//! Scrim Overlay Runtime
//!
//! In-process overlay for a game host: detects which graphics API drives
//! the host's frames, hooks its present call, and manages the overlay's
//! stateful resources between the render thread and the host's tick.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                    manager                           │
//! │                 OverlayManager                       │
//! │        (tick + paint entry points, locking)          │
//! ├──────────────┬───────────────┬──────────────────────┤
//! │   paint      │  notifications │  friends             │
//! │ (what to     │  (fade-in /    │  (chat/invite        │
//! │  draw)       │   hold / out)  │   window state)      │
//! ├──────────────┴───────┬───────┴──────────────────────┤
//! │    cache + lazy      │        detector              │
//! │ (avatar/achievement/ │ (async present-probe race    │
//! │  temporary images)   │  over graphics APIs)         │
//! ├──────────────────────┴──────────────────────────────┤
//! │                   scrim-core                         │
//! │   collaborator traits: provider, renderer, network,  │
//! │        settings, presence, callbacks, UI toolkit     │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod achievements;
pub mod cache;
pub mod detector;
pub mod friends;
pub mod image;
pub mod lazy;
pub mod manager;
pub mod notifications;
mod paint;
pub mod window_id;

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use achievements::{AchievementRoster, OverlayAchievement};
pub use cache::{ImageKey, ProfileImageCache, TemporaryImageCache, TEMPORARY_IMAGE_TTL};
pub use detector::{
    detect_renderer, DetectionPoll, DetectorError, RendererDetection, DETECTION_FLOOR,
    DETECTION_GRACE,
};
pub use friends::{FriendRegistry, FriendWindow, PendingInvite, WindowFlags, MAX_CHAT_LEN};
pub use image::{ImageResource, ProfileImageSet};
pub use lazy::{AttemptOutcome, LazyLoadTracker, SizeSet, MAX_LOAD_ATTEMPTS};
pub use manager::OverlayManager;
pub use notifications::{Notification, NotificationKind, NotificationQueue, SHOW_TIME};
