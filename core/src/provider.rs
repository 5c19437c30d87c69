//! The avatar/achievement image provider boundary.
//!
//! The provider hands out opaque image handles which resolve to dimensions
//! and RGBA pixel data. It must tolerate being called off its own thread;
//! every accessor is a plain synchronous query with no callbacks.

use crate::ids::UserId;
use crate::image::SizeClass;

/// Opaque handle to a provider-side image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageHandle(pub u64);

/// Achievement metadata as published by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AchievementInfo {
    pub name: String,
    pub title: String,
    pub description: String,
    pub hidden: bool,
    pub achieved: bool,
    /// Unix timestamp of the unlock, 0 when not achieved.
    pub unlock_time: u32,
}

pub trait ImageProvider: Send + Sync {
    /// Handle for a user's avatar at the given size class, if the provider
    /// has one.
    fn avatar_handle(&self, user: UserId, size: SizeClass) -> Option<ImageHandle>;

    /// Handle for an achievement's icon.
    fn achievement_handle(&self, name: &str) -> Option<ImageHandle>;

    /// Dimensions of the image behind a handle.
    fn image_size(&self, handle: ImageHandle) -> Option<(u32, u32)>;

    /// Copy the RGBA pixels behind a handle into `buf`. Returns false when
    /// the handle is stale or `buf` is not exactly `w * h * 4` bytes.
    fn image_rgba(&self, handle: ImageHandle, buf: &mut [u8]) -> bool;

    /// The full achievement list. Called once, on the first tick.
    fn achievements(&self) -> Vec<AchievementInfo>;

    /// Re-query achieved state and unlock time for a single achievement.
    fn achievement_status(&self, name: &str) -> Option<(bool, u32)>;
}
