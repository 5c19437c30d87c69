//! Achievement metadata and icon cache.
//!
//! The roster is populated once from the provider on the first tick.
//! Icons load through the same handle/size/rgba path as avatars but have
//! no size-class bound; dimensions just have to be non-zero.

use std::sync::Arc;

use scrim_core::image::ImageData;
use scrim_core::provider::{AchievementInfo, ImageProvider};
use scrim_core::renderer::Renderer;

use crate::image::ImageResource;

pub struct OverlayAchievement {
    pub name: String,
    pub title: String,
    pub description: String,
    pub hidden: bool,
    pub achieved: bool,
    pub unlock_time: u32,
    pub image: ImageResource,
}

/// The full achievement list plus earned/total counts for the header.
#[derive(Default)]
pub struct AchievementRoster {
    list: Vec<OverlayAchievement>,
    total: u32,
    earned: u32,
}

impl AchievementRoster {
    /// Populate from provider metadata, loading each icon's pixel data.
    /// Does nothing when already populated or when the provider has no
    /// achievements yet.
    pub fn populate(
        &mut self,
        infos: Vec<AchievementInfo>,
        provider: &dyn ImageProvider,
        renderer: Option<&Arc<dyn Renderer>>,
    ) {
        if !self.list.is_empty() || infos.is_empty() {
            return;
        }
        self.total = infos.len() as u32;
        self.earned = infos.iter().filter(|a| a.achieved).count() as u32;
        self.list = infos
            .into_iter()
            .map(|info| {
                let mut ach = OverlayAchievement {
                    name: info.name,
                    title: info.title,
                    description: info.description,
                    hidden: info.hidden,
                    achieved: info.achieved,
                    unlock_time: info.unlock_time,
                    image: ImageResource::default(),
                };
                load_achievement_image(&mut ach, provider, renderer);
                ach
            })
            .collect();
        tracing::debug!(total = self.total, earned = self.earned, "achievement roster populated");
    }

    /// An unlock just happened: refresh the entry's image and status and
    /// bump the earned count.
    ///
    /// The icon is reloaded because providers swap in the earned artwork
    /// on unlock. Only the texture is destroyed here; recreation waits for
    /// the next paint (creating it outside the present hook leaves some
    /// GL contexts with a blank texture).
    pub fn record_unlock(
        &mut self,
        name: &str,
        provider: &dyn ImageProvider,
        renderer: Option<&Arc<dyn Renderer>>,
    ) -> bool {
        let Some(ach) = self.list.iter_mut().find(|a| a.name == name) else {
            return false;
        };
        load_achievement_image(ach, provider, renderer);
        ach.image.destroy_texture(renderer);
        if let Some((achieved, unlock_time)) = provider.achievement_status(name) {
            ach.achieved = achieved;
            ach.unlock_time = unlock_time;
        }
        if self.earned < self.total {
            self.earned += 1;
        }
        true
    }

    /// Release every icon texture (visibility flips and renderer
    /// teardown). Pixel buffers stay for lazy recreation.
    pub fn destroy_textures(&mut self, renderer: Option<&Arc<dyn Renderer>>) {
        for ach in &mut self.list {
            ach.image.destroy_texture(renderer);
        }
    }

    pub fn get(&self, name: &str) -> Option<&OverlayAchievement> {
        self.list.iter().find(|a| a.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut OverlayAchievement> {
        self.list.iter_mut().find(|a| a.name == name)
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut OverlayAchievement> {
        self.list.iter_mut()
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn earned(&self) -> u32 {
        self.earned
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }
}

/// Fetch an achievement icon's pixels, replacing any prior buffer. The
/// prior texture is released first so a renderer handle is never leaked.
/// Invalid dimensions or a failed fetch leave the entry untouched.
pub fn load_achievement_image(
    ach: &mut OverlayAchievement,
    provider: &dyn ImageProvider,
    renderer: Option<&Arc<dyn Renderer>>,
) -> bool {
    let Some(handle) = provider.achievement_handle(&ach.name) else {
        tracing::debug!(name = %ach.name, "achievement icon not loaded by provider");
        return false;
    };
    let Some((width, height)) = provider.image_size(handle) else {
        return false;
    };
    if width == 0 || height == 0 {
        tracing::debug!(name = %ach.name, width, height, "achievement icon has invalid size");
        return false;
    }
    let mut pixels = vec![0u8; ImageData::byte_len(width, height)];
    if !provider.image_rgba(handle, &mut pixels) {
        tracing::debug!(name = %ach.name, "achievement icon pixel fetch failed");
        return false;
    }
    match ImageData::new(pixels, width, height) {
        Some(data) => {
            ach.image.set_data(data, renderer);
            true
        }
        None => false,
    }
}
