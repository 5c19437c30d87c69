//! The overlay's image stores.
//!
//! Profile images are keyed by user id and size class; the map never
//! shrinks while the runtime lives — entries are content-invalidated so
//! cache keys stay stable. Temporary images are keyed by an opaque
//! caller-chosen identity token and expire after a minute of disuse.

use std::sync::Arc;
use std::time::{Duration, Instant};

use hashbrown::HashMap;
use scrim_core::ids::UserId;
use scrim_core::image::{ImageData, SizeClass};
use scrim_core::provider::ImageProvider;
use scrim_core::renderer::Renderer;

use crate::image::{ImageResource, ProfileImageSet};

/// How long an undisplayed temporary image survives.
pub const TEMPORARY_IMAGE_TTL: Duration = Duration::from_secs(60);

// ─────────────────────────────────────────────────────────────────────────────
// Profile images
// ─────────────────────────────────────────────────────────────────────────────

/// Per-user avatar images at the three size classes.
#[derive(Default)]
pub struct ProfileImageCache {
    images: HashMap<UserId, ProfileImageSet>,
}

impl ProfileImageCache {
    /// Make sure a (possibly empty) set exists for `user`.
    pub fn ensure_entry(&mut self, user: UserId) -> &mut ProfileImageSet {
        self.images.entry(user).or_default()
    }

    pub fn resource(&self, user: UserId, size: SizeClass) -> Option<&ImageResource> {
        self.images.get(&user).map(|set| set.get(size))
    }

    pub fn resource_mut(&mut self, user: UserId, size: SizeClass) -> Option<&mut ImageResource> {
        self.images.get_mut(&user).map(|set| set.get_mut(size))
    }

    /// Fetch `user`'s avatar at `size` from the provider and store it.
    ///
    /// Dimensions outside the size class bounds, stale handles and short
    /// reads are all rejected, leaving any prior entry untouched. On
    /// success the prior texture is released before the buffer is replaced.
    pub fn load(
        &mut self,
        user: UserId,
        size: SizeClass,
        provider: &dyn ImageProvider,
        renderer: Option<&Arc<dyn Renderer>>,
    ) -> bool {
        let Some(handle) = provider.avatar_handle(user, size) else {
            tracing::debug!(%user, size = size.label(), "no avatar handle");
            return false;
        };
        let Some((width, height)) = provider.image_size(handle) else {
            return false;
        };
        if !size.accepts(width, height) {
            tracing::debug!(%user, size = size.label(), width, height, "avatar dimensions out of bounds");
            return false;
        }
        let mut pixels = vec![0u8; ImageData::byte_len(width, height)];
        if !provider.image_rgba(handle, &mut pixels) {
            tracing::debug!(%user, size = size.label(), "avatar pixel fetch failed");
            return false;
        }
        let Some(data) = ImageData::new(pixels, width, height) else {
            return false;
        };
        self.ensure_entry(user).get_mut(size).set_data(data, renderer);
        true
    }

    /// Upload the stored buffer as a texture (idempotent, safe without a
    /// renderer). Returns whether a live texture exists afterwards.
    pub fn create_texture(
        &mut self,
        user: UserId,
        size: SizeClass,
        renderer: Option<&Arc<dyn Renderer>>,
    ) -> bool {
        match self.resource_mut(user, size) {
            Some(resource) => resource.create_texture(renderer),
            None => false,
        }
    }

    /// Content-invalidate every size class for `user` (the external
    /// "avatar changed" notification). The entry itself stays.
    pub fn invalidate(&mut self, user: UserId, renderer: Option<&Arc<dyn Renderer>>) {
        if let Some(set) = self.images.get_mut(&user) {
            set.invalidate(renderer);
        }
    }

    /// Content-invalidate a single size class for `user`.
    pub fn invalidate_size(
        &mut self,
        user: UserId,
        size: SizeClass,
        renderer: Option<&Arc<dyn Renderer>>,
    ) {
        if let Some(set) = self.images.get_mut(&user) {
            set.get_mut(size).destroy(renderer);
        }
    }

    /// Release every texture (renderer teardown path). Buffers stay.
    pub fn destroy_textures(&mut self, renderer: Option<&Arc<dyn Renderer>>) {
        for set in self.images.values_mut() {
            for size in SizeClass::ALL {
                set.get_mut(size).destroy_texture(renderer);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Temporary images
// ─────────────────────────────────────────────────────────────────────────────

/// Opaque identity token for a temporary image.
///
/// Identity, not content, is the key: callers reuse the same token to mean
/// "the same logical image" (the source used the raw buffer address for
/// this). The value is never interpreted beyond equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageKey(pub u64);

struct TemporaryImage {
    image: ImageResource,
    last_display: Instant,
}

/// Ad-hoc images displayed straight from caller-supplied buffers.
#[derive(Default)]
pub struct TemporaryImageCache {
    images: HashMap<ImageKey, TemporaryImage>,
}

impl TemporaryImageCache {
    /// Look up (or decode and insert) the image for `key`, refreshing its
    /// display time. The buffer is only consulted on first display; later
    /// displays trust the identity contract.
    pub fn touch(
        &mut self,
        key: ImageKey,
        pixels: &[u8],
        width: u32,
        height: u32,
        now: Instant,
        renderer: Option<&Arc<dyn Renderer>>,
    ) -> Option<&mut ImageResource> {
        if !self.images.contains_key(&key) {
            if width == 0 || height == 0 || pixels.len() != ImageData::byte_len(width, height) {
                tracing::debug!(key = key.0, width, height, "rejecting malformed temporary image");
                return None;
            }
            let data = ImageData::new(pixels.to_vec(), width, height)?;
            let mut image = ImageResource::default();
            image.set_data(data, renderer);
            self.images.insert(
                key,
                TemporaryImage {
                    image,
                    last_display: now,
                },
            );
        }
        let entry = self.images.get_mut(&key)?;
        entry.last_display = now;
        Some(&mut entry.image)
    }

    /// Evict entries not displayed within [`TEMPORARY_IMAGE_TTL`].
    pub fn prune(&mut self, now: Instant, renderer: Option<&Arc<dyn Renderer>>) -> usize {
        let before = self.images.len();
        self.images.retain(|key, entry| {
            let keep = now.duration_since(entry.last_display) <= TEMPORARY_IMAGE_TTL;
            if !keep {
                tracing::debug!(key = key.0, "evicting temporary image");
                entry.image.destroy(renderer);
            }
            keep
        });
        before - self.images.len()
    }

    /// Drop everything (teardown path).
    pub fn destroy_all(&mut self, renderer: Option<&Arc<dyn Renderer>>) {
        for entry in self.images.values_mut() {
            entry.image.destroy(renderer);
        }
        self.images.clear();
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use scrim_core::provider::{AchievementInfo, ImageHandle};
    use scrim_core::image::BYTES_PER_PIXEL;

    use crate::testing::FakeRenderer;

    /// Provider double with a scriptable avatar table.
    #[derive(Default)]
    struct FakeProvider {
        avatars: Mutex<HashMap<(UserId, SizeClass), (u32, u32)>>,
    }

    impl FakeProvider {
        fn set_avatar(&self, user: UserId, size: SizeClass, w: u32, h: u32) {
            self.avatars.lock().unwrap().insert((user, size), (w, h));
        }

        fn handle_for(user: UserId, size: SizeClass) -> ImageHandle {
            ImageHandle(user.0 << 2 | size as u64)
        }
    }

    impl ImageProvider for FakeProvider {
        fn avatar_handle(&self, user: UserId, size: SizeClass) -> Option<ImageHandle> {
            self.avatars
                .lock()
                .unwrap()
                .contains_key(&(user, size))
                .then(|| Self::handle_for(user, size))
        }

        fn achievement_handle(&self, _name: &str) -> Option<ImageHandle> {
            None
        }

        fn image_size(&self, handle: ImageHandle) -> Option<(u32, u32)> {
            let table = self.avatars.lock().unwrap();
            table
                .iter()
                .find(|(k, _)| Self::handle_for(k.0, k.1) == handle)
                .map(|(_, dims)| *dims)
        }

        fn image_rgba(&self, handle: ImageHandle, buf: &mut [u8]) -> bool {
            match self.image_size(handle) {
                Some((w, h)) if buf.len() == (w * h) as usize * BYTES_PER_PIXEL => {
                    buf.fill(0xab);
                    true
                }
                _ => false,
            }
        }

        fn achievements(&self) -> Vec<AchievementInfo> {
            Vec::new()
        }

        fn achievement_status(&self, _name: &str) -> Option<(bool, u32)> {
            None
        }
    }

    const USER: UserId = UserId(42);

    #[test]
    fn load_then_create_yields_a_live_texture() {
        let provider = FakeProvider::default();
        provider.set_avatar(USER, SizeClass::Small, 32, 32);
        let renderer: Arc<dyn Renderer> = Arc::new(FakeRenderer::default());
        let mut cache = ProfileImageCache::default();

        assert!(cache.load(USER, SizeClass::Small, &provider, Some(&renderer)));
        assert!(cache.create_texture(USER, SizeClass::Small, Some(&renderer)));
        assert!(cache
            .resource(USER, SizeClass::Small)
            .unwrap()
            .texture_id()
            .is_some());
    }

    #[test]
    fn out_of_bounds_dimensions_leave_prior_entry_untouched() {
        let provider = FakeProvider::default();
        provider.set_avatar(USER, SizeClass::Small, 32, 32);
        let mut cache = ProfileImageCache::default();
        assert!(cache.load(USER, SizeClass::Small, &provider, None));

        // 33x33 is medium territory; the small slot must reject it.
        provider.set_avatar(USER, SizeClass::Small, 33, 33);
        assert!(!cache.load(USER, SizeClass::Small, &provider, None));

        let kept = cache.resource(USER, SizeClass::Small).unwrap().data().unwrap();
        assert_eq!((kept.width(), kept.height()), (32, 32));
    }

    #[test]
    fn invalidate_keeps_the_cache_key() {
        let provider = FakeProvider::default();
        provider.set_avatar(USER, SizeClass::Medium, 64, 64);
        let mut cache = ProfileImageCache::default();
        assert!(cache.load(USER, SizeClass::Medium, &provider, None));

        cache.invalidate(USER, None);
        assert_eq!(cache.len(), 1);
        assert!(cache.resource(USER, SizeClass::Medium).unwrap().data().is_none());
    }

    #[test]
    fn temporary_images_expire_after_a_minute_of_disuse() {
        let mut cache = TemporaryImageCache::default();
        let start = Instant::now();
        let pixels = vec![0u8; ImageData::byte_len(2, 2)];
        let key = ImageKey(0xdead);

        assert!(cache.touch(key, &pixels, 2, 2, start, None).is_some());

        // Displayed again at 59s: retained by the prune at 61s...
        cache.touch(key, &pixels, 2, 2, start + Duration::from_secs(59), None);
        assert_eq!(cache.prune(start + Duration::from_secs(61), None), 0);
        assert_eq!(cache.len(), 1);

        // ...but 61s of silence evicts it.
        assert_eq!(cache.prune(start + Duration::from_secs(121), None), 1);
        assert!(cache.is_empty());
    }

    #[test]
    fn temporary_image_rejects_malformed_buffers() {
        let mut cache = TemporaryImageCache::default();
        let now = Instant::now();
        assert!(cache.touch(ImageKey(1), &[0u8; 3], 2, 2, now, None).is_none());
        assert!(cache.touch(ImageKey(2), &[], 0, 0, now, None).is_none());
        assert!(cache.is_empty());
    }
}
