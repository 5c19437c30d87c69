//! Image resources: an owned pixel buffer paired with a weak renderer
//! texture.
//!
//! The texture reference is weak on purpose: the renderer owns its
//! textures, so a cached entry silently loses its texture when the
//! renderer is torn down and recreates it on the next paint. Buffer and
//! texture are always destroyed together, texture first, so a renderer
//! handle is never leaked when a buffer is replaced.

use std::sync::{Arc, Weak};

use scrim_core::image::{ImageData, SizeClass};
use scrim_core::renderer::{Renderer, TextureRef};

/// An owned RGBA buffer plus a weak handle to its GPU texture.
#[derive(Default)]
pub struct ImageResource {
    data: Option<ImageData>,
    texture: TextureRef,
}

impl ImageResource {
    pub fn data(&self) -> Option<&ImageData> {
        self.data.as_ref()
    }

    /// The GPU texture id, when the texture is still alive.
    pub fn texture_id(&self) -> Option<u64> {
        self.texture.upgrade().map(|t| t.0)
    }

    pub fn has_live_texture(&self) -> bool {
        self.texture.strong_count() > 0
    }

    /// Replace the pixel buffer. Any prior texture is released first.
    pub fn set_data(&mut self, data: ImageData, renderer: Option<&Arc<dyn Renderer>>) {
        self.destroy_texture(renderer);
        self.data = Some(data);
    }

    /// Upload the buffer as a GPU texture. Idempotent: a live texture or a
    /// missing buffer makes this a no-op, and without a renderer it is a
    /// safe no-op as well. Returns whether a live texture exists afterwards.
    pub fn create_texture(&mut self, renderer: Option<&Arc<dyn Renderer>>) -> bool {
        if self.has_live_texture() {
            return true;
        }
        let (Some(renderer), Some(data)) = (renderer, self.data.as_ref()) else {
            return false;
        };
        self.texture = renderer.create_image_resource(data.pixels(), data.width(), data.height());
        self.has_live_texture()
    }

    /// Release the GPU texture, keeping the pixel buffer.
    pub fn destroy_texture(&mut self, renderer: Option<&Arc<dyn Renderer>>) {
        let texture = std::mem::replace(&mut self.texture, Weak::new());
        if let Some(renderer) = renderer
            && texture.strong_count() > 0
        {
            renderer.release_image_resource(texture);
        }
    }

    /// Drop texture and buffer together.
    pub fn destroy(&mut self, renderer: Option<&Arc<dyn Renderer>>) {
        self.destroy_texture(renderer);
        self.data = None;
    }
}

/// One avatar image per size class for a single user.
#[derive(Default)]
pub struct ProfileImageSet {
    small: ImageResource,
    medium: ImageResource,
    large: ImageResource,
}

impl ProfileImageSet {
    pub fn get(&self, size: SizeClass) -> &ImageResource {
        match size {
            SizeClass::Small => &self.small,
            SizeClass::Medium => &self.medium,
            SizeClass::Large => &self.large,
        }
    }

    pub fn get_mut(&mut self, size: SizeClass) -> &mut ImageResource {
        match size {
            SizeClass::Small => &mut self.small,
            SizeClass::Medium => &mut self.medium,
            SizeClass::Large => &mut self.large,
        }
    }

    /// Destroy buffers and textures for every size class, keeping the set
    /// itself (cache keys stay stable).
    pub fn invalidate(&mut self, renderer: Option<&Arc<dyn Renderer>>) {
        for size in SizeClass::ALL {
            self.get_mut(size).destroy(renderer);
        }
    }
}
