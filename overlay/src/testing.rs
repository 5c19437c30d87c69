//! Shared doubles for unit tests.

use std::sync::{Arc, Mutex};

use scrim_core::image::ImageData;
use scrim_core::renderer::{HookReadyCallback, PaintCallback, Renderer, Texture, TextureRef};

/// Renderer double that keeps textures alive until released.
#[derive(Default)]
pub(crate) struct FakeRenderer {
    pub(crate) textures: Mutex<Vec<Arc<Texture>>>,
    next_id: Mutex<u64>,
}

impl FakeRenderer {
    pub(crate) fn live_textures(&self) -> usize {
        self.textures.lock().unwrap().len()
    }

    /// Simulate renderer teardown: drop every strong texture reference.
    pub(crate) fn drop_all_textures(&self) {
        self.textures.lock().unwrap().clear();
    }
}

impl Renderer for FakeRenderer {
    fn library_name(&self) -> String {
        "fake".to_string()
    }

    fn create_image_resource(&self, _rgba: &[u8], _w: u32, _h: u32) -> TextureRef {
        let mut next = self.next_id.lock().unwrap();
        *next += 1;
        let texture = Arc::new(Texture(*next));
        let weak = Arc::downgrade(&texture);
        self.textures.lock().unwrap().push(texture);
        weak
    }

    fn release_image_resource(&self, texture: TextureRef) {
        if let Some(strong) = texture.upgrade() {
            self.textures
                .lock()
                .unwrap()
                .retain(|t| !Arc::ptr_eq(t, &strong));
        }
    }

    fn set_paint_callback(&self, _callback: PaintCallback) {}
    fn set_hook_ready_callback(&self, _callback: HookReadyCallback) {}

    fn start_hook(&self) -> bool {
        true
    }
}

/// A solid-color RGBA buffer of the given dimensions.
pub(crate) fn image_data(w: u32, h: u32) -> ImageData {
    ImageData::new(vec![0xff; ImageData::byte_len(w, h)], w, h).unwrap()
}
