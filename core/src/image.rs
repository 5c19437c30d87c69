//! Raw image data and the avatar size classes.
//!
//! Avatars exist at three fixed resolutions with strictly increasing,
//! non-overlapping dimension bounds. Anything outside the bounds of its
//! size class is rejected at the cache boundary and never reaches the
//! renderer.

use serde::{Deserialize, Serialize};

/// Bytes per pixel of the RGBA wire format.
pub const BYTES_PER_PIXEL: usize = 4;

/// One of the three fixed avatar resolutions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SizeClass {
    Small,
    Medium,
    Large,
}

impl SizeClass {
    pub const ALL: [SizeClass; 3] = [SizeClass::Small, SizeClass::Medium, SizeClass::Large];

    /// Inclusive `(min, max)` bounds on each dimension for this class.
    pub fn bounds(self) -> (u32, u32) {
        match self {
            SizeClass::Small => (1, 32),
            SizeClass::Medium => (33, 64),
            SizeClass::Large => (65, 184),
        }
    }

    /// Whether `width x height` is a valid image for this class.
    pub fn accepts(self, width: u32, height: u32) -> bool {
        let (min, max) = self.bounds();
        (min..=max).contains(&width) && (min..=max).contains(&height)
    }

    pub fn label(self) -> &'static str {
        match self {
            SizeClass::Small => "small",
            SizeClass::Medium => "medium",
            SizeClass::Large => "large",
        }
    }
}

/// An owned RGBA pixel buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    pixels: Vec<u8>,
    width: u32,
    height: u32,
}

impl ImageData {
    /// Build from a raw buffer, rejecting zero dimensions and length
    /// mismatches.
    pub fn new(pixels: Vec<u8>, width: u32, height: u32) -> Option<Self> {
        if width == 0 || height == 0 || pixels.len() != Self::byte_len(width, height) {
            return None;
        }
        Some(Self {
            pixels,
            width,
            height,
        })
    }

    /// Expected buffer length for a `width x height` RGBA image.
    pub fn byte_len(width: u32, height: u32) -> usize {
        width as usize * height as usize * BYTES_PER_PIXEL
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_class_bounds_are_disjoint_and_increasing() {
        let mut prev_max = 0;
        for class in SizeClass::ALL {
            let (min, max) = class.bounds();
            assert!(min > prev_max);
            assert!(max >= min);
            prev_max = max;
        }
    }

    #[test]
    fn accepts_respects_both_dimensions() {
        assert!(SizeClass::Small.accepts(32, 32));
        assert!(!SizeClass::Small.accepts(33, 32));
        assert!(!SizeClass::Small.accepts(0, 16));
        assert!(SizeClass::Medium.accepts(33, 64));
        assert!(!SizeClass::Medium.accepts(32, 64));
        assert!(SizeClass::Large.accepts(184, 184));
        assert!(!SizeClass::Large.accepts(185, 184));
    }

    #[test]
    fn image_data_rejects_bad_buffers() {
        assert!(ImageData::new(vec![0; 16], 2, 2).is_some());
        assert!(ImageData::new(vec![0; 15], 2, 2).is_none());
        assert!(ImageData::new(Vec::new(), 0, 0).is_none());
    }
}
