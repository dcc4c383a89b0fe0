//! Labelled output pair of one generation call

use image::{GrayImage, RgbImage};

/// Composite image and the mask that produced it.
///
/// Both buffers always share the same dimensions.
#[derive(Debug, Clone)]
pub struct SampleRecord {
    pub image: RgbImage,
    pub mask: GrayImage,
}

impl SampleRecord {
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}
