//! Background and texture loading
//!
//! Loads both source images, fits the background to the texture and applies
//! an independent random flip to each.

use std::path::{Path, PathBuf};
use image::imageops::{self, FilterType};
use image::{ImageError, RgbImage};
use rand::Rng;
use thiserror::Error;
use tracing::debug;

/// Asset loading errors
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("Asset not found or not decodable: {path}: {source}")]
    NotFound {
        path: PathBuf,
        #[source]
        source: ImageError,
    },
}

/// Mirror transform applied to a freshly loaded image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlipCode {
    Horizontal,
    Vertical,
    Both,
    None,
}

impl FlipCode {
    const ALL: [FlipCode; 4] = [
        FlipCode::Horizontal,
        FlipCode::Vertical,
        FlipCode::Both,
        FlipCode::None,
    ];

    /// Draw one of the four codes with equal probability
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }

    /// Apply the flip in place
    pub fn apply(self, image: &mut RgbImage) {
        match self {
            FlipCode::Horizontal => imageops::flip_horizontal_in_place(image),
            FlipCode::Vertical => imageops::flip_vertical_in_place(image),
            FlipCode::Both => {
                imageops::flip_horizontal_in_place(image);
                imageops::flip_vertical_in_place(image);
            }
            FlipCode::None => {}
        }
    }
}

/// Background and texture ready for compositing, always the same size
#[derive(Debug, Clone)]
pub struct LoadedAssets {
    pub background: RgbImage,
    pub texture: RgbImage,
}

impl LoadedAssets {
    /// (width, height) shared by both images
    pub fn dimensions(&self) -> (u32, u32) {
        self.texture.dimensions()
    }

    /// Fit a background to a texture and flip both
    pub fn from_images<R: Rng + ?Sized>(
        background: RgbImage,
        mut texture: RgbImage,
        rng: &mut R,
    ) -> Self {
        let (width, height) = texture.dimensions();
        let mut background = if background.dimensions() != (width, height) {
            imageops::resize(&background, width, height, FilterType::Triangle)
        } else {
            background
        };

        let background_flip = FlipCode::random(rng);
        let texture_flip = FlipCode::random(rng);
        background_flip.apply(&mut background);
        texture_flip.apply(&mut texture);

        debug!(
            width = width,
            height = height,
            background_flip = ?background_flip,
            texture_flip = ?texture_flip,
            "Prepared assets"
        );

        LoadedAssets { background, texture }
    }
}

/// Read a single RGB image from disk
pub fn read_rgb(path: &Path) -> Result<RgbImage, AssetError> {
    image::open(path)
        .map(|image| image.to_rgb8())
        .map_err(|source| AssetError::NotFound {
            path: path.to_path_buf(),
            source,
        })
}

/// Load a background/texture pair
pub fn load<R: Rng + ?Sized>(
    background_path: &Path,
    texture_path: &Path,
    rng: &mut R,
) -> Result<LoadedAssets, AssetError> {
    let texture = read_rgb(texture_path)?;
    let background = read_rgb(background_path)?;

    debug!(
        background = %background_path.display(),
        texture = %texture_path.display(),
        "Loaded assets"
    );

    Ok(LoadedAssets::from_images(background, texture, rng))
}
