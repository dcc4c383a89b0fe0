//! Masked compositing pipeline
//!
//! Combines a rust texture with a background through a binary mask: the
//! texture shows where the mask is set, the background everywhere else.

use image::{GrayImage, ImageBuffer, Pixel, Rgb, RgbImage};
use image::imageops;
use rand::Rng;
use thiserror::Error;
use tracing::debug;

use crate::domain::{ParameterError, SampleRecord};
use super::mask::is_binary;

/// Compositing errors
#[derive(Debug, Error)]
pub enum CompositorError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(#[from] ParameterError),
    #[error("Dimension mismatch: background {background:?}, texture {texture:?}, mask {mask:?}")]
    DimensionMismatch {
        background: (u32, u32),
        texture: (u32, u32),
        mask: (u32, u32),
    },
    #[error("Mask contains values other than 0 and 255")]
    NonBinaryMask,
}

/// Top-left corner and side of a square crop window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropWindow {
    pub x: u32,
    pub y: u32,
    pub size: u32,
}

impl CropWindow {
    /// Pick a window of `size` uniformly among all placements inside the image
    pub fn random<R: Rng + ?Sized>(
        width: u32,
        height: u32,
        size: u32,
        rng: &mut R,
    ) -> Result<Self, ParameterError> {
        if size > width.min(height) {
            return Err(ParameterError::CropTooLarge {
                crop_dim: size,
                width,
                height,
            });
        }

        Ok(CropWindow {
            x: rng.gen_range(0..=width - size),
            y: rng.gen_range(0..=height - size),
            size,
        })
    }

    fn apply<P>(&self, image: &ImageBuffer<P, Vec<P::Subpixel>>) -> ImageBuffer<P, Vec<P::Subpixel>>
    where
        P: Pixel + 'static,
    {
        imageops::crop_imm(image, self.x, self.y, self.size, self.size).to_image()
    }
}

/// Crop background, texture and mask to the same random window
pub fn random_crop<R: Rng + ?Sized>(
    background: &RgbImage,
    texture: &RgbImage,
    mask: &GrayImage,
    crop_dim: u32,
    rng: &mut R,
) -> Result<(RgbImage, RgbImage, GrayImage), ParameterError> {
    let (width, height) = texture.dimensions();
    let window = CropWindow::random(width, height, crop_dim, rng)?;

    debug!(
        x = window.x,
        y = window.y,
        size = window.size,
        "Cropping sample"
    );

    Ok((window.apply(background), window.apply(texture), window.apply(mask)))
}

/// Blend texture and background through the mask and its complement
pub fn blend(background: &RgbImage, texture: &RgbImage, mask: &GrayImage) -> RgbImage {
    let (width, height) = texture.dimensions();

    RgbImage::from_fn(width, height, |x, y| {
        let m = mask.get_pixel(x, y).0[0];
        let m_inv = !m;
        let t = texture.get_pixel(x, y);
        let b = background.get_pixel(x, y);

        let mut out = [0u8; 3];
        for i in 0..3 {
            let fg = if m != 0 { t.0[i] } else { 0 };
            let bg = if m_inv != 0 { b.0[i] } else { 0 };
            out[i] = fg | bg;
        }
        Rgb(out)
    })
}

/// Composite a texture onto a background, cropping first when `crop_dim > 0`
pub fn composite<R: Rng + ?Sized>(
    background: RgbImage,
    texture: RgbImage,
    mask: GrayImage,
    crop_dim: u32,
    rng: &mut R,
) -> Result<SampleRecord, CompositorError> {
    if background.dimensions() != texture.dimensions()
        || mask.dimensions() != texture.dimensions()
    {
        return Err(CompositorError::DimensionMismatch {
            background: background.dimensions(),
            texture: texture.dimensions(),
            mask: mask.dimensions(),
        });
    }

    if !is_binary(&mask) {
        return Err(CompositorError::NonBinaryMask);
    }

    let (background, texture, mask) = if crop_dim > 0 {
        random_crop(&background, &texture, &mask, crop_dim, rng)?
    } else {
        (background, texture, mask)
    };

    let image = blend(&background, &texture, &mask);

    debug!(
        width = image.width(),
        height = image.height(),
        "Composited sample"
    );

    Ok(SampleRecord { image, mask })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const GRAY: Rgb<u8> = Rgb([128, 128, 128]);
    const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

    fn checker_mask(width: u32, height: u32) -> GrayImage {
        GrayImage::from_fn(width, height, |x, y| {
            if (x / 3 + y / 2) % 2 == 0 { Luma([255]) } else { Luma([0]) }
        })
    }

    fn gradient(width: u32, height: u32, seed: u8) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            Rgb([x as u8 ^ seed, y as u8, (x + y) as u8 | seed])
        })
    }

    #[test]
    fn test_partition_law() {
        let background = gradient(20, 15, 0x0f);
        let texture = gradient(20, 15, 0xa0);
        let mask = checker_mask(20, 15);
        let mut rng = StdRng::seed_from_u64(1);

        let sample =
            composite(background.clone(), texture.clone(), mask.clone(), 0, &mut rng).unwrap();

        for (x, y, px) in sample.image.enumerate_pixels() {
            let expected = if mask.get_pixel(x, y).0[0] == 255 {
                texture.get_pixel(x, y)
            } else {
                background.get_pixel(x, y)
            };
            assert_eq!(px, expected, "pixel ({}, {})", x, y);
        }
        assert_eq!(sample.mask, mask);
    }

    #[test]
    fn test_no_crop_keeps_dimensions() {
        let mut rng = StdRng::seed_from_u64(2);
        let sample = composite(
            RgbImage::from_pixel(37, 21, GRAY),
            RgbImage::from_pixel(37, 21, WHITE),
            GrayImage::new(37, 21),
            0,
            &mut rng,
        )
        .unwrap();
        assert_eq!(sample.dimensions(), (37, 21));
        assert_eq!(sample.mask.dimensions(), (37, 21));
    }

    #[test]
    fn test_crop_dimensions_match() {
        for crop in [1, 8, 21] {
            let mut rng = StdRng::seed_from_u64(crop as u64);
            let sample = composite(
                gradient(40, 21, 1),
                gradient(40, 21, 2),
                checker_mask(40, 21),
                crop,
                &mut rng,
            )
            .unwrap();
            assert_eq!(sample.image.dimensions(), (crop, crop));
            assert_eq!(sample.mask.dimensions(), (crop, crop));
        }
    }

    #[test]
    fn test_crop_applies_same_window_to_all_layers() {
        let background = gradient(30, 30, 0x11);
        let texture = gradient(30, 30, 0x80);
        let mask = checker_mask(30, 30);

        let mut rng = StdRng::seed_from_u64(9);
        let (b, t, m) = random_crop(&background, &texture, &mask, 10, &mut rng).unwrap();
        let mut rng = StdRng::seed_from_u64(9);
        let window = CropWindow::random(30, 30, 10, &mut rng).unwrap();

        for y in 0..10 {
            for x in 0..10 {
                let (sx, sy) = (window.x + x, window.y + y);
                assert_eq!(b.get_pixel(x, y), background.get_pixel(sx, sy));
                assert_eq!(t.get_pixel(x, y), texture.get_pixel(sx, sy));
                assert_eq!(m.get_pixel(x, y), mask.get_pixel(sx, sy));
            }
        }
    }

    #[test]
    fn test_crop_equal_to_side_is_allowed() {
        let mut rng = StdRng::seed_from_u64(4);
        let window = CropWindow::random(16, 16, 16, &mut rng).unwrap();
        assert_eq!((window.x, window.y), (0, 0));
    }

    #[test]
    fn test_crop_too_large_rejected() {
        let mut rng = StdRng::seed_from_u64(3);
        let err = composite(
            RgbImage::from_pixel(20, 10, GRAY),
            RgbImage::from_pixel(20, 10, WHITE),
            GrayImage::new(20, 10),
            11,
            &mut rng,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            CompositorError::InvalidParameter(ParameterError::CropTooLarge { crop_dim: 11, .. })
        ));
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        let mut rng = StdRng::seed_from_u64(3);
        let err = composite(
            RgbImage::from_pixel(20, 10, GRAY),
            RgbImage::from_pixel(20, 10, WHITE),
            GrayImage::new(10, 10),
            0,
            &mut rng,
        )
        .unwrap_err();
        assert!(matches!(err, CompositorError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_non_binary_mask_rejected() {
        let mut rng = StdRng::seed_from_u64(3);
        let err = composite(
            RgbImage::from_pixel(4, 4, GRAY),
            RgbImage::from_pixel(4, 4, WHITE),
            GrayImage::from_pixel(4, 4, Luma([7])),
            0,
            &mut rng,
        )
        .unwrap_err();
        assert!(matches!(err, CompositorError::NonBinaryMask));
    }
}
