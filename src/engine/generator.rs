//! Single-sample generation: load, synthesize mask, composite

use std::path::Path;
use rand::Rng;
use thiserror::Error;
use tracing::debug;

use crate::domain::{GenerationParams, ParameterError, SampleRecord};
use super::assets::{self, AssetError, LoadedAssets};
use super::compositor::{composite, CompositorError};
use super::mask::synthesize;

/// Errors surfaced by one generation call
#[derive(Debug, Error)]
pub enum SampleError {
    #[error(transparent)]
    Asset(#[from] AssetError),
    #[error("Invalid parameter: {0}")]
    Parameter(#[from] ParameterError),
    #[error("Compositing failed: {0}")]
    Compositor(#[from] CompositorError),
}

impl SampleError {
    /// Asset problems affect one sample only; everything else is a configuration bug
    pub fn is_skippable(&self) -> bool {
        matches!(self, SampleError::Asset(_))
    }
}

/// Build a sample from already loaded assets
pub fn generate_from_assets<R: Rng + ?Sized>(
    assets: LoadedAssets,
    params: &GenerationParams,
    rng: &mut R,
) -> Result<SampleRecord, SampleError> {
    let (width, height) = assets.dimensions();
    if params.crops() && params.crop_dim > width.min(height) {
        return Err(ParameterError::CropTooLarge {
            crop_dim: params.crop_dim,
            width,
            height,
        }
        .into());
    }

    let mask = synthesize(width, height, params, rng)?;
    let sample = composite(assets.background, assets.texture, mask, params.crop_dim, rng)?;

    debug!(
        width = sample.image.width(),
        height = sample.image.height(),
        "Generated sample"
    );

    Ok(sample)
}

/// Generate one labelled sample from a background and a texture file
pub fn generate_sample<R: Rng + ?Sized>(
    background_path: &Path,
    texture_path: &Path,
    params: &GenerationParams,
    rng: &mut R,
) -> Result<SampleRecord, SampleError> {
    params.validate()?;
    let assets = assets::load(background_path, texture_path, rng)?;
    generate_from_assets(assets, params, rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::mask::synthesize_around;
    use image::{Rgb, RgbImage};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const GRAY: Rgb<u8> = Rgb([128, 128, 128]);
    const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

    fn solid_assets(width: u32, height: u32, rng: &mut StdRng) -> LoadedAssets {
        LoadedAssets::from_images(
            RgbImage::from_pixel(width, height, GRAY),
            RgbImage::from_pixel(width, height, WHITE),
            rng,
        )
    }

    #[test]
    fn test_generated_pixels_come_from_texture_or_background() {
        let mut rng = StdRng::seed_from_u64(42);
        let assets = solid_assets(64, 64, &mut rng);
        let params = GenerationParams {
            num_locations: 3,
            sigma: 6.0,
            num_points: 200,
            radius: 1,
            crop_dim: 32,
            ..Default::default()
        };

        let sample = generate_from_assets(assets, &params, &mut rng).unwrap();
        assert_eq!(sample.dimensions(), (32, 32));
        for (x, y, px) in sample.image.enumerate_pixels() {
            let expected = if sample.mask.get_pixel(x, y).0[0] == 255 { WHITE } else { GRAY };
            assert_eq!(*px, expected);
        }
    }

    #[test]
    fn test_forced_center_sample_shows_texture_inside_mask() {
        let mut rng = StdRng::seed_from_u64(0);
        let params = GenerationParams {
            num_locations: 1,
            sigma: 0.0,
            num_points: 1,
            radius: 5,
            crop_dim: 0,
            ..Default::default()
        };
        let assets = solid_assets(100, 100, &mut rng);
        let mask = synthesize_around(100, 100, &[(50, 50)], &params, &mut rng).unwrap();

        let sample = composite(assets.background, assets.texture, mask, 0, &mut rng).unwrap();
        assert_eq!(sample.dimensions(), (100, 100));
        assert_eq!(*sample.image.get_pixel(50, 50), WHITE);
        assert_eq!(*sample.image.get_pixel(0, 0), GRAY);
        assert_eq!(sample.mask.get_pixel(50, 50).0[0], 255);
        assert_eq!(sample.mask.get_pixel(0, 0).0[0], 0);
    }

    #[test]
    fn test_crop_larger_than_texture_is_parameter_error() {
        let mut rng = StdRng::seed_from_u64(1);
        let assets = solid_assets(20, 40, &mut rng);
        let params = GenerationParams::default().with_crop(21);

        let err = generate_from_assets(assets, &params, &mut rng).unwrap_err();
        assert!(matches!(err, SampleError::Parameter(ParameterError::CropTooLarge { .. })));
        assert!(!err.is_skippable());
    }

    #[test]
    fn test_missing_files_are_skippable() {
        let mut rng = StdRng::seed_from_u64(1);
        let missing = Path::new("/nonexistent/background.png");
        let err = generate_sample(missing, missing, &GenerationParams::default(), &mut rng)
            .unwrap_err();
        assert!(err.is_skippable());
    }

    #[test]
    fn test_invalid_params_checked_before_loading() {
        let mut rng = StdRng::seed_from_u64(1);
        let missing = Path::new("/nonexistent/background.png");
        let params = GenerationParams {
            sigma: -1.0,
            ..Default::default()
        };
        let err = generate_sample(missing, missing, &params, &mut rng).unwrap_err();
        assert!(matches!(err, SampleError::Parameter(ParameterError::InvalidSigma(_))));
    }
}
