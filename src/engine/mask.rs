//! Procedural rust mask synthesis
//!
//! Clustered point process: cluster centers are drawn uniformly over the
//! image, points scatter around each center with an isotropic Gaussian, every
//! point becomes a small filled disk, and a dilate/close/erode pass fuses the
//! dots into coherent blobs.

use image::{GrayImage, Luma};
use imageproc::drawing::draw_filled_circle_mut;
use rand::Rng;
use tracing::debug;

use crate::domain::{GenerationParams, ParameterError};
use super::morphology::{close, dilate, erode, StructuringElement};

/// Mask foreground value
pub const MASK_ON: u8 = 255;

/// Draw `count` cluster centers uniformly in `[0, width) x [0, height)`
pub fn random_centers<R: Rng + ?Sized>(
    width: u32,
    height: u32,
    count: u32,
    rng: &mut R,
) -> Vec<(i64, i64)> {
    if width == 0 || height == 0 {
        return Vec::new();
    }

    (0..count)
        .map(|_| {
            (
                rng.gen_range(0..width) as i64,
                rng.gen_range(0..height) as i64,
            )
        })
        .collect()
}

/// Scatter `count` points around `center`, rounded to the nearest pixel
pub fn scatter_points<R: Rng + ?Sized>(
    center: (i64, i64),
    sigma: f64,
    count: u32,
    rng: &mut R,
) -> Vec<(i64, i64)> {
    (0..count)
        .map(|_| {
            let (nx, ny) = box_muller_pair(rng);
            (
                (center.0 as f64 + nx * sigma).round() as i64,
                (center.1 as f64 + ny * sigma).round() as i64,
            )
        })
        .collect()
}

/// Two independent standard normal samples
fn box_muller_pair<R: Rng + ?Sized>(rng: &mut R) -> (f64, f64) {
    // u1 in (0, 1] keeps ln() finite
    let u1 = 1.0 - rng.gen::<f64>();
    let u2 = rng.gen::<f64>();
    let r = (-2.0 * u1.ln()).sqrt();
    let theta = std::f64::consts::TAU * u2;
    (r * theta.cos(), r * theta.sin())
}

/// Whether a disk of `radius` at `point` lies entirely inside the mask
pub fn disk_fits(point: (i64, i64), radius: u32, width: u32, height: u32) -> bool {
    let r = radius as i64;
    let (x, y) = point;
    x >= r && y >= r && x <= width as i64 - 1 - r && y <= height as i64 - 1 - r
}

/// Rasterize every point whose disk fits, skipping the rest.
///
/// Returns the number of disks drawn.
pub fn draw_dots(mask: &mut GrayImage, points: &[(i64, i64)], radius: u32) -> usize {
    let (width, height) = mask.dimensions();
    let mut drawn = 0;

    for &point in points {
        if !disk_fits(point, radius, width, height) {
            continue;
        }
        draw_filled_circle_mut(
            mask,
            (point.0 as i32, point.1 as i32),
            radius as i32,
            Luma([MASK_ON]),
        );
        drawn += 1;
    }

    drawn
}

/// Smooth raw dots into blobs
pub fn morph_dots(mask: &GrayImage, element: &StructuringElement) -> GrayImage {
    let mask = dilate(mask, element);
    let mask = close(&mask, element);
    erode(&mask, element)
}

/// Synthesize a mask with random cluster centers
pub fn synthesize<R: Rng + ?Sized>(
    width: u32,
    height: u32,
    params: &GenerationParams,
    rng: &mut R,
) -> Result<GrayImage, ParameterError> {
    params.validate()?;
    let centers = random_centers(width, height, params.num_locations, rng);
    synthesize_around(width, height, &centers, params, rng)
}

/// Synthesize a mask around caller-chosen cluster centers
pub fn synthesize_around<R: Rng + ?Sized>(
    width: u32,
    height: u32,
    centers: &[(i64, i64)],
    params: &GenerationParams,
    rng: &mut R,
) -> Result<GrayImage, ParameterError> {
    params.validate()?;

    let mut mask = GrayImage::new(width, height);
    let mut drawn = 0;
    let mut skipped = 0;

    for &center in centers {
        let points = scatter_points(center, params.sigma, params.num_points, rng);
        let count = draw_dots(&mut mask, &points, params.radius);
        drawn += count;
        skipped += points.len() - count;
    }

    let element = StructuringElement::ellipse(params.kernel_size)?;
    let mask = morph_dots(&mask, &element);

    debug!(
        width = width,
        height = height,
        clusters = centers.len(),
        drawn = drawn,
        skipped = skipped,
        "Synthesized mask"
    );

    Ok(mask)
}

/// Every pixel is either 0 or 255
pub fn is_binary(mask: &GrayImage) -> bool {
    mask.pixels().all(|p| p.0[0] == 0 || p.0[0] == MASK_ON)
}
