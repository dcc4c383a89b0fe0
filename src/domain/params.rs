//! Generation parameters for mask synthesis and compositing
//!
//! One immutable bundle per generation call. Values arriving from
//! configuration are signed so that negative input can be rejected with a
//! descriptive error instead of wrapping.

use thiserror::Error;

/// Largest accepted structuring element side, in pixels
pub const MAX_KERNEL_DIM: u32 = 1024;

/// Parameter errors
#[derive(Debug, Error, PartialEq)]
pub enum ParameterError {
    #[error("{name} must be non-negative, got {value}")]
    Negative { name: &'static str, value: i64 },
    #[error("{name} is out of range: {value}")]
    OutOfRange { name: &'static str, value: i64 },
    #[error("sigma must be a finite non-negative number, got {0}")]
    InvalidSigma(f64),
    #[error("kernel size must be between 1x1 and 1024x1024, got {width}x{height}")]
    InvalidKernel { width: u32, height: u32 },
    #[error("crop dimension {crop_dim} exceeds image size {width}x{height}")]
    CropTooLarge { crop_dim: u32, width: u32, height: u32 },
}

/// Convert a signed configuration value into a pixel or count quantity
pub fn non_negative(name: &'static str, value: i64) -> Result<u32, ParameterError> {
    if value < 0 {
        return Err(ParameterError::Negative { name, value });
    }
    u32::try_from(value).map_err(|_| ParameterError::OutOfRange { name, value })
}

/// Width and height of the elliptical structuring element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KernelSize {
    pub width: u32,
    pub height: u32,
}

impl KernelSize {
    /// Small ellipse, keeps blobs close to the scattered dots
    pub const SMALL: KernelSize = KernelSize { width: 4, height: 5 };

    /// Wide ellipse, merges dots into large patches
    pub const WIDE: KernelSize = KernelSize { width: 20, height: 30 };

    pub fn new(width: u32, height: u32) -> Self {
        KernelSize { width, height }
    }

    /// Both sides within `1..=MAX_KERNEL_DIM`
    pub fn is_valid(&self) -> bool {
        let range = 1..=MAX_KERNEL_DIM;
        range.contains(&self.width) && range.contains(&self.height)
    }
}

impl Default for KernelSize {
    fn default() -> Self {
        KernelSize::SMALL
    }
}

/// Parameters for one generated sample
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    /// Number of cluster centers
    pub num_locations: u32,

    /// Standard deviation of the point scatter around each center, in pixels
    pub sigma: f64,

    /// Points sampled per cluster
    pub num_points: u32,

    /// Radius of the disk drawn for every point
    pub radius: u32,

    /// Structuring element used by the dilate/close/erode pass
    pub kernel_size: KernelSize,

    /// Side of the square output crop, 0 keeps the full texture size
    pub crop_dim: u32,
}

impl GenerationParams {
    /// Validate the parameter bundle
    pub fn validate(&self) -> Result<(), ParameterError> {
        if !self.sigma.is_finite() || self.sigma < 0.0 {
            return Err(ParameterError::InvalidSigma(self.sigma));
        }

        if !self.kernel_size.is_valid() {
            return Err(ParameterError::InvalidKernel {
                width: self.kernel_size.width,
                height: self.kernel_size.height,
            });
        }

        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn with_crop(mut self, crop_dim: u32) -> Self {
        self.crop_dim = crop_dim;
        self
    }

    #[cfg(test)]
    pub(crate) fn with_kernel(mut self, kernel_size: KernelSize) -> Self {
        self.kernel_size = kernel_size;
        self
    }

    /// Whether a square crop is requested
    pub fn crops(&self) -> bool {
        self.crop_dim > 0
    }
}

impl Default for GenerationParams {
    fn default() -> Self {
        GenerationParams {
            num_locations: 5,
            sigma: 60.0,
            num_points: 2000,
            radius: 1,
            kernel_size: KernelSize::SMALL,
            crop_dim: 512,
        }
    }
}
