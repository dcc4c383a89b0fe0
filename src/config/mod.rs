//! Configuration module for the rust texture generator

use serde::Deserialize;
use config::{Config, ConfigError, Environment, File};
use std::path::PathBuf;

use crate::domain::{non_negative, GenerationParams, KernelSize, ParameterError};

/// Main application settings
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub generation: GenerationSettings,
    pub mask: MaskSettings,
    pub logging: LoggingSettings,
}

/// Batch generation configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    pub backgrounds_path: PathBuf,
    pub textures_path: PathBuf,
    pub save_path: PathBuf,
    pub num_images: u64,
    /// First index to generate, for runs spread over several sessions
    pub start_iter: u64,
    /// Square output size; 0 keeps the texture size
    pub out_dim: i64,
    pub save_type: String,
    pub seed: Option<u64>,
}

/// Mask synthesis configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MaskSettings {
    pub num_locations: i64,
    pub sigma: f64,
    pub num_points: i64,
    pub radius: i64,
    pub kernel_width: i64,
    pub kernel_height: i64,
}

/// Logging configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub json: bool,
}

impl Settings {
    /// Load configuration from files and environment variables
    ///
    /// Configuration priority (highest to lowest):
    /// 1. Environment variables (prefixed with RUSTGEN_)
    /// 2. config/local.toml (gitignored)
    /// 3. config/default.toml
    pub fn load() -> Result<Self, ConfigError> {
        let config_dir = std::env::var("CONFIG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config"));

        let builder = Config::builder()
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            .add_source(File::from(config_dir.join("local.toml")).required(false))
            // RUSTGEN_MASK__SIGMA, RUSTGEN_GENERATION__NUM_IMAGES, ...
            .add_source(
                Environment::with_prefix("RUSTGEN")
                    .separator("__")
                    .try_parsing(true)
            );

        builder.build()?.try_deserialize()
    }

    /// Validated generation parameters for these settings
    pub fn generation_params(&self) -> Result<GenerationParams, ParameterError> {
        let params = GenerationParams {
            num_locations: non_negative("num_locations", self.mask.num_locations)?,
            sigma: self.mask.sigma,
            num_points: non_negative("num_points", self.mask.num_points)?,
            radius: non_negative("radius", self.mask.radius)?,
            kernel_size: KernelSize::new(
                non_negative("kernel_width", self.mask.kernel_width)?,
                non_negative("kernel_height", self.mask.kernel_height)?,
            ),
            crop_dim: non_negative("out_dim", self.generation.out_dim)?,
        };
        params.validate()?;
        Ok(params)
    }
}

impl Default for GenerationSettings {
    fn default() -> Self {
        GenerationSettings {
            backgrounds_path: PathBuf::from("backgrounds"),
            textures_path: PathBuf::from("rust_textures"),
            save_path: PathBuf::from("generated"),
            num_images: 1,
            start_iter: 0,
            out_dim: 512,
            save_type: ".png".to_string(),
            seed: None,
        }
    }
}

impl Default for MaskSettings {
    fn default() -> Self {
        let params = GenerationParams::default();
        MaskSettings {
            num_locations: params.num_locations as i64,
            sigma: params.sigma,
            num_points: params.num_points as i64,
            radius: params.radius as i64,
            kernel_width: params.kernel_size.width as i64,
            kernel_height: params.kernel_size.height as i64,
        }
    }
}
