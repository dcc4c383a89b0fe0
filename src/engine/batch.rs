//! Batch generation over background and texture folders
//!
//! Each index picks a random background and texture, generates one sample and
//! writes `images/rust{index}{ext}` and `masks/rust{index}{ext}`. Indices are
//! independent, so they run in parallel with every worker owning its own rng.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use image::ImageError;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rayon::prelude::*;
use thiserror::Error;
use tracing::{info, warn};

use crate::domain::{GenerationParams, SampleRecord};
use super::generator::{generate_sample, SampleError};

/// Extensions considered when listing asset folders
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "tif", "tiff"];

/// Batch errors
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("No images found in {0}")]
    EmptyDirectory(PathBuf),
    #[error("Sample {index} failed: {source}")]
    Sample {
        index: u64,
        #[source]
        source: SampleError,
    },
    #[error("Index range {start}+{count} overflows u64")]
    IndexOverflow { start: u64, count: u64 },
    #[error("Failed to save {path}: {source}")]
    Save {
        path: PathBuf,
        #[source]
        source: ImageError,
    },
}

/// Output raster format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Png,
    Jpg,
}

#[derive(Debug, Error, PartialEq)]
#[error("Unsupported output type '{0}', expected .png or .jpg")]
pub struct UnknownFormat(pub String);

impl OutputFormat {
    /// File extension including the leading dot
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Png => ".png",
            OutputFormat::Jpg => ".jpg",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "png" => Ok(OutputFormat::Png),
            "jpg" | "jpeg" => Ok(OutputFormat::Jpg),
            _ => Err(UnknownFormat(s.to_string())),
        }
    }
}

/// Summary of a finished batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub generated: usize,
    pub skipped: usize,
}

enum Outcome {
    Written,
    Skipped,
}

/// A resumable batch of generated samples
#[derive(Debug, Clone)]
pub struct BatchJob {
    pub backgrounds_path: PathBuf,
    pub textures_path: PathBuf,
    pub save_path: PathBuf,
    pub num_images: u64,
    pub start_iter: u64,
    pub format: OutputFormat,
    pub params: GenerationParams,
    /// Fixed seed for reproducible runs; each index derives its own stream
    pub seed: Option<u64>,
}

impl BatchJob {
    pub fn images_dir(&self) -> PathBuf {
        self.save_path.join("images")
    }

    pub fn masks_dir(&self) -> PathBuf {
        self.save_path.join("masks")
    }

    /// File name written for `index`
    pub fn file_name(&self, index: u64) -> String {
        format!("rust{}{}", index, self.format.extension())
    }

    /// Generate every index in `start_iter..start_iter + num_images`
    pub fn run(&self) -> Result<BatchReport, BatchError> {
        self.params.validate().map_err(|e| BatchError::Sample {
            index: self.start_iter,
            source: e.into(),
        })?;

        let end = self
            .start_iter
            .checked_add(self.num_images)
            .ok_or(BatchError::IndexOverflow {
                start: self.start_iter,
                count: self.num_images,
            })?;

        let backgrounds = list_images(&self.backgrounds_path)?;
        let textures = list_images(&self.textures_path)?;

        for dir in [self.save_path.clone(), self.images_dir(), self.masks_dir()] {
            std::fs::create_dir_all(&dir).map_err(|source| BatchError::Io {
                path: dir.clone(),
                source,
            })?;
        }

        info!(
            backgrounds = backgrounds.len(),
            textures = textures.len(),
            start = self.start_iter,
            count = self.num_images,
            save_path = %self.save_path.display(),
            "Starting batch generation"
        );

        let outcomes = (self.start_iter..end)
            .into_par_iter()
            .map(|index| self.generate_index(index, &backgrounds, &textures))
            .collect::<Result<Vec<_>, _>>()?;

        let mut report = BatchReport::default();
        for outcome in outcomes {
            match outcome {
                Outcome::Written => report.generated += 1,
                Outcome::Skipped => report.skipped += 1,
            }
        }

        info!(
            generated = report.generated,
            skipped = report.skipped,
            "Batch generation complete"
        );

        Ok(report)
    }

    /// One stream per (seed, index) pair
    fn rng_for(&self, index: u64) -> StdRng {
        match self.seed {
            Some(seed) => {
                let mut bytes = [0u8; 32];
                bytes[..8].copy_from_slice(&seed.to_le_bytes());
                bytes[8..16].copy_from_slice(&index.to_le_bytes());
                StdRng::from_seed(bytes)
            }
            None => StdRng::from_entropy(),
        }
    }

    fn generate_index(
        &self,
        index: u64,
        backgrounds: &[PathBuf],
        textures: &[PathBuf],
    ) -> Result<Outcome, BatchError> {
        let mut rng = self.rng_for(index);

        // Both lists were checked non-empty by list_images
        let (Some(background), Some(texture)) =
            (backgrounds.choose(&mut rng), textures.choose(&mut rng))
        else {
            return Ok(Outcome::Skipped);
        };

        match generate_sample(background, texture, &self.params, &mut rng) {
            Ok(sample) => {
                self.save(index, &sample)?;
                info!(index = index, "Saved image {}", index);
                Ok(Outcome::Written)
            }
            Err(e) if e.is_skippable() => {
                warn!(
                    index = index,
                    background = %background.display(),
                    texture = %texture.display(),
                    error = %e,
                    "Skipping sample"
                );
                Ok(Outcome::Skipped)
            }
            Err(source) => Err(BatchError::Sample { index, source }),
        }
    }

    fn save(&self, index: u64, sample: &SampleRecord) -> Result<(), BatchError> {
        let name = self.file_name(index);

        let image_path = self.images_dir().join(&name);
        sample.image.save(&image_path).map_err(|source| BatchError::Save {
            path: image_path.clone(),
            source,
        })?;

        let mask_path = self.masks_dir().join(&name);
        sample.mask.save(&mask_path).map_err(|source| BatchError::Save {
            path: mask_path.clone(),
            source,
        })?;

        Ok(())
    }
}

/// Sorted image files directly inside `dir`
pub fn list_images(dir: &Path) -> Result<Vec<PathBuf>, BatchError> {
    let io_err = |source| BatchError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if path.is_file() && has_image_extension(&path) {
            files.push(path);
        }
    }

    if files.is_empty() {
        return Err(BatchError::EmptyDirectory(dir.to_path_buf()));
    }

    files.sort();
    Ok(files)
}

pub(crate) fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}
