//! Negative samples: defect-free images paired with empty masks

use std::path::{Path, PathBuf};
use image::{GrayImage, ImageError};
use thiserror::Error;
use tracing::{info, warn};

use super::batch::{has_image_extension, OutputFormat};

#[derive(Debug, Error)]
pub enum NegativesError {
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to save {path}: {source}")]
    Save {
        path: PathBuf,
        #[source]
        source: ImageError,
    },
}

/// Default output folder: `<dataset name>_masked`
pub fn default_save_path(dataset_dir: &Path) -> PathBuf {
    PathBuf::from(format!("{}_masked", folder_name(dataset_dir)))
}

fn folder_name(dir: &Path) -> String {
    dir.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "dataset".to_string())
}

/// Copy every image of `dataset_dir` into `save_dir/images` with an all-zero
/// mask in `save_dir/masks`. Returns the number of pairs written.
pub fn write_negatives(
    dataset_dir: &Path,
    save_dir: &Path,
    keep_names: bool,
    format: OutputFormat,
) -> Result<usize, NegativesError> {
    let images_dir = save_dir.join("images");
    let masks_dir = save_dir.join("masks");
    for dir in [&images_dir, &masks_dir] {
        std::fs::create_dir_all(dir).map_err(|source| NegativesError::Io {
            path: dir.clone(),
            source,
        })?;
    }

    let io_err = |source| NegativesError::Io {
        path: dataset_dir.to_path_buf(),
        source,
    };
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dataset_dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if path.is_file() && has_image_extension(&path) {
            files.push(path);
        }
    }
    files.sort();

    let prefix = folder_name(dataset_dir);
    let mut written = 0;

    for (i, path) in files.iter().enumerate() {
        let image = match image::open(path) {
            Ok(image) => image.to_rgb8(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Skipping undecodable image");
                continue;
            }
        };

        let name = if keep_names {
            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| i.to_string());
            format!("{}{}", stem, format.extension())
        } else {
            format!("{}_{}{}", prefix, i, format.extension())
        };

        let mask = GrayImage::new(image.width(), image.height());

        let image_path = images_dir.join(&name);
        image.save(&image_path).map_err(|source| NegativesError::Save {
            path: image_path.clone(),
            source,
        })?;
        let mask_path = masks_dir.join(&name);
        mask.save(&mask_path).map_err(|source| NegativesError::Save {
            path: mask_path.clone(),
            source,
        })?;

        written += 1;
    }

    info!(
        written = written,
        save_path = %save_dir.display(),
        "Finished writing negative samples"
    );

    Ok(written)
}
