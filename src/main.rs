//! Rust-Texture-Synth
//!
//! Generates synthetic rust-defect segmentation samples: a rust texture is
//! composited onto a background through a procedurally grown mask, and the
//! image/mask pair is written to disk.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;

use rust_texture_synth::config::Settings;
use rust_texture_synth::engine::{assets, mask, negatives, BatchJob, OutputFormat};

/// Synthetic rust defect sample generator
#[derive(Parser, Debug)]
#[command(name = "rust-texture-synth")]
#[command(version)]
#[command(about = "Generate random rust data from rust textures", long_about = None)]
struct Cli {
    /// Emit logs as JSON
    #[arg(long, default_value = "false")]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate composited images with matching masks
    Generate {
        /// Path to background directory
        #[arg(long)]
        backgrounds_path: Option<PathBuf>,

        /// Path to texture directory
        #[arg(long)]
        textures_path: Option<PathBuf>,

        /// Path to save directory
        #[arg(long)]
        save_path: Option<PathBuf>,

        /// Number of images to be generated
        #[arg(long)]
        num_images: Option<u64>,

        /// Start iteration, useful for generating over multiple sessions
        #[arg(long)]
        start_iter: Option<u64>,

        /// Dimension of output; 0 preserves the texture size
        #[arg(long, allow_negative_numbers = true)]
        out_dim: Option<i64>,

        /// Save type, .png or .jpg
        #[arg(long)]
        save_type: Option<String>,

        /// Seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,

        #[command(flatten)]
        mask: MaskArgs,
    },

    /// Synthesize a single mask sized like a texture
    Mask {
        /// Texture whose dimensions the mask takes
        #[arg(long)]
        texture: PathBuf,

        /// Output file
        #[arg(short, long, default_value = "mask.png")]
        output: PathBuf,

        /// Seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,

        #[command(flatten)]
        mask: MaskArgs,
    },

    /// Create blank masks for a folder of images that contain no rust
    Negatives {
        /// Path to folder of images to be masked
        #[arg(long)]
        dataset_path: PathBuf,

        /// Path to save folder, defaults to <dataset>_masked
        #[arg(long)]
        save_path: Option<PathBuf>,

        /// Keep the original image names
        #[arg(long, default_value = "false")]
        keep_names: bool,

        /// Save type, .png or .jpg
        #[arg(long, default_value = ".png")]
        save_type: String,
    },
}

/// Mask synthesis overrides
#[derive(clap::Args, Debug, Default)]
struct MaskArgs {
    /// Number of cluster centers
    #[arg(long, allow_negative_numbers = true)]
    num_locations: Option<i64>,

    /// Spread of the points around each center
    #[arg(long, allow_negative_numbers = true)]
    sigma: Option<f64>,

    /// Points sampled per cluster
    #[arg(long, allow_negative_numbers = true)]
    num_points: Option<i64>,

    /// Disk radius drawn per point
    #[arg(long, allow_negative_numbers = true)]
    radius: Option<i64>,

    /// Structuring element width
    #[arg(long)]
    kernel_width: Option<i64>,

    /// Structuring element height
    #[arg(long)]
    kernel_height: Option<i64>,
}

impl MaskArgs {
    fn apply(&self, settings: &mut Settings) {
        let mask = &mut settings.mask;
        if let Some(v) = self.num_locations {
            mask.num_locations = v;
        }
        if let Some(v) = self.sigma {
            mask.sigma = v;
        }
        if let Some(v) = self.num_points {
            mask.num_points = v;
        }
        if let Some(v) = self.radius {
            mask.radius = v;
        }
        if let Some(v) = self.kernel_width {
            mask.kernel_width = v;
        }
        if let Some(v) = self.kernel_height {
            mask.kernel_height = v;
        }
    }
}

fn init_logging(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("rust_texture_synth=info"));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn rng_from(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let mut settings = Settings::load().context("Failed to load configuration")?;

    init_logging(cli.json_logs || settings.logging.json);

    info!("Starting Rust-Texture-Synth v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Generate {
            backgrounds_path,
            textures_path,
            save_path,
            num_images,
            start_iter,
            out_dim,
            save_type,
            seed,
            mask,
        } => {
            let generation = &mut settings.generation;
            if let Some(v) = backgrounds_path {
                generation.backgrounds_path = v;
            }
            if let Some(v) = textures_path {
                generation.textures_path = v;
            }
            if let Some(v) = save_path {
                generation.save_path = v;
            }
            if let Some(v) = num_images {
                generation.num_images = v;
            }
            if let Some(v) = start_iter {
                generation.start_iter = v;
            }
            if let Some(v) = out_dim {
                generation.out_dim = v;
            }
            if let Some(v) = save_type {
                generation.save_type = v;
            }
            if seed.is_some() {
                generation.seed = seed;
            }
            mask.apply(&mut settings);

            let params = settings
                .generation_params()
                .context("Invalid generation parameters")?;
            let format: OutputFormat = settings.generation.save_type.parse()?;

            let job = BatchJob {
                backgrounds_path: settings.generation.backgrounds_path.clone(),
                textures_path: settings.generation.textures_path.clone(),
                save_path: settings.generation.save_path.clone(),
                num_images: settings.generation.num_images,
                start_iter: settings.generation.start_iter,
                format,
                params,
                seed: settings.generation.seed,
            };

            let report = job.run().context("Batch generation failed")?;
            info!(
                generated = report.generated,
                skipped = report.skipped,
                "Saved samples to {}",
                job.save_path.display()
            );
        }

        Commands::Mask {
            texture,
            output,
            seed,
            mask: mask_args,
        } => {
            mask_args.apply(&mut settings);
            let params = settings
                .generation_params()
                .context("Invalid generation parameters")?;

            let mut rng = rng_from(seed.or(settings.generation.seed));
            let image = assets::read_rgb(&texture)?;
            let (width, height) = image.dimensions();
            let synthesized = mask::synthesize(width, height, &params, &mut rng)?;
            synthesized
                .save(&output)
                .with_context(|| format!("Failed to save {}", output.display()))?;

            info!(width = width, height = height, "Saved mask to {}", output.display());
        }

        Commands::Negatives {
            dataset_path,
            save_path,
            keep_names,
            save_type,
        } => {
            let format: OutputFormat = save_type.parse()?;
            let save_path =
                save_path.unwrap_or_else(|| negatives::default_save_path(&dataset_path));
            let written =
                negatives::write_negatives(&dataset_path, &save_path, keep_names, format)?;
            info!(written = written, "Saved images and masks in {}", save_path.display());
        }
    }

    Ok(())
}
