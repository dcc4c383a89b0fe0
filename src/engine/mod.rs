//! Synthetic sample generation engine
//!
//! This module contains the rust-texture generator:
//! - Asset loading and random flips
//! - Clustered mask synthesis with morphological smoothing
//! - Masked compositing and cropping
//! - Batch and negative-sample drivers

pub mod assets;
pub mod batch;
pub mod compositor;
pub mod generator;
pub mod mask;
pub mod morphology;
pub mod negatives;

pub use batch::{BatchJob, BatchReport, OutputFormat};
pub use generator::{generate_sample, SampleError};
