//! Domain types and models

mod params;
mod sample;

pub use params::{non_negative, GenerationParams, KernelSize, ParameterError, MAX_KERNEL_DIM};
pub use sample::SampleRecord;
