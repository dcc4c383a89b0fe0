//! Rust-Texture-Synth
//!
//! Synthetic rust-defect samples for segmentation datasets. A clustered point
//! process grows a binary mask, and a rust texture is composited onto a
//! background through it.

pub mod config;
pub mod domain;
pub mod engine;
