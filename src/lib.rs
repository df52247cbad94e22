// THEORY:
// This file is the entry point of the `block_autoencoder` library crate.
//
// The crate compresses a single image by training a small, purely linear
// autoencoder on the image's own pixel blocks, then rebuilding the image from
// what the network reproduces. The high-level interface is `CompressionPipeline`
// (in `pipeline`), configured by `CompressionConfig` (in `config`). The building
// blocks under `core_modules` stay public so each stage can be used and tested
// on its own:
//
// - `block_geometry`: where the blocks are
// - `block_vectorizer`: pixels to normalized vectors and back
// - `autoencoder`: weights, forward pass, error, update step
// - `trainer`: the epoch loop and its update strategies
// - `reconstructor`: vectors back onto a canvas
// - `metrics`: compression rate and PSNR

pub mod config;
pub mod core_modules;
pub mod error;
pub mod pipeline;

pub use config::CompressionConfig;
pub use error::{CompressionError, Result};
pub use pipeline::{CompressedImage, CompressionPipeline, CompressionReport};
