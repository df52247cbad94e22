// THEORY:
// The `pipeline` module is the top-level API of the codec. It wires the core
// modules into one call: image in, trained network and reconstructed image out.
//
//   image ─► BlockGeometry ─► extract_all ─► TrainingLoop
//         ─► encode_blocks ─► reconstruct ─► image
//
// Every intermediate value is passed explicitly from one stage to the next. The
// geometry computed on the way in is the same value used on the way out, and the
// weights live inside the `Autoencoder` handed back in the result.
//
// Writing the output is a separate step on `CompressedImage`. A failed write
// leaves the value untouched, so the codes, weights and reconstruction can
// still be read or written somewhere else.

use std::path::Path;

use image::RgbImage;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info};

use crate::config::CompressionConfig;
use crate::core_modules::autoencoder::Autoencoder;
use crate::core_modules::block_geometry::BlockGeometry;
use crate::core_modules::block_vectorizer::extract_all;
use crate::core_modules::metrics::{compression_rate, compute_psnr};
use crate::core_modules::reconstructor::reconstruct;
use crate::core_modules::trainer::{EncodedBlock, TrainingLoop, encode_blocks};
use crate::core_modules::utils::image_helper::{load_rgb, save_png};
use crate::error::{CompressionError, Result};

// Re-export key data structures for the public API.
pub use crate::core_modules::trainer::{TrainingReport, UpdateStrategy};

/// What a finished run achieved.
#[derive(Debug, Clone, PartialEq)]
pub struct CompressionReport {
    pub training: TrainingReport,
    /// Number of blocks the image was split into.
    pub block_count: usize,
    /// Length of one channel vector of a block.
    pub block_len: usize,
    pub hidden_size: usize,
    pub compression_rate: f64,
    /// Reconstruction quality against the source, in dB.
    pub psnr: f64,
}

/// The outcome of compressing one image.
#[derive(Debug, Clone)]
pub struct CompressedImage {
    geometry: BlockGeometry,
    blocks: Vec<EncodedBlock>,
    autoencoder: Autoencoder,
    reconstructed: RgbImage,
    report: CompressionReport,
}

impl CompressedImage {
    pub fn geometry(&self) -> &BlockGeometry {
        &self.geometry
    }

    /// Per-block codes and decoded vectors, in geometry order.
    pub fn blocks(&self) -> &[EncodedBlock] {
        &self.blocks
    }

    pub fn autoencoder(&self) -> &Autoencoder {
        &self.autoencoder
    }

    pub fn reconstructed(&self) -> &RgbImage {
        &self.reconstructed
    }

    pub fn report(&self) -> &CompressionReport {
        &self.report
    }

    /// Writes the reconstruction as PNG.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        save_png(path, &self.reconstructed)?;
        info!(path = %path.display(), "reconstructed image written");
        Ok(())
    }
}

/// Compresses images with one validated configuration.
pub struct CompressionPipeline {
    config: CompressionConfig,
    pool: rayon::ThreadPool,
}

impl CompressionPipeline {
    /// Validates `config` and prepares the worker pool.
    pub fn new(config: CompressionConfig) -> Result<Self> {
        config.validate()?;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.worker_threads())
            .build()?;
        Ok(Self { config, pool })
    }

    pub fn config(&self) -> &CompressionConfig {
        &self.config
    }

    /// Loads `path` and compresses it.
    pub fn compress_file(&self, path: impl AsRef<Path>) -> Result<CompressedImage> {
        let path = path.as_ref();
        let source = load_rgb(path)?;
        info!(
            path = %path.display(),
            width = source.width(),
            height = source.height(),
            "source image loaded"
        );
        self.compress(&source)
    }

    /// Trains a fresh autoencoder on the blocks of `source` and reconstructs it.
    pub fn compress(&self, source: &RgbImage) -> Result<CompressedImage> {
        let config = &self.config;
        config.validate_for_image(source.width(), source.height())?;

        let geometry = BlockGeometry::new(
            source.width(),
            source.height(),
            config.block_height,
            config.block_width,
        )?;
        let blocks = extract_all(source, &geometry)?;
        debug!(
            blocks = blocks.len(),
            block_height = config.block_height,
            block_width = config.block_width,
            "image split into blocks"
        );

        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut autoencoder =
            Autoencoder::random(geometry.block_len(), config.hidden_size, &mut rng);

        let (training, encoded) = self.pool.install(|| {
            let report =
                TrainingLoop::new(&blocks, config.training_options()).run(&mut autoencoder)?;
            Ok::<_, CompressionError>((report, encode_blocks(&autoencoder, &blocks)))
        })?;

        let reconstructed = reconstruct(&geometry, &encoded)?;
        let report = CompressionReport {
            training,
            block_count: geometry.len(),
            block_len: geometry.block_len(),
            hidden_size: config.hidden_size,
            compression_rate: compression_rate(
                geometry.block_len(),
                geometry.len(),
                config.hidden_size,
            ),
            psnr: compute_psnr(source, &reconstructed),
        };
        info!(
            compression_rate = report.compression_rate,
            psnr = report.psnr,
            learning_steps = report.training.epochs,
            "compression finished"
        );

        Ok(CompressedImage {
            geometry,
            blocks: encoded,
            autoencoder,
            reconstructed,
            report,
        })
    }
}
