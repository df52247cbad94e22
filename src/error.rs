//! Error types for block compression

use std::path::PathBuf;

use thiserror::Error;

/// Everything that can stop a compression run.
#[derive(Debug, Error)]
pub enum CompressionError {
    /// A configuration value is out of range, either on its own or for the image at hand
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The configuration file could not be read
    #[error("failed to read config {path:?}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for `CompressionConfig`
    #[error("failed to parse config {path:?}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// The input image is missing or undecodable
    #[error("failed to load image {path:?}: {source}")]
    ImageLoadFailure {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// The aggregate error stayed non-finite for too many epochs
    #[error("training diverged after {epochs} epochs (aggregate error {error})")]
    TrainingDiverged { epochs: u64, error: f64 },

    /// Training used every allowed epoch without reaching the error threshold
    #[error("training stopped at the {epochs}-epoch limit with aggregate error {error}")]
    EpochLimitReached { epochs: u64, error: f64 },

    /// The reconstructed image could not be written
    #[error("failed to write image {path:?}: {source}")]
    ImageWriteFailure {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// A vector or grid does not have the expected dimensions
    #[error("shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        got: Vec<usize>,
    },

    /// The worker pool for the data-parallel phases could not be created
    #[error("failed to build worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

/// Result type for compression operations
pub type Result<T> = std::result::Result<T, CompressionError>;
