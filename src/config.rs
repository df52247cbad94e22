//! Compression configuration.
//!
//! Values come from three layers, lowest precedence first: the built-in
//! defaults, an optional TOML file, then command-line overrides applied by the
//! binary. `validate` runs before any image is read; `validate_for_image` adds
//! the checks that need the image size.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::core_modules::trainer::{TrainingOptions, UpdateStrategy};
use crate::error::{CompressionError, Result};

/// Every tunable of a compression run.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompressionConfig {
    /// Block height in pixels
    pub block_height: u32,
    /// Block width in pixels
    pub block_width: u32,
    /// Bottleneck width of the autoencoder
    pub hidden_size: usize,
    /// Step size of every weight update
    pub learning_rate: f64,
    /// Training stops once the aggregate error (summed over all blocks and
    /// channels) is at or below this
    pub error_threshold: f64,
    /// Hard bound on training length
    pub max_epochs: u64,
    /// Consecutive non-finite epochs tolerated before giving up
    pub divergence_patience: u32,
    /// Online (sequential) or batch (parallel, averaged) updates
    pub strategy: UpdateStrategy,
    /// Seed for the weight initializer; entropy when absent
    pub seed: Option<u64>,
    /// Worker threads for the parallel phases; all cores when absent
    pub threads: Option<usize>,
    /// Epochs between progress lines
    pub log_interval: u64,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        let training = TrainingOptions::default();
        Self {
            block_height: 4,
            block_width: 4,
            hidden_size: 8,
            learning_rate: training.learning_rate,
            error_threshold: training.error_threshold,
            max_epochs: training.max_epochs,
            divergence_patience: training.divergence_patience,
            strategy: training.strategy,
            seed: None,
            threads: None,
            log_interval: training.log_interval,
        }
    }
}

impl CompressionConfig {
    /// Reads a TOML file. Missing keys keep their defaults.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| CompressionError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| CompressionError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Checks every value that does not depend on the image.
    pub fn validate(&self) -> Result<()> {
        if self.block_height == 0 || self.block_width == 0 {
            return invalid(format!(
                "block dimensions must be positive, got {}x{}",
                self.block_height, self.block_width
            ));
        }
        if self.hidden_size == 0 {
            return invalid("hidden size must be positive".to_string());
        }
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return invalid(format!(
                "learning rate must be a positive number, got {}",
                self.learning_rate
            ));
        }
        if !self.error_threshold.is_finite() || self.error_threshold < 0.0 {
            return invalid(format!(
                "error threshold must be a non-negative number, got {}",
                self.error_threshold
            ));
        }
        if self.max_epochs == 0 {
            return invalid("max epochs must be positive".to_string());
        }
        if self.divergence_patience == 0 {
            return invalid("divergence patience must be positive".to_string());
        }
        if self.threads == Some(0) {
            return invalid("thread count must be positive".to_string());
        }
        if self.log_interval == 0 {
            return invalid("log interval must be positive".to_string());
        }
        Ok(())
    }

    /// `validate`, plus the block must fit inside a `width × height` image.
    pub fn validate_for_image(&self, width: u32, height: u32) -> Result<()> {
        self.validate()?;
        if self.block_height > height || self.block_width > width {
            return invalid(format!(
                "block {}x{} (height x width) does not fit in image {}x{}",
                self.block_height, self.block_width, height, width
            ));
        }
        Ok(())
    }

    pub fn training_options(&self) -> TrainingOptions {
        TrainingOptions {
            learning_rate: self.learning_rate,
            error_threshold: self.error_threshold,
            max_epochs: self.max_epochs,
            divergence_patience: self.divergence_patience,
            strategy: self.strategy,
            log_interval: self.log_interval,
        }
    }

    /// Worker count for the data-parallel phases.
    pub fn worker_threads(&self) -> usize {
        self.threads.unwrap_or_else(num_cpus::get)
    }
}

fn invalid(message: String) -> Result<()> {
    Err(CompressionError::InvalidConfiguration(message))
}
