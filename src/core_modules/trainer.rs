// THEORY:
// The training loop drives one `Autoencoder` over every block of one image until
// the aggregate reconstruction error drops to the requested threshold.
//
// An epoch is a full sweep of weight updates followed by one error measurement:
// 1.  **Update phase**: every block contributes its red, green and blue vectors
//     as three samples. With the `Online` strategy they are applied one at a
//     time, in geometry order then channel order. With `Batch` the per-block
//     gradients are computed in parallel from the epoch-start weights, summed
//     in geometry order, and their mean is applied once. Batch training is
//     plain gradient descent and converges differently from online training.
// 2.  **Error phase**: the aggregate error is the sum of `sample_error` over all
//     samples, measured with the post-update weights. Per-block errors are
//     computed in parallel and added in geometry order.
//
// No floating-point sum depends on how rayon splits the work, so a fixed seed
// reproduces the same epochs and weights for any worker count.
//
// The loop repeats while the error is above the threshold or is not a number.
// It is bounded twice: a run whose error stays non-finite for
// `divergence_patience` epochs fails with `TrainingDiverged`, and no run goes
// past `max_epochs`.

use std::time::{Duration, Instant};

use ndarray::Array1;
use rayon::prelude::*;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::core_modules::autoencoder::{Autoencoder, Gradients};
use crate::core_modules::block_vectorizer::{Block, CHANNELS};
use crate::error::{CompressionError, Result};

/// How weight updates are scheduled within one epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum UpdateStrategy {
    /// One sequential update per sample.
    #[default]
    Online,
    /// Parallel gradients, one averaged update per epoch.
    Batch,
}

/// Knobs for a single training run.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingOptions {
    pub learning_rate: f64,
    pub error_threshold: f64,
    pub max_epochs: u64,
    pub divergence_patience: u32,
    pub strategy: UpdateStrategy,
    /// Epochs between `info`-level progress lines.
    pub log_interval: u64,
}

impl Default for TrainingOptions {
    fn default() -> Self {
        Self {
            learning_rate: 0.001,
            error_threshold: 10.0,
            max_epochs: 10_000,
            divergence_patience: 3,
            strategy: UpdateStrategy::Online,
            log_interval: 100,
        }
    }
}

/// Mutable bookkeeping of one run.
#[derive(Debug, Clone)]
struct TrainingState {
    step: u64,
    error: f64,
    non_finite_epochs: u32,
    errors: Vec<f64>,
}

impl TrainingState {
    fn new() -> Self {
        Self {
            step: 0,
            error: f64::INFINITY,
            non_finite_epochs: 0,
            errors: Vec::new(),
        }
    }

    fn record(&mut self, error: f64) {
        self.error = error;
        self.errors.push(error);
        if error.is_finite() {
            self.non_finite_epochs = 0;
        } else {
            self.non_finite_epochs += 1;
        }
    }
}

/// Summary of a finished run.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingReport {
    /// Completed epochs.
    pub epochs: u64,
    /// Aggregate error after the last epoch.
    pub final_error: f64,
    pub learning_rate: f64,
    pub error_threshold: f64,
    pub strategy: UpdateStrategy,
    /// Aggregate error after each epoch, in order.
    pub errors: Vec<f64>,
    pub elapsed: Duration,
}

/// The bottleneck codes and decoded vectors of one block, per channel in R, G, B order.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedBlock {
    pub hidden: [Array1<f64>; CHANNELS],
    pub output: [Array1<f64>; CHANNELS],
}

/// Trains an autoencoder on a fixed, ordered set of blocks.
pub struct TrainingLoop<'a> {
    blocks: &'a [Block],
    options: TrainingOptions,
}

impl<'a> TrainingLoop<'a> {
    pub fn new(blocks: &'a [Block], options: TrainingOptions) -> Self {
        Self { blocks, options }
    }

    /// Trains `autoencoder` in place until the aggregate error reaches the threshold.
    pub fn run(&self, autoencoder: &mut Autoencoder) -> Result<TrainingReport> {
        self.check_shapes(autoencoder)?;
        let options = &self.options;
        let started = Instant::now();
        let mut state = TrainingState::new();

        info!(
            blocks = self.blocks.len(),
            block_len = autoencoder.block_len(),
            hidden_size = autoencoder.hidden_size(),
            strategy = ?options.strategy,
            "starting training"
        );

        loop {
            state.step += 1;
            match options.strategy {
                UpdateStrategy::Online => self.online_epoch(autoencoder),
                UpdateStrategy::Batch => self.batch_epoch(autoencoder),
            }
            state.record(aggregate_error(autoencoder, self.blocks));

            debug!(epoch = state.step, error = state.error, "epoch complete");
            if options.log_interval > 0 && state.step % options.log_interval == 0 {
                info!(
                    "Error after epoch {}: {} of {}",
                    state.step, state.error, options.error_threshold
                );
            }

            if state.error <= options.error_threshold {
                break;
            }

            if !state.error.is_finite() {
                warn!(
                    epoch = state.step,
                    consecutive = state.non_finite_epochs,
                    "aggregate error is not finite"
                );
                if state.non_finite_epochs >= options.divergence_patience {
                    return Err(CompressionError::TrainingDiverged {
                        epochs: state.step,
                        error: state.error,
                    });
                }
            }

            if state.step >= options.max_epochs {
                return Err(if state.error.is_finite() {
                    CompressionError::EpochLimitReached {
                        epochs: state.step,
                        error: state.error,
                    }
                } else {
                    CompressionError::TrainingDiverged {
                        epochs: state.step,
                        error: state.error,
                    }
                });
            }
        }

        let report = TrainingReport {
            epochs: state.step,
            final_error: state.error,
            learning_rate: options.learning_rate,
            error_threshold: options.error_threshold,
            strategy: options.strategy,
            errors: state.errors,
            elapsed: started.elapsed(),
        };
        info!(
            epochs = report.epochs,
            error = report.final_error,
            allowed_error = report.error_threshold,
            learning_rate = report.learning_rate,
            "training is over"
        );
        Ok(report)
    }

    fn check_shapes(&self, autoencoder: &Autoencoder) -> Result<()> {
        match self.blocks.iter().find(|b| b.len() != autoencoder.block_len()) {
            Some(block) => Err(CompressionError::ShapeMismatch {
                expected: vec![autoencoder.block_len()],
                got: vec![block.len()],
            }),
            None => Ok(()),
        }
    }

    fn online_epoch(&self, autoencoder: &mut Autoencoder) {
        let learning_rate = self.options.learning_rate;
        for block in self.blocks {
            for channel in block.channels() {
                autoencoder.update_weights(channel, learning_rate);
            }
        }
    }

    fn batch_epoch(&self, autoencoder: &mut Autoencoder) {
        let samples = self.blocks.len() * CHANNELS;
        if samples == 0 {
            return;
        }
        let (block_len, hidden_size) = (autoencoder.block_len(), autoencoder.hidden_size());
        let frozen = &*autoencoder;

        let per_block: Vec<Gradients> = self
            .blocks
            .par_iter()
            .map(|block| {
                let mut sum = Gradients::zeros(block_len, hidden_size);
                for channel in block.channels() {
                    sum.accumulate(&frozen.gradients(channel));
                }
                sum
            })
            .collect();

        let mut total = Gradients::zeros(block_len, hidden_size);
        for gradients in &per_block {
            total.accumulate(gradients);
        }
        total.scale(1.0 / samples as f64);
        autoencoder.apply(&total, self.options.learning_rate);
    }
}

/// Sum of `sample_error` over every channel of every block.
///
/// Per-block errors are computed in parallel and added in geometry order, so
/// the result does not depend on the pool size.
pub fn aggregate_error(autoencoder: &Autoencoder, blocks: &[Block]) -> f64 {
    let per_block: Vec<f64> = blocks
        .par_iter()
        .map(|block| {
            block
                .channels()
                .into_iter()
                .map(|channel| autoencoder.sample_error(channel))
                .sum::<f64>()
        })
        .collect();
    per_block.into_iter().sum()
}

/// Runs every block through the trained network, keeping geometry order.
pub fn encode_blocks(autoencoder: &Autoencoder, blocks: &[Block]) -> Vec<EncodedBlock> {
    blocks
        .par_iter()
        .map(|block| {
            let [red, green, blue] = block.channels().map(|channel| autoencoder.forward(channel));
            EncodedBlock {
                hidden: [red.hidden, green.hidden, blue.hidden],
                output: [red.output, green.output, blue.output],
            }
        })
        .collect()
}
