//! Block autoencoder image compressor
//!
//! Trains a linear autoencoder on the blocks of one image and writes the
//! reconstruction as PNG.
//!
//! ## Usage
//!
//! ```bash
//! # 4x4 blocks, 8-wide bottleneck (the defaults)
//! block_autoencoder input.jpg output.png
//!
//! # Custom blocks and training
//! block_autoencoder input.jpg output.png --block-height 8 --block-width 8 \
//!     --hidden-size 16 --learning-rate 0.0005 --error-threshold 50
//!
//! # Settings from a file, flags still win
//! block_autoencoder input.jpg output.png --config codec.toml --seed 7
//! ```

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use block_autoencoder::core_modules::trainer::UpdateStrategy;
use block_autoencoder::{CompressionConfig, CompressionPipeline};

#[derive(Parser, Debug)]
#[command(name = "block_autoencoder")]
#[command(version)]
#[command(about = "Lossy image compression with a linear block autoencoder", long_about = None)]
struct Args {
    /// Image to compress
    input: PathBuf,

    /// Where to write the reconstructed PNG
    output: PathBuf,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Block height in pixels
    #[arg(long)]
    block_height: Option<u32>,

    /// Block width in pixels
    #[arg(long)]
    block_width: Option<u32>,

    /// Bottleneck size
    #[arg(long)]
    hidden_size: Option<usize>,

    /// Learning rate
    #[arg(long)]
    learning_rate: Option<f64>,

    /// Aggregate error at which training stops
    #[arg(long)]
    error_threshold: Option<f64>,

    /// Upper bound on training epochs
    #[arg(long)]
    max_epochs: Option<u64>,

    /// Seed for the weight initializer
    #[arg(long)]
    seed: Option<u64>,

    /// Weight update strategy
    #[arg(long, value_enum)]
    strategy: Option<UpdateStrategy>,

    /// Worker threads (defaults to the number of CPUs)
    #[arg(long)]
    threads: Option<usize>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn into_config(self) -> anyhow::Result<(CompressionConfig, PathBuf, PathBuf)> {
        let mut config = match &self.config {
            Some(path) => CompressionConfig::from_toml_file(path)?,
            None => CompressionConfig::default(),
        };

        if let Some(v) = self.block_height {
            config.block_height = v;
        }
        if let Some(v) = self.block_width {
            config.block_width = v;
        }
        if let Some(v) = self.hidden_size {
            config.hidden_size = v;
        }
        if let Some(v) = self.learning_rate {
            config.learning_rate = v;
        }
        if let Some(v) = self.error_threshold {
            config.error_threshold = v;
        }
        if let Some(v) = self.max_epochs {
            config.max_epochs = v;
        }
        if let Some(v) = self.strategy {
            config.strategy = v;
        }
        config.seed = self.seed.or(config.seed);
        config.threads = self.threads.or(config.threads);

        Ok((config, self.input, self.output))
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    let (config, input, output) = args.into_config()?;
    info!(
        block_height = config.block_height,
        block_width = config.block_width,
        hidden_size = config.hidden_size,
        learning_rate = config.learning_rate,
        error_threshold = config.error_threshold,
        strategy = ?config.strategy,
        "configuration"
    );

    let pipeline = CompressionPipeline::new(config)?;
    let compressed = pipeline
        .compress_file(&input)
        .with_context(|| format!("compressing {}", input.display()))?;

    let report = compressed.report();
    info!("Training is over!");
    info!("  Compression rate: {}", report.compression_rate);
    info!("  Learning steps:   {}", report.training.epochs);
    info!("  Final error:      {}", report.training.final_error);
    info!("  Allowed error:    {}", report.training.error_threshold);
    info!("  Learning rate:    {}", report.training.learning_rate);
    info!("  PSNR:             {:.2} dB", report.psnr);

    compressed
        .save(&output)
        .with_context(|| format!("writing {}", output.display()))?;

    Ok(())
}
