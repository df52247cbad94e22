use std::path::PathBuf;

use block_autoencoder::core_modules::block_geometry::BlockGeometry;
use block_autoencoder::core_modules::trainer::UpdateStrategy;
use block_autoencoder::core_modules::utils::image_helper::{load_rgb, save_png};
use block_autoencoder::{CompressionConfig, CompressionError, CompressionPipeline};
use image::{Rgb, RgbImage};

fn scratch(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("block_autoencoder_e2e_{}_{name}", std::process::id()))
}

fn solid_config() -> CompressionConfig {
    CompressionConfig {
        block_height: 2,
        block_width: 2,
        hidden_size: 4,
        learning_rate: 0.05,
        error_threshold: 0.5,
        max_epochs: 10_000,
        seed: Some(1),
        ..CompressionConfig::default()
    }
}

#[test]
fn solid_colour_converges_with_loose_threshold() {
    let source = RgbImage::from_pixel(4, 4, Rgb([200, 100, 50]));
    let compressed = CompressionPipeline::new(solid_config())
        .unwrap()
        .compress(&source)
        .unwrap();

    let report = compressed.report();
    assert!(report.training.epochs >= 1);
    assert!(report.training.final_error <= 0.5);
    assert_eq!(report.block_count, 4);
}

#[test]
fn solid_colour_with_small_rate_stops_at_threshold() {
    let source = RgbImage::from_pixel(4, 4, Rgb([200, 100, 50]));
    let config = CompressionConfig {
        learning_rate: 0.01,
        ..solid_config()
    };
    let compressed = CompressionPipeline::new(config).unwrap().compress(&source).unwrap();

    let report = compressed.report();
    assert!(report.training.final_error <= 0.5);
    assert_eq!(report.training.errors.len() as u64, report.training.epochs);
    assert_eq!(compressed.reconstructed().dimensions(), (4, 4));
}

#[test]
fn solid_colour_is_reproduced_with_full_bottleneck() {
    let source = RgbImage::from_pixel(4, 4, Rgb([200, 100, 50]));
    let config = CompressionConfig {
        error_threshold: 1e-6,
        ..solid_config()
    };
    let compressed = CompressionPipeline::new(config).unwrap().compress(&source).unwrap();

    for (expected, actual) in source.pixels().zip(compressed.reconstructed().pixels()) {
        for channel in 0..3 {
            let diff = (i16::from(expected[channel]) - i16::from(actual[channel])).abs();
            assert!(diff <= 1, "expected {expected:?}, got {actual:?}");
        }
    }
}

#[test]
fn batch_strategy_also_converges() {
    let source = RgbImage::from_pixel(4, 4, Rgb([20, 240, 130]));
    let config = CompressionConfig {
        strategy: UpdateStrategy::Batch,
        learning_rate: 0.2,
        max_epochs: 20_000,
        ..solid_config()
    };
    let compressed = CompressionPipeline::new(config).unwrap().compress(&source).unwrap();
    assert!(compressed.report().training.final_error <= 0.5);
}

#[test]
fn overlapping_geometry_reconstructs_full_canvas() {
    let source = RgbImage::from_fn(5, 5, |x, y| {
        if (x + y) % 2 == 0 {
            Rgb([230, 230, 230])
        } else {
            Rgb([20, 20, 20])
        }
    });
    let config = CompressionConfig {
        error_threshold: 1e-4,
        max_epochs: 50_000,
        ..solid_config()
    };
    let compressed = CompressionPipeline::new(config).unwrap().compress(&source).unwrap();

    assert_eq!(
        compressed.geometry(),
        &BlockGeometry::new(5, 5, 2, 2).unwrap()
    );
    assert_eq!(compressed.reconstructed().dimensions(), (5, 5));
    assert!(compressed.report().psnr > 30.0, "psnr {}", compressed.report().psnr);
}

#[test]
fn diverging_run_fails_instead_of_looping() {
    let source = RgbImage::from_pixel(4, 4, Rgb([255, 255, 255]));
    let config = CompressionConfig {
        learning_rate: 50.0,
        max_epochs: 1_000,
        ..solid_config()
    };
    let result = CompressionPipeline::new(config).unwrap().compress(&source);
    assert!(matches!(result, Err(CompressionError::TrainingDiverged { .. })));
}

#[test]
fn missing_input_fails_without_output() {
    let output = scratch("never_written.png");
    let pipeline = CompressionPipeline::new(solid_config()).unwrap();
    let result = pipeline.compress_file(scratch("missing_input.png"));
    assert!(matches!(result, Err(CompressionError::ImageLoadFailure { .. })));
    assert!(!output.exists());
}

#[test]
fn write_failure_keeps_the_compressed_result() {
    let source = RgbImage::from_pixel(4, 4, Rgb([10, 120, 240]));
    let compressed = CompressionPipeline::new(solid_config()).unwrap().compress(&source).unwrap();

    let bad_path = scratch("no_such_dir").join("out.png");
    let result = compressed.save(&bad_path);
    assert!(matches!(result, Err(CompressionError::ImageWriteFailure { .. })));

    assert_eq!(compressed.blocks().len(), 4);
    let good_path = scratch("recovered.png");
    compressed.save(&good_path).unwrap();
    let written = load_rgb(&good_path).unwrap();
    std::fs::remove_file(&good_path).ok();
    assert_eq!(&written, compressed.reconstructed());
}

#[test]
fn file_to_file_round_trip() {
    let input = scratch("input.png");
    let output = scratch("output.png");
    let source = RgbImage::from_fn(6, 4, |x, _| Rgb([(x * 40) as u8, 90, 200]));
    save_png(&input, &source).unwrap();

    let config = CompressionConfig {
        block_height: 2,
        block_width: 3,
        hidden_size: 6,
        error_threshold: 1e-3,
        max_epochs: 50_000,
        ..solid_config()
    };
    let compressed = CompressionPipeline::new(config).unwrap().compress_file(&input).unwrap();
    compressed.save(&output).unwrap();
    let written = load_rgb(&output).unwrap();

    std::fs::remove_file(&input).ok();
    std::fs::remove_file(&output).ok();

    assert_eq!(written.dimensions(), (6, 4));
    assert_eq!(&written, compressed.reconstructed());
}
