use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use image::codecs::png::PngEncoder;
use image::{ImageEncoder, RgbImage};

use crate::error::{CompressionError, Result};

/// Decodes any image format the `image` crate understands and drops alpha.
pub fn load_rgb(path: impl AsRef<Path>) -> Result<RgbImage> {
    let path = path.as_ref();
    image::open(path)
        .map(|decoded| decoded.to_rgb8())
        .map_err(|source| CompressionError::ImageLoadFailure {
            path: path.to_path_buf(),
            source,
        })
}

/// Writes `image` as an 8-bit RGB PNG.
pub fn save_png(path: impl AsRef<Path>, image: &RgbImage) -> Result<()> {
    let path = path.as_ref();
    write_png(path, image).map_err(|source| CompressionError::ImageWriteFailure {
        path: path.to_path_buf(),
        source,
    })
}

fn write_png(path: &Path, image: &RgbImage) -> std::result::Result<(), image::ImageError> {
    let output = BufWriter::new(File::create(path)?);
    let encoder = PngEncoder::new(output);

    encoder.write_image(
        image.as_raw(),
        image.width(),
        image.height(),
        image::ExtendedColorType::Rgb8,
    )?;

    Ok(())
}
