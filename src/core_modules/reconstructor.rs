// THEORY:
// Reconstruction is extraction run backwards. Each block's three channel vectors
// are reshaped and denormalized by the vectorizer, then painted onto a canvas at
// the block's rectangle. Blocks are painted in geometry order, so where the
// shifted border blocks overlap their neighbours the later block wins.

use image::{Rgb, RgbImage};

use crate::core_modules::block_geometry::BlockGeometry;
use crate::core_modules::block_vectorizer::inverse;
use crate::core_modules::trainer::EncodedBlock;
use crate::error::{CompressionError, Result};

/// Paints the decoded outputs of `encoded` back into an image the size of `geometry`.
pub fn reconstruct(geometry: &BlockGeometry, encoded: &[EncodedBlock]) -> Result<RgbImage> {
    if encoded.len() != geometry.len() {
        return Err(CompressionError::ShapeMismatch {
            expected: vec![geometry.len()],
            got: vec![encoded.len()],
        });
    }

    let height = geometry.block_height() as usize;
    let width = geometry.block_width() as usize;
    let mut canvas = RgbImage::new(geometry.image_width(), geometry.image_height());

    for (rect, block) in geometry.iter().zip(encoded) {
        let [red, green, blue] = &block.output;
        let red = inverse(red, height, width)?;
        let green = inverse(green, height, width)?;
        let blue = inverse(blue, height, width)?;
        for (row, col, x, y) in rect.pixels() {
            canvas.put_pixel(
                x,
                y,
                Rgb([red[[row, col]], green[[row, col]], blue[[row, col]]]),
            );
        }
    }

    Ok(canvas)
}
