// THEORY:
// The vectorizer is the bridge between pixels and the autoencoder. A `Block`
// is a "dumb" container holding one rectangle's red, green and blue channels,
// each flattened to a vector of `block_height × block_width` values in [-1, 1].
//
// Two conventions are shared by `extract` and `inverse` and must never drift:
// - normalization maps a byte `v` to `2v/255 - 1`, denormalization maps `x`
//   back to `round(clamp(255(x + 1)/2, 0, 255))`;
// - grids are flattened column-major: the value at local `(row, col)` lands at
//   index `col * block_height + row`.

use image::RgbImage;
use ndarray::{Array1, Array2, ShapeBuilder};

use crate::core_modules::block_geometry::BlockGeometry;
use crate::core_modules::rect::Rect;
use crate::error::{CompressionError, Result};

/// Number of colour channels carried per block.
pub const CHANNELS: usize = 3;

/// One rectangle's channel vectors.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub red: Array1<f64>,
    pub green: Array1<f64>,
    pub blue: Array1<f64>,
}

impl Block {
    /// Flattens three `height × width` grids of normalized values.
    pub fn from_grids(red: &Array2<f64>, green: &Array2<f64>, blue: &Array2<f64>) -> Self {
        Self {
            red: flatten(red),
            green: flatten(green),
            blue: flatten(blue),
        }
    }

    /// The channel vectors in R, G, B order.
    pub fn channels(&self) -> [&Array1<f64>; CHANNELS] {
        [&self.red, &self.green, &self.blue]
    }

    /// Length of each channel vector.
    pub fn len(&self) -> usize {
        self.red.len()
    }

    pub fn is_empty(&self) -> bool {
        self.red.is_empty()
    }
}

/// Maps a channel byte into [-1, 1].
pub fn normalize(value: u8) -> f64 {
    2.0 * f64::from(value) / 255.0 - 1.0
}

/// Maps a network value back to a channel byte, saturating outside [-1, 1].
pub fn denormalize(value: f64) -> u8 {
    // NaN saturates to 0 through the cast.
    (255.0 * (value + 1.0) / 2.0).clamp(0.0, 255.0).round() as u8
}

/// Flattens a grid column-major.
pub fn flatten(grid: &Array2<f64>) -> Array1<f64> {
    grid.t().iter().copied().collect()
}

/// Reshapes a column-major vector into a `height × width` grid.
pub fn unflatten(vector: &Array1<f64>, height: usize, width: usize) -> Result<Array2<f64>> {
    if vector.len() != height * width {
        return Err(CompressionError::ShapeMismatch {
            expected: vec![height * width],
            got: vec![vector.len()],
        });
    }
    Array2::from_shape_vec((height, width).f(), vector.to_vec()).map_err(|_| {
        CompressionError::ShapeMismatch {
            expected: vec![height, width],
            got: vec![vector.len()],
        }
    })
}

/// Reads one rectangle of `image` into a normalized `Block`.
pub fn extract(image: &RgbImage, rect: &Rect) -> Result<Block> {
    if rect.end.x > image.width() || rect.end.y > image.height() {
        return Err(CompressionError::ShapeMismatch {
            expected: vec![image.height() as usize, image.width() as usize],
            got: vec![rect.end.y as usize, rect.end.x as usize],
        });
    }

    let shape = (rect.height() as usize, rect.width() as usize);
    let mut red = Array2::<f64>::zeros(shape);
    let mut green = Array2::<f64>::zeros(shape);
    let mut blue = Array2::<f64>::zeros(shape);

    for (row, col, x, y) in rect.pixels() {
        let pixel = image.get_pixel(x, y);
        red[[row, col]] = normalize(pixel[0]);
        green[[row, col]] = normalize(pixel[1]);
        blue[[row, col]] = normalize(pixel[2]);
    }

    Ok(Block::from_grids(&red, &green, &blue))
}

/// Extracts every block of `geometry`, in geometry order.
pub fn extract_all(image: &RgbImage, geometry: &BlockGeometry) -> Result<Vec<Block>> {
    geometry.iter().map(|rect| extract(image, rect)).collect()
}

/// Reshapes a channel vector to a `height × width` grid of channel bytes.
pub fn inverse(vector: &Array1<f64>, height: usize, width: usize) -> Result<Array2<u8>> {
    Ok(unflatten(vector, height, width)?.mapv(denormalize))
}
