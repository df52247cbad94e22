// THEORY:
// `BlockGeometry` slices an image into the grid of fixed-size blocks the
// autoencoder trains on. It is the codec's equivalent of a grid manager: it owns
// the master list of block rectangles, and every later stage (vectorization,
// training, reconstruction) walks that list in the same order.
//
// Key principles:
// 1.  **Uniform blocks**: every rectangle is exactly `block_height × block_width`.
//     When the image size is not a multiple of the block size, the trailing row
//     and column of blocks are shifted back so they end on the image border.
//     Those blocks overlap their neighbours instead of being clipped.
// 2.  **Stable order**: rectangles are produced row-major (outer loop over
//     vertical steps, inner loop over horizontal steps). Reconstruction writes
//     blocks back in this order, so in overlapping areas the later block wins.
// 3.  **Explicit value**: the geometry is returned to the caller and threaded
//     into reconstruction. Nothing about it is stored globally.

use crate::core_modules::rect::{Point, Rect};
use crate::error::{CompressionError, Result};

/// The ordered list of block rectangles covering an image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockGeometry {
    image_width: u32,
    image_height: u32,
    block_width: u32,
    block_height: u32,
    rects: Vec<Rect>,
}

impl BlockGeometry {
    /// Computes the block rectangles for a `image_width × image_height` image.
    ///
    /// Fails with `InvalidConfiguration` when a dimension is zero or a block is
    /// larger than the image.
    pub fn new(
        image_width: u32,
        image_height: u32,
        block_height: u32,
        block_width: u32,
    ) -> Result<Self> {
        if block_height == 0 || block_width == 0 {
            return Err(CompressionError::InvalidConfiguration(format!(
                "block dimensions must be positive, got {block_height}x{block_width}"
            )));
        }
        if image_width == 0 || image_height == 0 {
            return Err(CompressionError::InvalidConfiguration(format!(
                "image dimensions must be positive, got {image_width}x{image_height}"
            )));
        }
        if block_height > image_height || block_width > image_width {
            return Err(CompressionError::InvalidConfiguration(format!(
                "block {block_height}x{block_width} (height x width) does not fit in image \
                 {image_height}x{image_width}"
            )));
        }

        let width_steps = image_width.div_ceil(block_width);
        let height_steps = image_height.div_ceil(block_height);
        let mut rects = Vec::with_capacity((width_steps * height_steps) as usize);

        for j in 0..height_steps {
            let (top, bottom) = Self::span(j, block_height, image_height);
            for i in 0..width_steps {
                let (left, right) = Self::span(i, block_width, image_width);
                rects.push(Rect::new(Point::new(left, top), Point::new(right, bottom)));
            }
        }

        Ok(Self {
            image_width,
            image_height,
            block_width,
            block_height,
            rects,
        })
    }

    /// The `[begin, end)` span of step `index` along one axis, shifted back to
    /// end at `limit` when it would overflow.
    fn span(index: u32, size: u32, limit: u32) -> (u32, u32) {
        let end = (index + 1) * size;
        if end <= limit {
            (index * size, end)
        } else {
            (limit - size, limit)
        }
    }

    pub fn rects(&self) -> &[Rect] {
        &self.rects
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Rect> {
        self.rects.iter()
    }

    pub fn len(&self) -> usize {
        self.rects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    pub fn image_width(&self) -> u32 {
        self.image_width
    }

    pub fn image_height(&self) -> u32 {
        self.image_height
    }

    pub fn block_width(&self) -> u32 {
        self.block_width
    }

    pub fn block_height(&self) -> u32 {
        self.block_height
    }

    /// Number of values in one channel vector of a block.
    pub fn block_len(&self) -> usize {
        (self.block_width * self.block_height) as usize
    }
}

impl<'a> IntoIterator for &'a BlockGeometry {
    type Item = &'a Rect;
    type IntoIter = std::slice::Iter<'a, Rect>;

    fn into_iter(self) -> Self::IntoIter {
        self.rects.iter()
    }
}
