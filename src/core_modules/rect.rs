// THEORY:
// `Point` and `Rect` are the "dumb" geometry containers of the codec. A `Rect`
// is a half-open pixel region `[begin.x, end.x) × [begin.y, end.y)`. It knows its
// own size and whether it contains a pixel, and nothing else: deciding where
// rectangles go is the job of `BlockGeometry`.

/// A pixel coordinate. `x` grows to the right, `y` grows downwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Point {
    pub x: u32,
    pub y: u32,
}

impl Point {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

/// A half-open rectangular region of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rect {
    /// Top-left corner, inclusive.
    pub begin: Point,
    /// Bottom-right corner, exclusive.
    pub end: Point,
}

impl Rect {
    pub fn new(begin: Point, end: Point) -> Self {
        debug_assert!(begin.x <= end.x && begin.y <= end.y);
        Self { begin, end }
    }

    pub fn width(&self) -> u32 {
        self.end.x - self.begin.x
    }

    pub fn height(&self) -> u32 {
        self.end.y - self.begin.y
    }

    /// Whether the pixel `(x, y)` lies inside this rectangle.
    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.begin.x && x < self.end.x && y >= self.begin.y && y < self.end.y
    }

    /// Iterates the pixels of the rectangle row by row, yielding
    /// `(local_row, local_col, x, y)`.
    pub fn pixels(&self) -> impl Iterator<Item = (usize, usize, u32, u32)> + '_ {
        (self.begin.y..self.end.y).enumerate().flat_map(move |(row, y)| {
            (self.begin.x..self.end.x)
                .enumerate()
                .map(move |(col, x)| (row, col, x, y))
        })
    }
}
