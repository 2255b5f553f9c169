use core::fmt;

/// Row/column extent of a matrix-valued expression.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Shape {
    pub rows: usize,
    pub cols: usize,
}

impl Shape {
    pub const fn new(rows: usize, cols: usize) -> Self {
        Self { rows, cols }
    }

    pub const fn scalar() -> Self {
        Self::new(1, 1)
    }

    pub const fn numel(self) -> usize {
        self.rows * self.cols
    }

    /// Element count, or `None` if it does not fit in `usize`.
    pub const fn checked_numel(self) -> Option<usize> {
        self.rows.checked_mul(self.cols)
    }

    pub const fn transposed(self) -> Self {
        Self::new(self.cols, self.rows)
    }

    pub const fn is_scalar(self) -> bool {
        self.rows == 1 && self.cols == 1
    }

    pub const fn is_empty(self) -> bool {
        self.numel() == 0
    }

    /// `(rows, cols)`, the form `ndarray` uses for two-dimensional shapes.
    pub const fn dim(self) -> (usize, usize) {
        (self.rows, self.cols)
    }
}

impl From<(usize, usize)> for Shape {
    fn from((rows, cols): (usize, usize)) -> Self {
        Self::new(rows, cols)
    }
}

impl From<Shape> for (usize, usize) {
    fn from(shape: Shape) -> Self {
        shape.dim()
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.rows, self.cols)
    }
}
