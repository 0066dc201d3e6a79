use ndarray::Array2;

use crate::domain::error::RenderError;

/// Row-major scalar samples, shape `(height, width)`.
pub type ValueBuffer = Array2<f64>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridSize {
    pub width: usize,
    pub height: usize,
}

impl GridSize {
    pub fn new(width: usize, height: usize) -> Result<Self, RenderError> {
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidDimensions { width, height });
        }
        Ok(Self { width, height })
    }

    pub fn cell_count(&self) -> usize {
        self.width * self.height
    }

    #[inline(always)]
    pub fn index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }
}
