use image::Rgba;

use crate::domain::error::RampError;

/// Ordered palette indexed by a normalized value. Never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorRamp {
    colors: Vec<Rgba<u8>>,
}

impl ColorRamp {
    pub fn new(colors: Vec<Rgba<u8>>) -> Result<Self, RampError> {
        if colors.is_empty() {
            return Err(RampError::Empty);
        }
        Ok(Self { colors })
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn colors(&self) -> &[Rgba<u8>] {
        &self.colors
    }

    pub fn first(&self) -> Rgba<u8> {
        self.colors[0]
    }

    pub fn color_at(&self, index: usize) -> Rgba<u8> {
        self.colors[index.min(self.colors.len() - 1)]
    }

    /// Lower-bound slot for `p`: `floor(p * (len - 1))`, clamped to the ramp.
    /// Adjacent entries are never blended.
    pub fn index_for(&self, p: f64) -> usize {
        let last = self.colors.len() - 1;
        let scaled = (p * last as f64).floor();
        if scaled.is_nan() {
            return 0;
        }
        scaled.clamp(0.0, last as f64) as usize
    }

    pub fn color_for(&self, p: f64) -> Rgba<u8> {
        self.colors[self.index_for(p)]
    }
}
