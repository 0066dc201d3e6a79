use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};

use crate::model::GridSize;

/// World-space rectangle covered by the pixel grid. World `y` grows upward,
/// pixel `y` grows downward.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            x_min: -1.0,
            x_max: 1.0,
            y_min: -1.0,
            y_max: 1.0,
        }
    }
}

impl Viewport {
    /// World coordinates of the centre of pixel `(x, y)`.
    pub fn to_world(&self, grid: GridSize, x: usize, y: usize) -> (f64, f64) {
        let fx = (x as f64 + 0.5) / grid.width as f64;
        let fy = (y as f64 + 0.5) / grid.height as f64;
        (
            self.x_min + fx * (self.x_max - self.x_min),
            self.y_max - fy * (self.y_max - self.y_min),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Charge {
    pub x: f64,
    pub y: f64,
    pub q: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quantity {
    #[default]
    Potential,
    FieldMagnitude,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldPreset {
    /// Electrostatic quantity of point charges in Gaussian units.
    PointCharges {
        charges: Vec<Charge>,
        #[serde(default)]
        quantity: Quantity,
    },
    /// `cos(2*pi*r / wavelength)` around the origin.
    Ripple { wavelength: f64 },
}

impl FieldPreset {
    pub fn sample(&self, wx: f64, wy: f64) -> f64 {
        match self {
            FieldPreset::PointCharges { charges, quantity } => match quantity {
                Quantity::Potential => charges
                    .iter()
                    .map(|c| {
                        let r = (wx - c.x).hypot(wy - c.y);
                        if r == 0.0 {
                            f64::INFINITY.copysign(c.q)
                        } else {
                            c.q / r
                        }
                    })
                    .sum(),
                Quantity::FieldMagnitude => {
                    let mut ex = 0.0;
                    let mut ey = 0.0;
                    for c in charges {
                        let dx = wx - c.x;
                        let dy = wy - c.y;
                        let r = dx.hypot(dy);
                        if r == 0.0 {
                            return f64::INFINITY;
                        }
                        let k = c.q / (r * r * r);
                        ex += k * dx;
                        ey += k * dy;
                    }
                    ex.hypot(ey)
                }
            },
            FieldPreset::Ripple { wavelength } => {
                let r = wx.hypot(wy);
                (TAU * r / wavelength).cos()
            }
        }
    }

    pub fn sampler(
        &self,
        grid: GridSize,
        viewport: Viewport,
    ) -> impl Fn(usize, usize) -> f64 + Sync + '_ {
        move |x, y| {
            let (wx, wy) = viewport.to_world(grid, x, y);
            self.sample(wx, wy)
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        match self {
            FieldPreset::PointCharges { charges, .. } if charges.is_empty() => {
                Err("point_charges needs at least one charge".into())
            }
            FieldPreset::Ripple { wavelength } if !(wavelength.is_finite() && *wavelength > 0.0) => {
                Err(format!("ripple wavelength must be positive, got {}", wavelength))
            }
            _ => Ok(()),
        }
    }
}
