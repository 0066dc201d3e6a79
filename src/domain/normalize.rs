use rayon::prelude::*;

use crate::model::ValueBuffer;

/// Spreads narrower than this are treated as a constant field.
pub const NORMALIZE_EPSILON: f64 = 1e-8;

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Normalization {
    /// Values were rewritten to `(v - min) / (max - min)`.
    Rescaled { min: f64, max: f64 },
    /// Spread below [`NORMALIZE_EPSILON`]; values untouched.
    Degenerate { min: f64, max: f64 },
}

impl Normalization {
    pub fn is_degenerate(&self) -> bool {
        matches!(self, Normalization::Degenerate { .. })
    }

    pub fn range(&self) -> (f64, f64) {
        match *self {
            Normalization::Rescaled { min, max } | Normalization::Degenerate { min, max } => {
                (min, max)
            }
        }
    }
}

/// Min and max over the finite values, `None` if there are none.
pub fn value_range(values: &[f64]) -> Option<(f64, f64)> {
    let (min, max) = values
        .par_iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(
            || (f64::INFINITY, f64::NEG_INFINITY),
            |(lo, hi), v| (lo.min(v), hi.max(v)),
        )
        .reduce(
            || (f64::INFINITY, f64::NEG_INFINITY),
            |a, b| (a.0.min(b.0), a.1.max(b.1)),
        );
    if min > max {
        None
    } else {
        Some((min, max))
    }
}

pub fn normalize(buffer: &mut ValueBuffer) -> Normalization {
    let slice = buffer
        .as_slice_mut()
        .expect("ValueBuffer must be contiguous");

    let Some((min, max)) = value_range(slice) else {
        log::warn!("field produced no finite values");
        return Normalization::Degenerate { min: 0.0, max: 0.0 };
    };

    let spread = max - min;
    if spread < NORMALIZE_EPSILON {
        log::debug!("degenerate field range [{}, {}]", min, max);
        return Normalization::Degenerate { min, max };
    }

    slice.par_iter_mut().for_each(|v| *v = (*v - min) / spread);
    Normalization::Rescaled { min, max }
}
