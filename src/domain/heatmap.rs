use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use image::{ImageReader, Rgba};

use crate::domain::error::RampError;
use crate::model::ColorRamp;

const BUILTIN_PREFIX: &str = "builtin:";
const BUILTIN_STEPS: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinRamp {
    Gray,
    Hot,
    BlackWhite,
}

impl BuiltinRamp {
    fn colors(self) -> Vec<Rgba<u8>> {
        match self {
            BuiltinRamp::BlackWhite => vec![Rgba([0, 0, 0, 255]), Rgba([255, 255, 255, 255])],
            BuiltinRamp::Gray => (0..BUILTIN_STEPS)
                .map(|i| {
                    let v = i as u8;
                    Rgba([v, v, v, 255])
                })
                .collect(),
            BuiltinRamp::Hot => (0..BUILTIN_STEPS)
                .map(|i| {
                    // black -> red -> yellow -> white in equal thirds
                    let t = i as f64 / (BUILTIN_STEPS - 1) as f64 * 3.0;
                    let channel = |offset: f64| ((t - offset).clamp(0.0, 1.0) * 255.0).round() as u8;
                    Rgba([channel(0.0), channel(1.0), channel(2.0), 255])
                })
                .collect(),
        }
    }
}

impl fmt::Display for BuiltinRamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BuiltinRamp::Gray => "gray",
            BuiltinRamp::Hot => "hot",
            BuiltinRamp::BlackWhite => "bw",
        };
        write!(f, "{}{}", BUILTIN_PREFIX, name)
    }
}

/// Where a color ramp comes from: `builtin:<name>` or a gradient image path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RampSource {
    File(PathBuf),
    Builtin(BuiltinRamp),
}

impl FromStr for RampSource {
    type Err = RampError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.strip_prefix(BUILTIN_PREFIX) {
            Some(name) => match name.to_ascii_lowercase().as_str() {
                "gray" | "grey" => Ok(RampSource::Builtin(BuiltinRamp::Gray)),
                "hot" => Ok(RampSource::Builtin(BuiltinRamp::Hot)),
                "bw" => Ok(RampSource::Builtin(BuiltinRamp::BlackWhite)),
                _ => Err(RampError::UnknownBuiltin(name.to_string())),
            },
            None => Ok(RampSource::File(PathBuf::from(s))),
        }
    }
}

impl fmt::Display for RampSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RampSource::File(p) => write!(f, "{}", p.display()),
            RampSource::Builtin(b) => write!(f, "{}", b),
        }
    }
}

pub fn validate_gamma(gamma: f64) -> Result<(), RampError> {
    if gamma.is_finite() && gamma > 0.0 {
        Ok(())
    } else {
        Err(RampError::InvalidGamma(gamma))
    }
}

/// Loads the ramp and redistributes its entries by `gamma`; entry `i` of `n`
/// takes the source color at `round((i / (n-1))^gamma * (n-1))`.
pub fn load(source: &RampSource, gamma: f64) -> Result<ColorRamp, RampError> {
    validate_gamma(gamma)?;
    let colors = match source {
        RampSource::File(path) => read_ramp_image(path)?,
        RampSource::Builtin(b) => b.colors(),
    };
    log::debug!("loaded {} ramp colors from {}", colors.len(), source);
    ColorRamp::new(apply_gamma(colors, gamma))
}

fn read_ramp_image(path: &Path) -> Result<Vec<Rgba<u8>>, RampError> {
    let reader = ImageReader::open(path)
        .and_then(|r| r.with_guessed_format())
        .map_err(|source| RampError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    let img = reader
        .decode()
        .map_err(|source| RampError::Decode {
            path: path.to_path_buf(),
            source,
        })?
        .to_rgba8();

    let (w, h) = img.dimensions();
    let colors = if w >= h {
        (0..w).map(|x| *img.get_pixel(x, 0)).collect()
    } else {
        (0..h).map(|y| *img.get_pixel(0, y)).collect()
    };
    Ok(colors)
}

fn apply_gamma(colors: Vec<Rgba<u8>>, gamma: f64) -> Vec<Rgba<u8>> {
    let n = colors.len();
    if n < 2 || gamma == 1.0 {
        return colors;
    }
    let last = (n - 1) as f64;
    (0..n)
        .map(|i| {
            let t = i as f64 / last;
            let src = (t.powf(gamma) * last).round() as usize;
            colors[src.min(n - 1)]
        })
        .collect()
}
