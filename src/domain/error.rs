use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RampError {
    #[error("failed to read heatmap {path:?}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode heatmap {path:?}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("heatmap contains no colors")]
    Empty,
    #[error("invalid gamma {0}: must be finite and greater than zero")]
    InvalidGamma(f64),
    #[error("unknown builtin heatmap '{0}'")]
    UnknownBuiltin(String),
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("invalid grid {width}x{height}: both dimensions must be positive")]
    InvalidDimensions { width: usize, height: usize },
    #[error("worker count must be at least 1")]
    NoWorkers,
    #[error("failed to load heatmap")]
    Ramp(#[from] RampError),
    #[error("failed to build worker pool")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
    #[error("field evaluation failed at ({x}, {y})")]
    Field {
        x: usize,
        y: usize,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("rendering cancelled")]
    Cancelled,
    #[error("failed to write output file {path:?}")]
    OutputPath {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode PNG for {path:?}")]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}
