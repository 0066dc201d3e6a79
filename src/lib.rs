pub mod commands;
pub mod domain;
pub mod model;
pub mod utils;

pub use crate::domain::error::{RampError, RenderError};
pub use crate::domain::evaluator::{evaluate, try_evaluate, CancelToken, EvalOptions};
pub use crate::domain::heatmap::{BuiltinRamp, RampSource};
pub use crate::domain::normalize::{normalize, Normalization, NORMALIZE_EPSILON};
pub use crate::domain::pipeline::{render, try_render, RenderOptions, RenderSummary};
pub use crate::domain::progress::{ConsoleProgress, ProgressObserver, SilentProgress};
pub use crate::model::{ColorRamp, GridSize, ValueBuffer};
