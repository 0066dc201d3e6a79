use std::convert::Infallible;
use std::error::Error;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::domain::colorize::colorize;
use crate::domain::error::RenderError;
use crate::domain::evaluator::{self, CancelToken, EvalOptions};
use crate::domain::heatmap::{self, RampSource};
use crate::domain::normalize::{normalize, Normalization};
use crate::domain::progress::{ProgressObserver, DEFAULT_POLL_INTERVAL};
use crate::model::GridSize;
use crate::utils::render::write_png_atomic;

#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub width: usize,
    pub height: usize,
    pub heatmap: RampSource,
    pub gamma: f64,
    pub output: PathBuf,
    pub workers: Option<usize>,
    pub poll_interval: Duration,
    pub cancel: Option<CancelToken>,
}

impl RenderOptions {
    pub fn new(width: usize, height: usize, heatmap: RampSource, output: impl Into<PathBuf>) -> Self {
        Self {
            width,
            height,
            heatmap,
            gamma: 1.0,
            output: output.into(),
            workers: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
            cancel: None,
        }
    }

    fn eval_options(&self) -> EvalOptions {
        EvalOptions {
            workers: self.workers,
            poll_interval: self.poll_interval,
            cancel: self.cancel.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RenderSummary {
    pub width: usize,
    pub height: usize,
    pub workers: usize,
    pub normalization: Normalization,
    pub output: PathBuf,
    pub elapsed_ms: u64,
}

pub fn render<F>(
    options: &RenderOptions,
    field: F,
    observer: &mut dyn ProgressObserver,
) -> Result<RenderSummary, RenderError>
where
    F: Fn(usize, usize) -> f64 + Sync,
{
    try_render(options, |x, y| Ok::<f64, Infallible>(field(x, y)), observer)
}

/// Heatmap load, evaluation, normalization, color mapping, PNG write.
/// Nothing is written unless every stage succeeds.
pub fn try_render<F, E>(
    options: &RenderOptions,
    field: F,
    observer: &mut dyn ProgressObserver,
) -> Result<RenderSummary, RenderError>
where
    F: Fn(usize, usize) -> Result<f64, E> + Sync,
    E: Error + Send + Sync + 'static,
{
    let start = Instant::now();
    let grid = GridSize::new(options.width, options.height)?;
    let eval_options = options.eval_options();
    let workers = eval_options.worker_count()?;

    let ramp = heatmap::load(&options.heatmap, options.gamma)?;
    log::info!(
        "rendering {}x{} field with {} ({} colors, gamma {})",
        grid.width,
        grid.height,
        options.heatmap,
        ramp.len(),
        options.gamma
    );

    let mut buffer = evaluator::try_evaluate(grid, field, &eval_options, observer)?;
    log::debug!("evaluation finished in {} ms", start.elapsed().as_millis());

    let normalization = normalize(&mut buffer);
    if normalization.is_degenerate() {
        log::info!("field is constant; image uses the first heatmap color");
    }

    let img = colorize(&buffer, &normalization, &ramp);
    write_png_atomic(&img, &options.output)?;

    let elapsed_ms = start.elapsed().as_millis() as u64;
    log::info!("wrote {:?} in {} ms", options.output, elapsed_ms);

    Ok(RenderSummary {
        width: grid.width,
        height: grid.height,
        workers,
        normalization,
        output: options.output.clone(),
        elapsed_ms,
    })
}
