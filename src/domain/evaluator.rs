use std::convert::Infallible;
use std::error::Error;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread;
use std::time::Duration;

use ndarray::Array2;

use crate::domain::error::RenderError;
use crate::domain::progress::{self, ProgressCounter, ProgressObserver, DEFAULT_POLL_INTERVAL};
use crate::model::{GridSize, ValueBuffer};

#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

#[derive(Debug, Clone)]
pub struct EvalOptions {
    /// `None` uses the detected parallelism.
    pub workers: Option<usize>,
    pub poll_interval: Duration,
    pub cancel: Option<CancelToken>,
}

impl Default for EvalOptions {
    fn default() -> Self {
        Self {
            workers: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
            cancel: None,
        }
    }
}

impl EvalOptions {
    pub fn with_workers(workers: usize) -> Self {
        Self {
            workers: Some(workers),
            ..Default::default()
        }
    }

    pub fn worker_count(&self) -> Result<usize, RenderError> {
        match self.workers {
            Some(0) => Err(RenderError::NoWorkers),
            Some(n) => Ok(n),
            None => Ok(default_workers()),
        }
    }
}

pub fn default_workers() -> usize {
    thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Columns owned by `worker`: every `x` with `x % workers == worker`.
pub fn stripe_columns(width: usize, workers: usize, worker: usize) -> impl Iterator<Item = usize> {
    (worker..width).step_by(workers.max(1))
}

enum Failure {
    Field {
        x: usize,
        y: usize,
        source: Box<dyn Error + Send + Sync>,
    },
    Cancelled,
}

impl From<Failure> for RenderError {
    fn from(f: Failure) -> Self {
        match f {
            Failure::Field { x, y, source } => RenderError::Field { x, y, source },
            Failure::Cancelled => RenderError::Cancelled,
        }
    }
}

struct StripeJob<'a, F> {
    grid: GridSize,
    field: &'a F,
    cells: &'a [AtomicU64],
    counter: &'a ProgressCounter,
    failure: &'a OnceLock<Failure>,
    cancel: Option<&'a CancelToken>,
}

impl<F, E> StripeJob<'_, F>
where
    F: Fn(usize, usize) -> Result<f64, E> + Sync,
    E: Error + Send + Sync + 'static,
{
    fn run(&self, worker: usize, workers: usize) {
        for x in stripe_columns(self.grid.width, workers, worker) {
            for y in 0..self.grid.height {
                if self.counter.is_halted() {
                    return;
                }
                if self.cancel.is_some_and(|c| c.is_cancelled()) {
                    self.fail(Failure::Cancelled);
                    return;
                }
                match (self.field)(x, y) {
                    Ok(v) => {
                        self.cells[self.grid.index(x, y)].store(v.to_bits(), Ordering::Relaxed);
                        self.counter.record_cell();
                    }
                    Err(e) => {
                        self.fail(Failure::Field {
                            x,
                            y,
                            source: Box::new(e),
                        });
                        return;
                    }
                }
            }
        }
    }

    fn fail(&self, failure: Failure) {
        // first failure wins; later ones are dropped
        let _ = self.failure.set(failure);
        self.counter.halt();
    }
}

struct HaltOnDrop<'a>(&'a ProgressCounter);

impl Drop for HaltOnDrop<'_> {
    fn drop(&mut self) {
        self.0.halt();
    }
}

pub fn evaluate<F>(
    grid: GridSize,
    field: F,
    options: &EvalOptions,
    observer: &mut dyn ProgressObserver,
) -> Result<ValueBuffer, RenderError>
where
    F: Fn(usize, usize) -> f64 + Sync,
{
    try_evaluate(grid, |x, y| Ok::<f64, Infallible>(field(x, y)), options, observer)
}

/// Evaluates `field` over every cell of `grid` on a fixed pool of workers,
/// column stripes assigned round-robin. The reporter runs on its own thread
/// and is joined before this returns.
pub fn try_evaluate<F, E>(
    grid: GridSize,
    field: F,
    options: &EvalOptions,
    observer: &mut dyn ProgressObserver,
) -> Result<ValueBuffer, RenderError>
where
    F: Fn(usize, usize) -> Result<f64, E> + Sync,
    E: Error + Send + Sync + 'static,
{
    let workers = options.worker_count()?;
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("field-worker-{}", i))
        .build()?;

    log::debug!(
        "evaluating {}x{} grid on {} workers",
        grid.width,
        grid.height,
        workers
    );

    let cells: Vec<AtomicU64> = (0..grid.cell_count()).map(|_| AtomicU64::new(0)).collect();
    let counter = ProgressCounter::new(grid.cell_count());
    let failure = OnceLock::new();

    let job = StripeJob {
        grid,
        field: &field,
        cells: &cells,
        counter: &counter,
        failure: &failure,
        cancel: options.cancel.as_ref(),
    };

    let interval = options.poll_interval;
    thread::scope(|scope| {
        let counter = &counter;
        scope.spawn(move || progress::report(counter, observer, interval));

        let _halt = HaltOnDrop(counter);
        pool.broadcast(|ctx| job.run(ctx.index(), ctx.num_threads()));
    });

    if let Some(f) = failure.into_inner() {
        return Err(f.into());
    }

    let values: Vec<f64> = cells
        .into_iter()
        .map(|c| f64::from_bits(c.into_inner()))
        .collect();
    let buffer = Array2::from_shape_vec(grid.shape(), values)
        .expect("cell count matches grid shape");
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::atomic::AtomicUsize;

    use crate::domain::progress::SilentProgress;

    #[derive(Debug, thiserror::Error)]
    #[error("bad sample at column {0}")]
    struct BadSample(usize);

    fn fast_options(workers: usize) -> EvalOptions {
        EvalOptions {
            workers: Some(workers),
            poll_interval: Duration::from_millis(1),
            cancel: None,
        }
    }

    #[test]
    fn test_stripe_partition_covers_each_column_once() {
        for width in [1usize, 2, 7, 64, 101] {
            for workers in [1usize, 2, 3, 8, 200] {
                let mut seen = HashSet::new();
                for w in 0..workers {
                    for x in stripe_columns(width, workers, w) {
                        assert_eq!(x % workers, w);
                        assert!(seen.insert(x), "column {} assigned twice", x);
                    }
                }
                assert_eq!(seen.len(), width);
            }
        }
    }

    #[test]
    fn test_every_cell_matches_field() {
        let grid = GridSize::new(37, 23).unwrap();
        for workers in [1usize, 3, 8] {
            let buffer = evaluate(
                grid,
                |x, y| (x * 1000 + y) as f64,
                &fast_options(workers),
                &mut SilentProgress,
            )
            .unwrap();
            assert_eq!(buffer.len(), grid.cell_count());
            let flat = buffer.as_slice().unwrap();
            for y in 0..grid.height {
                for x in 0..grid.width {
                    assert_eq!(flat[grid.index(x, y)], (x * 1000 + y) as f64);
                    assert_eq!(buffer[[y, x]], (x * 1000 + y) as f64);
                }
            }
        }
    }

    #[test]
    fn test_each_cell_evaluated_once() {
        let grid = GridSize::new(19, 11).unwrap();
        let calls: Vec<AtomicUsize> = (0..grid.cell_count()).map(|_| AtomicUsize::new(0)).collect();
        evaluate(
            grid,
            |x, y| {
                calls[grid.index(x, y)].fetch_add(1, Ordering::Relaxed);
                0.0
            },
            &fast_options(4),
            &mut SilentProgress,
        )
        .unwrap();
        assert!(calls.iter().all(|c| c.load(Ordering::Relaxed) == 1));
    }

    #[test]
    fn test_more_workers_than_columns() {
        let grid = GridSize::new(2, 5).unwrap();
        let buffer = evaluate(grid, |x, _| x as f64, &fast_options(16), &mut SilentProgress).unwrap();
        assert_eq!(buffer.column(0).iter().sum::<f64>(), 0.0);
        assert_eq!(buffer.column(1).iter().sum::<f64>(), 5.0);
    }

    #[test]
    fn test_zero_workers_rejected() {
        let grid = GridSize::new(2, 2).unwrap();
        let err = evaluate(grid, |_, _| 0.0, &fast_options(0), &mut SilentProgress).unwrap_err();
        assert!(matches!(err, RenderError::NoWorkers));
    }

    #[test]
    fn test_default_worker_count_positive() {
        assert!(EvalOptions::default().worker_count().unwrap() >= 1);
    }

    #[test]
    fn test_field_error_stops_all_workers() {
        let grid = GridSize::new(64, 64).unwrap();
        let calls = AtomicUsize::new(0);
        let err = try_evaluate(
            grid,
            |x, _| {
                calls.fetch_add(1, Ordering::Relaxed);
                if x == 0 {
                    Err(BadSample(x))
                } else {
                    thread::sleep(Duration::from_micros(20));
                    Ok(1.0)
                }
            },
            &fast_options(4),
            &mut SilentProgress,
        )
        .unwrap_err();

        match err {
            RenderError::Field { x, y, source } => {
                assert_eq!((x, y), (0, 0));
                assert_eq!(source.to_string(), "bad sample at column 0");
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(calls.load(Ordering::Relaxed) < grid.cell_count());
    }

    #[test]
    fn test_single_worker_first_error_wins() {
        let grid = GridSize::new(4, 1).unwrap();
        let err = try_evaluate(
            grid,
            |x, _| if x >= 2 { Err(BadSample(x)) } else { Ok(0.0) },
            &fast_options(1),
            &mut SilentProgress,
        )
        .unwrap_err();
        assert!(matches!(err, RenderError::Field { x: 2, y: 0, .. }));
    }

    #[test]
    fn test_cancelled_before_start() {
        let grid = GridSize::new(8, 8).unwrap();
        let token = CancelToken::new();
        token.cancel();
        let options = EvalOptions {
            cancel: Some(token),
            ..fast_options(2)
        };
        let err = evaluate(grid, |_, _| 1.0, &options, &mut SilentProgress).unwrap_err();
        assert!(matches!(err, RenderError::Cancelled));
    }

    #[test]
    fn test_cancel_mid_render() {
        let grid = GridSize::new(32, 32).unwrap();
        let token = CancelToken::new();
        let options = EvalOptions {
            cancel: Some(token.clone()),
            ..fast_options(2)
        };
        let calls = AtomicUsize::new(0);
        let err = evaluate(
            grid,
            |_, _| {
                if calls.fetch_add(1, Ordering::Relaxed) == 10 {
                    token.cancel();
                }
                1.0
            },
            &options,
            &mut SilentProgress,
        )
        .unwrap_err();
        assert!(matches!(err, RenderError::Cancelled));
        assert!(calls.load(Ordering::Relaxed) < grid.cell_count());
    }
}
