use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(25);

const ERASE_WIDTH: usize = 80;

pub trait ProgressObserver: Send {
    fn on_progress(&mut self, percent: f64);

    fn on_complete(&mut self);

    /// Evaluation stopped before every cell was computed.
    fn on_halt(&mut self) {}
}

impl<T: ProgressObserver + ?Sized> ProgressObserver for &mut T {
    fn on_progress(&mut self, percent: f64) {
        (**self).on_progress(percent)
    }

    fn on_complete(&mut self) {
        (**self).on_complete()
    }

    fn on_halt(&mut self) {
        (**self).on_halt()
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SilentProgress;

impl ProgressObserver for SilentProgress {
    fn on_progress(&mut self, _percent: f64) {}

    fn on_complete(&mut self) {}
}

/// Single-line status that rewrites itself with carriage returns.
pub struct ConsoleProgress<W: Write + Send> {
    out: W,
    erase: String,
}

impl ConsoleProgress<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> ConsoleProgress<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            erase: " ".repeat(ERASE_WIDTH),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, text: &str) {
        let result = write!(self.out, "\r{}\r{}", self.erase, text).and_then(|_| self.out.flush());
        if let Err(e) = result {
            log::debug!("progress output failed: {}", e);
        }
    }
}

impl<W: Write + Send> ProgressObserver for ConsoleProgress<W> {
    fn on_progress(&mut self, percent: f64) {
        self.emit(&format!("rendering... {:.2}% done", percent));
    }

    fn on_complete(&mut self) {
        self.emit("rendering complete\n");
    }

    fn on_halt(&mut self) {
        self.emit("rendering halted\n");
    }
}

/// Emits a percentage only when it reaches the next whole-percent mark.
#[derive(Debug, Clone)]
pub struct ThresholdTracker {
    next_mark: f64,
}

impl Default for ThresholdTracker {
    fn default() -> Self {
        Self { next_mark: 1.0 }
    }
}

impl ThresholdTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, done: usize, total: usize) -> Option<f64> {
        if total == 0 {
            return None;
        }
        let percent = done as f64 / total as f64 * 100.0;
        if percent >= self.next_mark {
            self.next_mark = percent.floor() + 1.0;
            Some(percent)
        } else {
            None
        }
    }
}

/// Completion counter shared between the evaluator workers and the reporter.
#[derive(Debug)]
pub struct ProgressCounter {
    done: AtomicUsize,
    total: usize,
    halted: AtomicBool,
}

impl ProgressCounter {
    pub fn new(total: usize) -> Self {
        Self {
            done: AtomicUsize::new(0),
            total,
            halted: AtomicBool::new(false),
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Publishes one finished cell. Call only after the cell value is stored.
    #[inline]
    pub fn record_cell(&self) {
        self.done.fetch_add(1, Ordering::Release);
    }

    #[inline]
    pub fn completed(&self) -> usize {
        self.done.load(Ordering::Acquire)
    }

    pub fn halt(&self) {
        self.halted.store(true, Ordering::Release);
    }

    #[inline]
    pub fn is_halted(&self) -> bool {
        self.halted.load(Ordering::Acquire)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportOutcome {
    Completed,
    Halted,
}

/// Polls `counter` until every cell is done or evaluation halts.
pub fn report(
    counter: &ProgressCounter,
    observer: &mut dyn ProgressObserver,
    interval: Duration,
) -> ReportOutcome {
    let mut tracker = ThresholdTracker::new();
    let total = counter.total();
    loop {
        // halted is read first: once it is visible, so is every increment before it.
        let halted = counter.is_halted();
        let done = counter.completed();
        if done >= total {
            observer.on_complete();
            return ReportOutcome::Completed;
        }
        if halted {
            observer.on_halt();
            return ReportOutcome::Halted;
        }
        if let Some(percent) = tracker.observe(done, total) {
            observer.on_progress(percent);
        }
        thread::sleep(interval);
    }
}
