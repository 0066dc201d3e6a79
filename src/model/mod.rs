pub mod grid;
pub mod ramp;

pub use grid::{GridSize, ValueBuffer};
pub use ramp::ColorRamp;
