pub mod error;

pub mod colorize;
pub mod config_manager;
pub mod evaluator;
pub mod fields;
pub mod heatmap;
pub mod normalize;
pub mod pipeline;
pub mod progress;
