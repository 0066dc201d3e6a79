pub mod helpers;

pub mod config;
pub mod render;
