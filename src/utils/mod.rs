//! Utility module - terminal styling, progress and logging

pub mod logging;
mod progress;
mod styling;

pub use progress::*;
pub use styling::*;
