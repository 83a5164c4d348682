//! Report module - overview, mapping log and migration summary

pub mod mapping_log;
pub mod overview;
pub mod summary;

pub use mapping_log::*;
pub use overview::*;
pub use summary::*;
