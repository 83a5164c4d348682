//! valo2tm: Valo to Teams Manager migration library
//!
//! Classifies exported Valo teams against a Teams Manager template, lets the
//! user build a field mapping interactively and converts the fully matched
//! teams into managed teams.

pub mod cli;
pub mod pipeline;
pub mod report;
pub mod tm;
pub mod utils;
