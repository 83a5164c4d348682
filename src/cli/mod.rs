//! CLI module - argument parsing, interactive prompts and the metadata editor

mod args;
pub mod editor;
mod prompts;

pub use args::{Cli, DEFAULT_HOST};
pub use editor::{EditorStep, MetadataEditor, StepOutcome};
pub use prompts::*;
