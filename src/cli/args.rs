//! Command-line argument definitions using clap

use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// Default Teams Manager backend host
pub const DEFAULT_HOST: &str = "teamsmanagerprod.azurefd.net";

/// valo2tm - Migrate Valo teams into Teams Manager managed teams
#[derive(Parser, Debug)]
#[command(name = "valo2tm")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Exported Valo team list (JSON).
    /// If not provided, will be selected interactively.
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Teams Manager backend host
    #[arg(long, default_value = DEFAULT_HOST)]
    pub host: String,

    /// File holding the access token
    #[arg(long, default_value = "auth.json")]
    pub auth_file: PathBuf,

    /// Display name of the template to migrate into.
    /// If not provided, will be selected interactively.
    #[arg(short, long)]
    pub template: Option<String>,

    /// Where to write the field mapping log
    #[arg(long, default_value = "fields.json")]
    pub mapping_log: PathBuf,

    /// Skip selection and mapping; migrate every team that already fully matches.
    /// Requires --template.
    #[arg(long, default_value = "false", requires = "template")]
    pub no_confirm: bool,

    /// Log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn input(&self) -> Option<&PathBuf> {
        self.input.as_ref()
    }
}
