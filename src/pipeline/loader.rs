//! Team export loading
//!
//! The export is a JSON array of Valo group records. A single record without
//! a string `id` or `title` rejects the whole file.

use std::collections::HashSet;
use std::path::Path;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

use crate::tm::SlimTeam;

use super::team::ValoTeam;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to read team export {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Team export is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid json file: expected an array of teams")]
    NotAnArray,

    #[error("Invalid json file: record {index} has no string '{key}'")]
    InvalidRecord { index: usize, key: &'static str },
}

/// Load and validate a team export file
pub fn load_teams(path: &Path) -> Result<Vec<ValoTeam>, LoadError> {
    let content = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let teams = parse_teams(&content)?;
    info!(path = %path.display(), teams = teams.len(), "Loaded team export");
    Ok(teams)
}

/// Parse and validate a team export from a string
pub fn parse_teams(content: &str) -> Result<Vec<ValoTeam>, LoadError> {
    let value: Value = serde_json::from_str(content)?;
    let records = value.as_array().ok_or(LoadError::NotAnArray)?;

    for (index, record) in records.iter().enumerate() {
        for key in ["id", "title"] {
            if !record.get(key).is_some_and(Value::is_string) {
                return Err(LoadError::InvalidRecord { index, key });
            }
        }
    }

    Ok(serde_json::from_value(value)?)
}

/// Drop teams that Teams Manager already manages
pub fn filter_unmanaged(teams: Vec<ValoTeam>, managed: &[SlimTeam]) -> Vec<ValoTeam> {
    let managed_ids: HashSet<&str> = managed.iter().map(|t| t.team_id.as_str()).collect();
    let before = teams.len();
    let remaining: Vec<ValoTeam> = teams
        .into_iter()
        .filter(|t| !managed_ids.contains(t.id.as_str()))
        .collect();
    debug!(
        dropped = before - remaining.len(),
        remaining = remaining.len(),
        "Filtered already managed teams"
    );
    remaining
}
