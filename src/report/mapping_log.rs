//! Mapping log export
//!
//! Records the staged fields and every link of a run so the mapping can be
//! audited after the conversion.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;

use crate::pipeline::{LinkField, MappingSession};
use crate::tm::CreateField;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingLog<'a> {
    /// Timestamp of the export (RFC 3339)
    pub generated_at: String,
    pub template_id: &'a str,
    pub template_name: &'a str,
    pub created_fields: &'a [CreateField],
    pub link_fields: &'a [LinkField],
}

impl<'a> MappingLog<'a> {
    pub fn from_session(session: &'a MappingSession) -> Self {
        Self {
            generated_at: Utc::now().to_rfc3339(),
            template_id: &session.template().id,
            template_name: &session.template().display_name,
            created_fields: session.staged(),
            link_fields: session.links(),
        }
    }
}

/// Write the mapping log of a session as pretty JSON
pub fn write_mapping_log(path: &Path, session: &MappingSession) -> Result<()> {
    let log = MappingLog::from_session(session);
    let json = serde_json::to_string_pretty(&log).context("Failed to serialize mapping log")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write mapping log to {}", path.display()))?;
    Ok(())
}
