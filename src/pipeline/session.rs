//! Mapping session state
//!
//! Holds the user-built links from source metadata fields to target field
//! titles, plus the fields the user decided to create. Every mutation goes
//! through this type so the invariants hold regardless of which editor step
//! triggers it:
//!
//! - at most one link per `(team, source field)`
//! - staged titles are non-empty, at most [`MAX_TITLE_LEN`] characters and
//!   unique across the template, the global field catalog and other staged
//!   fields

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::tm::{CreateField, Field, Template};

use super::classify::{classify_with_links, MigrationLevel};
use super::normalize::normalize;
use super::team::{MetadataField, ValoTeam};

/// Longest title Teams Manager accepts for a field
pub const MAX_TITLE_LEN: usize = 100;

/// A link from a team's source field to a target field title
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkField {
    pub team: String,
    pub from: MetadataField,
    pub to: String,
}

impl LinkField {
    pub fn new(team: impl Into<String>, from: MetadataField, to: impl Into<String>) -> Self {
        Self {
            team: team.into(),
            from,
            to: to.into(),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MappingError {
    #[error("Field name can't be empty")]
    EmptyTitle,

    #[error("Field name can't be longer than {max} characters (got {len})")]
    TitleTooLong { len: usize, max: usize },

    #[error("Field name '{0}' already exists")]
    DuplicateTitle(String),

    #[error("Field '{field}' of team '{team}' is already mapped")]
    AlreadyMapped { team: String, field: String },
}

/// A target field the user may map a source field to
#[derive(Debug, Clone, PartialEq)]
pub enum TargetOption {
    /// Field staged for creation in this session
    Staged(CreateField),
    /// Field defined on the template
    Template(Field),
}

impl TargetOption {
    pub fn title(&self) -> &str {
        match self {
            TargetOption::Staged(f) => &f.title,
            TargetOption::Template(f) => &f.title,
        }
    }
}

/// Mutable mapping state for one migration run
#[derive(Debug, Clone)]
pub struct MappingSession {
    template: Template,
    teams: Vec<ValoTeam>,
    catalog: Vec<Field>,
    links: Vec<LinkField>,
    staged: Vec<CreateField>,
}

impl MappingSession {
    /// Start a session; teams that already fully match are pre-linked by name
    pub fn new(template: Template, teams: Vec<ValoTeam>, catalog: Vec<Field>) -> Self {
        let mut links = Vec::new();
        for team in &teams {
            if classify_with_links(&template.fields, team, &[]).is_full_match() {
                for field in normalize(team.field_values()) {
                    let to = field.field_name.clone();
                    links.push(LinkField::new(team.id.clone(), field, to));
                }
            }
        }
        debug!(
            teams = teams.len(),
            prelinked = links.len(),
            "Mapping session started"
        );

        Self {
            template,
            teams,
            catalog,
            links,
            staged: Vec::new(),
        }
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    pub fn teams(&self) -> &[ValoTeam] {
        &self.teams
    }

    pub fn links(&self) -> &[LinkField] {
        &self.links
    }

    pub fn staged(&self) -> &[CreateField] {
        &self.staged
    }

    pub fn team(&self, id: &str) -> Option<&ValoTeam> {
        self.teams.iter().find(|t| t.id == id)
    }

    /// Current migration level of a team
    pub fn level(&self, team: &ValoTeam) -> MigrationLevel {
        classify_with_links(&self.template.fields, team, &self.links)
    }

    /// All teams with their current migration level
    pub fn levels(&self) -> Vec<(&ValoTeam, MigrationLevel)> {
        self.teams.iter().map(|t| (t, self.level(t))).collect()
    }

    pub fn full_match_teams(&self) -> Vec<&ValoTeam> {
        self.teams
            .iter()
            .filter(|t| self.level(t).is_full_match())
            .collect()
    }

    pub fn links_for<'a>(&'a self, team_id: &'a str) -> impl Iterator<Item = &'a LinkField> + 'a {
        self.links.iter().filter(move |l| l.team == team_id)
    }

    pub fn has_links(&self, team_id: &str) -> bool {
        self.links_for(team_id).next().is_some()
    }

    /// Link of a specific source field of a team
    pub fn link_of(&self, team_id: &str, field: &MetadataField) -> Option<&LinkField> {
        self.links
            .iter()
            .find(|l| l.team == team_id && l.from.same_field(field))
    }

    /// Normalized source fields of a team that have no link yet
    pub fn unmapped_fields(&self, team: &ValoTeam) -> Vec<MetadataField> {
        normalize(team.field_values())
            .into_iter()
            .filter(|field| self.link_of(&team.id, field).is_none())
            .collect()
    }

    /// Target fields a source field can be mapped to
    ///
    /// Staged fields the team doesn't target yet come first, then template
    /// fields of the same type the team doesn't target yet.
    pub fn target_options(&self, team: &ValoTeam, source: &MetadataField) -> Vec<TargetOption> {
        let targeted = |title: &str| self.links_for(&team.id).any(|l| l.to == title);

        let staged = self
            .staged
            .iter()
            .filter(|f| !targeted(&f.title))
            .cloned()
            .map(TargetOption::Staged);

        let template = self
            .template
            .fields
            .iter()
            .filter(|f| f.field_type == source.field_type && !targeted(&f.title))
            .cloned()
            .map(TargetOption::Template);

        staged.chain(template).collect()
    }

    /// Whether a title is used by the template, the catalog or a staged field
    pub fn title_taken(&self, title: &str) -> bool {
        self.template.fields.iter().any(|f| f.title == title)
            || self.catalog.iter().any(|f| f.title == title)
            || self.is_staged(title)
    }

    /// Validate a title for a new field, returning it trimmed
    pub fn validate_title(&self, raw: &str) -> Result<String, MappingError> {
        let title = raw.trim();
        if title.is_empty() {
            return Err(MappingError::EmptyTitle);
        }
        let len = title.chars().count();
        if len > MAX_TITLE_LEN {
            return Err(MappingError::TitleTooLong {
                len,
                max: MAX_TITLE_LEN,
            });
        }
        if self.title_taken(title) {
            return Err(MappingError::DuplicateTitle(title.to_string()));
        }
        Ok(title.to_string())
    }

    /// Link a source field of a team to a target title
    pub fn link(
        &mut self,
        team_id: &str,
        from: MetadataField,
        to: impl Into<String>,
    ) -> Result<(), MappingError> {
        if self.link_of(team_id, &from).is_some() {
            return Err(MappingError::AlreadyMapped {
                team: team_id.to_string(),
                field: from.field_name,
            });
        }
        let to = to.into();
        debug!(team = team_id, from = %from.field_name, to = %to, "Linked field");
        self.links.push(LinkField::new(team_id, from, to));
        Ok(())
    }

    /// Stage a new field named `title` and link the source field to it
    ///
    /// Nothing is changed when validation fails.
    pub fn stage_and_link(
        &mut self,
        team_id: &str,
        from: MetadataField,
        title: &str,
    ) -> Result<String, MappingError> {
        let title = self.validate_title(title)?;
        if self.link_of(team_id, &from).is_some() {
            return Err(MappingError::AlreadyMapped {
                team: team_id.to_string(),
                field: from.field_name,
            });
        }
        self.staged.push(CreateField {
            title: title.clone(),
            field_type: from.field_type,
        });
        self.link(team_id, from, title.clone())?;
        Ok(title)
    }

    /// Commit a batch of proposed links, skipping source fields already linked
    ///
    /// Returns the number of links added.
    pub fn apply_links(&mut self, proposal: Vec<LinkField>) -> usize {
        let mut added = 0;
        for link in proposal {
            if self.link(&link.team, link.from, link.to).is_ok() {
                added += 1;
            }
        }
        added
    }

    /// Remove the link of a source field
    pub fn unlink(&mut self, team_id: &str, from: &MetadataField) -> Option<LinkField> {
        let index = self
            .links
            .iter()
            .position(|l| l.team == team_id && l.from.same_field(from))?;
        Some(self.links.remove(index))
    }

    pub fn is_staged(&self, title: &str) -> bool {
        self.staged.iter().any(|f| f.title == title)
    }

    /// Number of links (across all teams) targeting a title
    pub fn usage_count(&self, title: &str) -> usize {
        self.links.iter().filter(|l| l.to == title).count()
    }

    /// Drop a staged field
    pub fn unstage(&mut self, title: &str) -> Option<CreateField> {
        let index = self.staged.iter().position(|f| f.title == title)?;
        Some(self.staged.remove(index))
    }
}
