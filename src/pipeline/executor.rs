//! Migration executor
//!
//! Converts every fully matched team into a managed team. Each team runs in
//! its own task; a failure is recorded for that team and never stops the
//! others, except a fatal one (declined reauthentication) which stops every
//! conversion not yet sent. Field-level problems (no target field, unknown
//! person) are logged and the offending value is left out.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use indicatif::ProgressBar;
use tracing::{error, info, warn};

use crate::tm::{Field, FieldType, FieldValuePayload, PersonValue, Template, TmBackend};

use super::classify::classify_with_links;
use super::normalize::normalize;
use super::session::LinkField;
use super::team::{MetadataField, ValoTeam};

/// Outcome of converting one team
#[derive(Debug, Clone, PartialEq)]
pub enum TeamOutcome {
    /// Converted with this many field values
    Migrated { fields: usize },
    Failed(String),
}

/// Per-team record of a migration run
#[derive(Debug, Clone, PartialEq)]
pub struct TeamResult {
    pub team_id: String,
    pub team_title: String,
    pub outcome: TeamOutcome,
    /// Source fields that had no target field
    pub skipped_fields: Vec<String>,
    /// Person values no user was found for
    pub unresolved_people: Vec<String>,
}

impl TeamResult {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, TeamOutcome::Migrated { .. })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MigrationReport {
    pub results: Vec<TeamResult>,
    /// Why the run stopped before every team was sent
    pub aborted: Option<String>,
}

impl MigrationReport {
    pub fn is_aborted(&self) -> bool {
        self.aborted.is_some()
    }

    pub fn succeeded(&self) -> impl Iterator<Item = &TeamResult> {
        self.results.iter().filter(|r| r.is_success())
    }

    pub fn failed(&self) -> impl Iterator<Item = &TeamResult> {
        self.results.iter().filter(|r| !r.is_success())
    }
}

/// Field values of one team, ready to send
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedFields {
    pub values: Vec<FieldValuePayload>,
    pub skipped_fields: Vec<String>,
    pub unresolved_people: Vec<String>,
}

/// Target field id for a source field
///
/// The linked title wins; an unlinked field falls back to a catalog field
/// with its own name.
pub fn resolve_field_id(
    team_id: &str,
    field: &MetadataField,
    links: &[LinkField],
    catalog: &[Field],
) -> Option<i64> {
    let title = links
        .iter()
        .find(|l| l.team == team_id && l.from.same_field(field))
        .map(|l| l.to.as_str())
        .unwrap_or(field.field_name.as_str());
    catalog.iter().find(|f| f.title == title).map(|f| f.id)
}

/// Look up each person value, returning the serialized hits and the misses
pub async fn resolve_people(backend: &dyn TmBackend, values: &[String]) -> (String, Vec<String>) {
    let mut people = Vec::new();
    let mut unresolved = Vec::new();

    for upn in values.iter().filter(|v| !v.trim().is_empty()) {
        match backend.search_users(upn).await {
            Ok(users) => match users.first() {
                Some(user) => people.push(PersonValue::from(user)),
                None => {
                    warn!(user = %upn, "No user found");
                    unresolved.push(upn.clone());
                }
            },
            Err(e) => {
                warn!(user = %upn, error = %e, "User lookup failed");
                unresolved.push(upn.clone());
            }
        }
    }

    let json = serde_json::to_string(&people).unwrap_or_else(|_| "[]".to_string());
    (json, unresolved)
}

/// Resolve every normalized field of a team to a field value
pub async fn resolve_fields(
    backend: &dyn TmBackend,
    team: &ValoTeam,
    links: &[LinkField],
    catalog: &[Field],
) -> ResolvedFields {
    let mut resolved = ResolvedFields::default();

    for field in normalize(team.field_values()) {
        let Some(field_id) = resolve_field_id(&team.id, &field, links, catalog) else {
            warn!(
                team = %team.title,
                field = %field.field_name,
                "Couldn't find fieldId for '{}'",
                field.field_name
            );
            resolved.skipped_fields.push(field.field_name.clone());
            continue;
        };

        let mut value = field.first_value().to_string();
        if field.field_type == FieldType::Person && !value.is_empty() {
            let (people, unresolved) = resolve_people(backend, &field.values).await;
            value = people;
            resolved.unresolved_people.extend(unresolved);
        }

        resolved.values.push(FieldValuePayload { field_id, value });
    }

    resolved
}

/// Convert every fully matched team concurrently
///
/// `catalog` must be fetched after staged fields were created so their ids
/// resolve. `progress` is advanced once per finished team. After a fatal
/// error no further conversion is sent; the teams left over are missing from
/// the report and [`MigrationReport::aborted`] holds the reason.
pub async fn migrate_teams(
    backend: Arc<dyn TmBackend>,
    template: &Template,
    teams: &[ValoTeam],
    links: &[LinkField],
    catalog: Vec<Field>,
    progress: ProgressBar,
) -> MigrationReport {
    let catalog = Arc::new(catalog);

    let eligible: Vec<&ValoTeam> = teams
        .iter()
        .filter(|t| classify_with_links(&template.fields, t, links).is_full_match())
        .collect();

    let aborted = Arc::new(AtomicBool::new(false));
    let mut handles = Vec::with_capacity(eligible.len());
    for team in eligible {
        let team = team.clone();
        let team_links: Vec<LinkField> = links
            .iter()
            .filter(|l| l.team == team.id)
            .cloned()
            .collect();
        let backend = Arc::clone(&backend);
        let catalog = Arc::clone(&catalog);
        let aborted = Arc::clone(&aborted);
        let template_id = template.id.clone();
        let progress = progress.clone();
        let key = (team.id.clone(), team.title.clone());

        let handle = tokio::spawn(async move {
            if aborted.load(Ordering::SeqCst) {
                return None;
            }
            info!(team = %team.title, "Migrating '{}'...", team.title);
            let resolved = resolve_fields(backend.as_ref(), &team, &team_links, &catalog).await;
            if aborted.load(Ordering::SeqCst) {
                return None;
            }

            let mut fatal = false;
            let outcome = match backend
                .convert_team(&template_id, &team.id, &team.title, &resolved.values)
                .await
            {
                Ok(()) => {
                    info!(team = %team.title, "Successfully migrated '{}'", team.title);
                    TeamOutcome::Migrated {
                        fields: resolved.values.len(),
                    }
                }
                Err(e) if e.is_fatal() => {
                    error!(team = %team.title, error = %e, "Stopping the migration");
                    aborted.store(true, Ordering::SeqCst);
                    fatal = true;
                    TeamOutcome::Failed(e.to_string())
                }
                Err(e) => {
                    warn!(team = %team.title, error = %e, "Migration failed");
                    TeamOutcome::Failed(e.to_string())
                }
            };
            progress.inc(1);

            let result = TeamResult {
                team_id: team.id,
                team_title: team.title,
                outcome,
                skipped_fields: resolved.skipped_fields,
                unresolved_people: resolved.unresolved_people,
            };
            Some((result, fatal))
        });
        handles.push((key, handle));
    }

    let mut report = MigrationReport::default();
    for ((team_id, team_title), handle) in handles {
        match handle.await {
            Ok(Some((result, fatal))) => {
                if fatal && report.aborted.is_none() {
                    if let TeamOutcome::Failed(reason) = &result.outcome {
                        report.aborted = Some(reason.clone());
                    }
                }
                report.results.push(result);
            }
            Ok(None) => info!(team = %team_title, "Not sent, migration was stopped"),
            Err(e) => {
                warn!(team = %team_title, error = %e, "Migration task aborted");
                progress.inc(1);
                report.results.push(TeamResult {
                    team_id,
                    team_title,
                    outcome: TeamOutcome::Failed(format!("Migration task aborted: {e}")),
                    skipped_fields: Vec::new(),
                    unresolved_people: Vec::new(),
                });
            }
        }
    }
    report
}
