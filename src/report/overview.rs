//! Migration overview shown after the editing loop

use console::style;

use crate::pipeline::MappingSession;

/// One source to target pair of a team
#[derive(Debug, Clone, PartialEq)]
pub struct OverviewRow {
    pub source: String,
    /// Linked target title; `None` when the field relies on a same-name field
    pub target: Option<String>,
    /// Target will be created while migrating
    pub staged: bool,
}

/// A fully matched team with its field chain
#[derive(Debug, Clone, PartialEq)]
pub struct OverviewEntry {
    pub team_title: String,
    pub rows: Vec<OverviewRow>,
}

/// Collect the fully matched teams of a session with their mappings
///
/// Fields without a mapping carry no target.
pub fn build_overview(session: &MappingSession) -> Vec<OverviewEntry> {
    session
        .full_match_teams()
        .into_iter()
        .map(|team| {
            let rows = crate::pipeline::normalize(team.field_values())
                .into_iter()
                .map(|field| {
                    let target = session.link_of(&team.id, &field).map(|l| l.to.clone());
                    OverviewRow {
                        staged: target.as_deref().is_some_and(|t| session.is_staged(t)),
                        source: field.field_name,
                        target,
                    }
                })
                .collect();
            OverviewEntry {
                team_title: team.title.clone(),
                rows,
            }
        })
        .collect()
}

pub fn print_overview(session: &MappingSession) {
    println!();
    println!("    {}", style("Migration Overview").white().bold());
    println!(
        "    {}",
        style(format!(
            "- {} will be created while migrating",
            style("Underlined fields").underlined()
        ))
        .dim()
    );
    println!(
        "    {}",
        style("- Field names are mapped by name since names must be globally unique").dim()
    );
    println!(
        "    {}",
        style("- Teams without metadata or with missing mappings (not green) are not listed").dim()
    );

    let entries = build_overview(session);
    if entries.is_empty() {
        println!();
        println!("    {}", style("No team is ready for migration").yellow());
    }

    for entry in entries {
        println!();
        println!("    Team:      {}", style(&entry.team_title).bold());
        println!("    Metadata:");
        let width = entry
            .rows
            .iter()
            .map(|r| r.source.chars().count())
            .max()
            .unwrap_or(0);
        let last = entry.rows.len().saturating_sub(1);
        for (i, row) in entry.rows.iter().enumerate() {
            let branch = if i == last { "┗━" } else { "┣━" };
            let Some(target) = &row.target else {
                println!("      {} {}", style(branch).dim(), row.source);
                continue;
            };
            let target = if row.staged {
                style(target.as_str()).underlined()
            } else {
                style(target.as_str())
            };
            println!(
                "      {} {:<width$}  -->  {}",
                style(branch).dim(),
                row.source,
                target,
                width = width
            );
        }
    }
    println!();
}
