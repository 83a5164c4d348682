//! Auto-mapping proposal for teams whose types already line up
//!
//! Walks the template fields in declaration order and pairs each one with the
//! first remaining source field of the same type and name, falling back to
//! the first remaining source field of the same type. A source field is used
//! at most once, and so is a template field.

use crate::tm::Field;

use super::normalize::normalize;
use super::session::{LinkField, MappingSession};
use super::team::{MetadataField, ValoTeam};

/// Propose links for `team` from its unmapped fields to template fields it
/// doesn't target yet
pub fn propose(template_fields: &[Field], team: &ValoTeam, existing: &[LinkField]) -> Vec<LinkField> {
    let team_links: Vec<&LinkField> = existing.iter().filter(|l| l.team == team.id).collect();

    let mut remaining: Vec<MetadataField> = normalize(team.field_values())
        .into_iter()
        .filter(|f| !team_links.iter().any(|l| l.from.same_field(f)))
        .collect();

    let mut proposal = Vec::new();
    for target in template_fields {
        if team_links.iter().any(|l| l.to == target.title) {
            continue;
        }

        let index = remaining
            .iter()
            .position(|f| f.field_type == target.field_type && f.field_name == target.title)
            .or_else(|| {
                remaining
                    .iter()
                    .position(|f| f.field_type == target.field_type)
            });

        if let Some(index) = index {
            let from = remaining.remove(index);
            proposal.push(LinkField::new(team.id.clone(), from, target.title.clone()));
        }
    }
    proposal
}

/// Proposal for a team of a running session
pub fn propose_for(session: &MappingSession, team: &ValoTeam) -> Vec<LinkField> {
    propose(&session.template().fields, team, session.links())
}
