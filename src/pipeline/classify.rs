//! Migration level classification
//!
//! Decides how well a team's metadata lines up with a template, taking the
//! mappings the user already confirmed into account.
//!
//! # Algorithm
//!
//! 1. No metadata at all: [`MigrationLevel::NoValues`]
//! 2. Every normalized field has a confirmed mapping: [`MigrationLevel::FullMatch`]
//! 3. Greedy one-to-one assignment by type. Any source field left without a
//!    template field: [`MigrationLevel::NoMatch`]
//! 4. Greedy one-to-one assignment by type and title. Complete:
//!    [`MigrationLevel::FullMatch`], otherwise [`MigrationLevel::TypeMatch`]
//!
//! Both assignments walk the source fields left to right and hand each one
//! the first unused template field in declaration order. There is no
//! backtracking, so an ordering where an early source field grabs a template
//! field a later one needed reports a weaker level than the best assignment
//! would. The auto-mapping proposal relies on the same greedy order.

use std::fmt;

use crate::tm::{Field, Template};

use super::normalize::normalize;
use super::session::LinkField;
use super::team::{MetadataField, ValoTeam};

/// How well a team's metadata aligns with a template
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MigrationLevel {
    /// Types and names don't line up with the template
    NoMatch,
    /// Types line up, names don't
    TypeMatch,
    /// Types and names line up, or every field is mapped
    FullMatch,
    /// The team carries no metadata
    NoValues,
}

impl MigrationLevel {
    pub fn label(&self) -> &'static str {
        match self {
            MigrationLevel::NoMatch => "No match",
            MigrationLevel::TypeMatch => "Type match",
            MigrationLevel::FullMatch => "Full match",
            MigrationLevel::NoValues => "No values",
        }
    }

    pub fn is_full_match(&self) -> bool {
        matches!(self, MigrationLevel::FullMatch)
    }
}

impl fmt::Display for MigrationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Classify one team against a template's fields
///
/// `confirmed` holds the source fields of this team that already have a
/// mapping; where they point to is irrelevant here.
pub fn classify(
    template_fields: &[Field],
    team: &ValoTeam,
    confirmed: &[MetadataField],
) -> MigrationLevel {
    let raw = team.field_values();
    if raw.is_empty() {
        return MigrationLevel::NoValues;
    }

    let fields = normalize(raw);

    if fields
        .iter()
        .all(|field| confirmed.iter().any(|c| c.same_field(field)))
    {
        return MigrationLevel::FullMatch;
    }

    if !greedy_assign(template_fields, &fields, |t, s| t.field_type == s.field_type) {
        return MigrationLevel::NoMatch;
    }

    if greedy_assign(template_fields, &fields, |t, s| {
        t.field_type == s.field_type && t.title == s.field_name
    }) {
        MigrationLevel::FullMatch
    } else {
        MigrationLevel::TypeMatch
    }
}

/// Classify a team using the links recorded for it
pub fn classify_with_links(
    template_fields: &[Field],
    team: &ValoTeam,
    links: &[LinkField],
) -> MigrationLevel {
    let confirmed: Vec<MetadataField> = links
        .iter()
        .filter(|link| link.team == team.id)
        .map(|link| link.from.clone())
        .collect();
    classify(template_fields, team, &confirmed)
}

/// Classify every team, keeping input order
pub fn classify_teams<'a>(
    template: &Template,
    teams: &'a [ValoTeam],
    links: &[LinkField],
) -> Vec<(&'a ValoTeam, MigrationLevel)> {
    teams
        .iter()
        .map(|team| (team, classify_with_links(&template.fields, team, links)))
        .collect()
}

/// Hand each source field the first unused template field accepted by `matches`
fn greedy_assign<F>(template_fields: &[Field], fields: &[MetadataField], matches: F) -> bool
where
    F: Fn(&Field, &MetadataField) -> bool,
{
    let mut used = vec![false; template_fields.len()];
    fields.iter().all(|field| {
        let slot = template_fields
            .iter()
            .enumerate()
            .position(|(i, t)| !used[i] && matches(t, field));
        match slot {
            Some(i) => {
                used[i] = true;
                true
            }
            None => false,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::team::FieldValue;
    use crate::tm::FieldType;

    #[test]
    fn test_strict_pass_consumes_template_fields() {
        // The second "A" can't reuse the template field the first one took
        let template = vec![
            Field::new("A", FieldType::Text),
            Field::new("B", FieldType::Text),
        ];
        let team = ValoTeam::new("t", "T").with_fields(vec![
            FieldValue::new("A", "Text"),
            FieldValue::new("A", "Text"),
        ]);
        assert_eq!(classify(&template, &team, &[]), MigrationLevel::TypeMatch);
    }

    #[test]
    fn test_type_pass_needs_one_slot_per_field() {
        let template = vec![
            Field::new("X", FieldType::Text),
            Field::new("Y", FieldType::Dropdown),
        ];
        let team = ValoTeam::new("t", "T").with_fields(vec![
            FieldValue::new("X", "Text"),
            FieldValue::new("Z", "Text"),
        ]);
        assert_eq!(classify(&template, &team, &[]), MigrationLevel::NoMatch);
    }

    #[test]
    fn test_source_order_is_irrelevant_for_distinct_titles() {
        let template = vec![
            Field::new("A", FieldType::Text),
            Field::new("B", FieldType::Text),
        ];
        let team = ValoTeam::new("t", "T").with_fields(vec![
            FieldValue::new("B", "Text"),
            FieldValue::new("A", "Text"),
        ]);
        assert_eq!(classify(&template, &team, &[]), MigrationLevel::FullMatch);
    }
}
