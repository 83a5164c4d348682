//! Source type normalization
//!
//! Valo reports SharePoint-style type names while Teams Manager templates use
//! their own lowercase vocabulary. Fields whose type has no counterpart are
//! dropped so nothing downstream ever sees an unknown type.

use crate::tm::FieldType;

use super::team::{FieldValue, MetadataField};

/// Map a source type token to the Teams Manager vocabulary
pub fn normalize_type(token: &str) -> Option<FieldType> {
    match token {
        "User" | "person" => Some(FieldType::Person),
        "DateTime" | "date" => Some(FieldType::Date),
        "Choice" | "dropdown" => Some(FieldType::Dropdown),
        "Text" | "text" => Some(FieldType::Text),
        _ => None,
    }
}

/// Normalize a team's raw metadata, preserving order and dropping unknown types
pub fn normalize(fields: &[FieldValue]) -> Vec<MetadataField> {
    fields
        .iter()
        .filter_map(|field| {
            normalize_type(&field.field_type).map(|field_type| MetadataField {
                field_name: field.field_name.clone(),
                field_type,
                values: field.values.clone().unwrap_or_default(),
            })
        })
        .collect()
}
