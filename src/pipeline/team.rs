//! Valo team records as exported from Valo
//!
//! The export carries dozens of properties per team; only the identity, the
//! title and the dynamic metadata matter for the migration.

use serde::{Deserialize, Serialize};

use crate::tm::FieldType;

/// Raw metadata value as found in the export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldValue {
    pub field_name: String,
    /// Source type token, e.g. `User`, `DateTime`, `Choice`, `Text`
    pub field_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<String>>,
}

impl FieldValue {
    pub fn new(field_name: impl Into<String>, field_type: impl Into<String>) -> Self {
        Self {
            field_name: field_name.into(),
            field_type: field_type.into(),
            values: None,
        }
    }

    pub fn with_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.values = Some(values.into_iter().map(Into::into).collect());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DynamicMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ct_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
    #[serde(default)]
    pub field_values: Vec<FieldValue>,
}

/// A Valo group record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValoTeam {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dynamic_metadata: Option<DynamicMetadata>,
}

impl ValoTeam {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            dynamic_metadata: None,
        }
    }

    pub fn with_fields(mut self, fields: Vec<FieldValue>) -> Self {
        self.dynamic_metadata = Some(DynamicMetadata {
            field_values: fields,
            ..Default::default()
        });
        self
    }

    /// Raw metadata values, empty when the team carries no metadata
    pub fn field_values(&self) -> &[FieldValue] {
        self.dynamic_metadata
            .as_ref()
            .map(|m| m.field_values.as_slice())
            .unwrap_or(&[])
    }
}

/// A metadata field after type normalization
///
/// Two metadata fields are the same field when name and type agree; the
/// values never take part in that comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataField {
    pub field_name: String,
    pub field_type: FieldType,
    #[serde(default)]
    pub values: Vec<String>,
}

impl MetadataField {
    pub fn new(field_name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            field_name: field_name.into(),
            field_type,
            values: Vec::new(),
        }
    }

    pub fn same_field(&self, other: &MetadataField) -> bool {
        self.field_name == other.field_name && self.field_type == other.field_type
    }

    /// First value, or an empty string when the field has none
    pub fn first_value(&self) -> &str {
        self.values.first().map(String::as_str).unwrap_or("")
    }
}

impl PartialEq for MetadataField {
    fn eq(&self, other: &Self) -> bool {
        self.same_field(other)
    }
}

impl Eq for MetadataField {}
