//! Teams Manager wire types
//!
//! Only the properties this tool reads or writes are modelled; every other
//! property in the backend's JSON is ignored on deserialization.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical field type vocabulary of Teams Manager templates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Date,
    Person,
    Number,
    Dropdown,
    Checkbox,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Date => "date",
            FieldType::Person => "person",
            FieldType::Number => "number",
            FieldType::Dropdown => "dropdown",
            FieldType::Checkbox => "checkbox",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single choice of a dropdown field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldChoice {
    pub internal_name: String,
    pub display_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldOptions {
    #[serde(default)]
    pub choices: Vec<FieldChoice>,
}

/// A metadata field defined on a template (or in the global field catalog)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    #[serde(default)]
    pub id: i64,
    pub title: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_options: Option<FieldOptions>,
}

impl Field {
    pub fn new(title: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            id: 0,
            title: title.into(),
            field_type,
            required: false,
            field_options: None,
        }
    }

    /// Choice display names of a dropdown field
    pub fn choices(&self) -> Vec<&str> {
        self.field_options
            .as_ref()
            .map(|o| o.choices.iter().map(|c| c.display_name.as_str()).collect())
            .unwrap_or_default()
    }
}

/// Teams Manager template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub team_id: String,
    #[serde(default)]
    pub fields: Vec<Field>,
}

/// Slim view of a team already managed by Teams Manager
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SlimTeam {
    pub team_id: String,
    #[serde(default)]
    pub display_name: String,
}

/// Paged response envelope: `item1` is the next link, `item2` the page items
#[derive(Debug, Clone, Deserialize)]
pub struct NextLink<T> {
    pub item1: Option<String>,
    #[serde(default = "Vec::new")]
    pub item2: Vec<T>,
}

impl<T> NextLink<T> {
    /// Next link to request, if the backend reported more pages
    pub fn next(&self) -> Option<&str> {
        match self.item1.as_deref() {
            None | Some("") | Some("1") => None,
            Some(link) => Some(link),
        }
    }
}

/// Directory user returned by the user search endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub user_principal_name: String,
    #[serde(default)]
    pub mail: Option<String>,
}

/// Value sent for one field when converting a team
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldValuePayload {
    pub field_id: i64,
    pub value: String,
}

/// Serialized form of a resolved person inside a person field value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonValue {
    pub id: String,
    pub login_name: String,
    pub secondary_text: String,
    pub primary_text: String,
}

impl From<&User> for PersonValue {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            login_name: user.user_principal_name.clone(),
            secondary_text: user.user_principal_name.clone(),
            primary_text: user.display_name.clone(),
        }
    }
}

/// A field staged for creation during the editing session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateField {
    pub title: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
}
