//! Shared test utilities and fixture builders

#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use valo2tm::cli::Prompter;
use valo2tm::pipeline::{FieldValue, ValoTeam};
use valo2tm::tm::{
    CreateField, Field, FieldType, FieldValuePayload, SlimTeam, Template, TmBackend, TmError, User,
};

// ============================================================================
// Fixtures
// ============================================================================

pub fn field(id: i64, title: &str, field_type: FieldType) -> Field {
    Field {
        id,
        ..Field::new(title, field_type)
    }
}

pub fn template(fields: Vec<Field>) -> Template {
    Template {
        id: "tpl-1".to_string(),
        display_name: "Project".to_string(),
        team_id: "tpl-team-1".to_string(),
        fields,
    }
}

/// Team with `(name, source type, values)` metadata
pub fn team(id: &str, title: &str, fields: &[(&str, &str, &[&str])]) -> ValoTeam {
    ValoTeam::new(id, title).with_fields(
        fields
            .iter()
            .map(|(name, kind, values)| FieldValue::new(*name, *kind).with_values(values.iter().copied()))
            .collect(),
    )
}

/// Template with a text "Dept" and a person "Lead"
pub fn dept_lead_template() -> Template {
    template(vec![
        field(1, "Dept", FieldType::Text),
        field(2, "Lead", FieldType::Person),
    ])
}

/// Team whose fields line up with [`dept_lead_template`] by type only
pub fn dept_owner_team() -> ValoTeam {
    team(
        "team-owner",
        "Owner Team",
        &[("Dept", "Text", &["Sales"]), ("Owner", "User", &["jane@contoso.com"])],
    )
}

/// Team whose fields line up with [`dept_lead_template`] by type and name
pub fn dept_lead_team() -> ValoTeam {
    team(
        "team-lead",
        "Lead Team",
        &[("Dept", "Text", &["IT"]), ("Lead", "User", &["john@contoso.com"])],
    )
}

pub fn user(id: &str, name: &str, upn: &str) -> User {
    User {
        id: id.to_string(),
        display_name: name.to_string(),
        user_principal_name: upn.to_string(),
        mail: Some(upn.to_string()),
    }
}

// ============================================================================
// Fake backend
// ============================================================================

/// A recorded conversion call
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertCall {
    pub template_id: String,
    pub team_id: String,
    pub team_title: String,
    pub field_values: Vec<FieldValuePayload>,
}

/// In-memory Teams Manager
#[derive(Default)]
pub struct FakeBackend {
    pub templates: Vec<Template>,
    pub managed: Vec<SlimTeam>,
    pub catalog: Mutex<Vec<Field>>,
    pub users: HashMap<String, User>,
    /// Team ids whose conversion fails
    pub failing_teams: HashSet<String>,
    /// Search strings whose lookup errors
    pub failing_lookups: HashSet<String>,
    /// Every conversion is refused as if reauthentication was declined
    pub declines_reauth: bool,
    /// Team ids whose conversion task panics
    pub panicking_teams: HashSet<String>,
    pub convert_attempts: AtomicUsize,
    pub conversions: Mutex<Vec<ConvertCall>>,
    pub created: Mutex<Vec<CreateField>>,
}

impl FakeBackend {
    pub fn with_catalog(fields: Vec<Field>) -> Self {
        Self {
            catalog: Mutex::new(fields),
            ..Default::default()
        }
    }

    pub fn add_user(&mut self, user: User) {
        self.users.insert(user.user_principal_name.clone(), user);
    }

    pub fn attempts(&self) -> usize {
        self.convert_attempts.load(Ordering::SeqCst)
    }

    pub fn conversions(&self) -> Vec<ConvertCall> {
        self.conversions.lock().unwrap().clone()
    }

    pub fn conversion_of(&self, team_id: &str) -> Option<ConvertCall> {
        self.conversions()
            .into_iter()
            .find(|c| c.team_id == team_id)
    }
}

fn backend_failure(path: &str) -> TmError {
    TmError::Status {
        path: path.to_string(),
        status: 500,
        body: "Internal Server Error".to_string(),
    }
}

#[async_trait]
impl TmBackend for FakeBackend {
    async fn fetch_templates(&self) -> Result<Vec<Template>, TmError> {
        Ok(self.templates.clone())
    }

    async fn fetch_managed_teams(&self) -> Result<Vec<SlimTeam>, TmError> {
        Ok(self.managed.clone())
    }

    async fn fetch_all_field_definitions(&self) -> Result<Vec<Field>, TmError> {
        Ok(self.catalog.lock().unwrap().clone())
    }

    async fn create_fields(&self, _template_id: &str, fields: &[CreateField]) -> Result<(), TmError> {
        let mut catalog = self.catalog.lock().unwrap();
        for created in fields {
            let id = 1000 + catalog.len() as i64;
            catalog.push(Field {
                id,
                ..Field::new(created.title.clone(), created.field_type)
            });
        }
        self.created.lock().unwrap().extend(fields.iter().cloned());
        Ok(())
    }

    async fn convert_team(
        &self,
        template_id: &str,
        team_id: &str,
        team_title: &str,
        field_values: &[FieldValuePayload],
    ) -> Result<(), TmError> {
        self.convert_attempts.fetch_add(1, Ordering::SeqCst);
        if self.declines_reauth {
            return Err(TmError::ReauthDeclined {
                path: "/ConvertToManagedTeam".to_string(),
            });
        }
        if self.panicking_teams.contains(team_id) {
            panic!("conversion of {team_id} blew up");
        }
        if self.failing_teams.contains(team_id) {
            return Err(backend_failure("/ConvertToManagedTeam"));
        }
        self.conversions.lock().unwrap().push(ConvertCall {
            template_id: template_id.to_string(),
            team_id: team_id.to_string(),
            team_title: team_title.to_string(),
            field_values: field_values.to_vec(),
        });
        Ok(())
    }

    async fn search_users(&self, query: &str) -> Result<Vec<User>, TmError> {
        if self.failing_lookups.contains(query) {
            return Err(backend_failure("/GetUserLimited"));
        }
        Ok(self.users.get(query).cloned().into_iter().collect())
    }
}

// ============================================================================
// Scripted prompter
// ============================================================================

/// One scripted answer
#[derive(Debug, Clone)]
pub enum Answer {
    /// Select the item whose text is this label, or starts with it followed by a space
    Pick(&'static str),
    /// Take the back entry of a selection
    Back,
    Input(&'static str),
    Confirm(bool),
    /// Multi-select these labels
    PickMany(Vec<&'static str>),
}

/// Prompter answering from a script; panics when the script doesn't fit
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: VecDeque<Answer>,
    pub prompts: Vec<String>,
    pub notes: Vec<String>,
}

impl ScriptedPrompter {
    pub fn new(answers: Vec<Answer>) -> Self {
        Self {
            answers: answers.into(),
            ..Default::default()
        }
    }

    pub fn remaining(&self) -> usize {
        self.answers.len()
    }

    fn next(&mut self, prompt: &str) -> Answer {
        self.prompts.push(prompt.to_string());
        self.answers
            .pop_front()
            .unwrap_or_else(|| panic!("No scripted answer left for prompt: {prompt}"))
    }
}

fn find_label(items: &[String], label: &str) -> Option<usize> {
    items.iter().position(|item| {
        let plain = console::strip_ansi_codes(item);
        plain == label || plain.starts_with(&format!("{label} "))
    })
}

impl Prompter for ScriptedPrompter {
    fn select(&mut self, prompt: &str, items: &[String], allow_back: bool) -> anyhow::Result<Option<usize>> {
        match self.next(prompt) {
            Answer::Pick(label) => match find_label(items, label) {
                Some(i) => Ok(Some(i)),
                None => panic!("'{label}' not offered for '{prompt}': {items:?}"),
            },
            Answer::Back if allow_back => Ok(None),
            other => panic!("Unexpected answer {other:?} for selection '{prompt}'"),
        }
    }

    fn multi_select(&mut self, prompt: &str, items: &[String]) -> anyhow::Result<Vec<usize>> {
        match self.next(prompt) {
            Answer::PickMany(labels) => Ok(labels
                .into_iter()
                .map(|label| {
                    find_label(items, label)
                        .unwrap_or_else(|| panic!("'{label}' not offered for '{prompt}'"))
                })
                .collect()),
            other => panic!("Unexpected answer {other:?} for multi-selection '{prompt}'"),
        }
    }

    fn input(&mut self, prompt: &str, _initial: Option<&str>) -> anyhow::Result<String> {
        match self.next(prompt) {
            Answer::Input(text) => Ok(text.to_string()),
            other => panic!("Unexpected answer {other:?} for input '{prompt}'"),
        }
    }

    fn confirm(&mut self, prompt: &str, _default: bool) -> anyhow::Result<bool> {
        match self.next(prompt) {
            Answer::Confirm(yes) => Ok(yes),
            other => panic!("Unexpected answer {other:?} for confirmation '{prompt}'"),
        }
    }

    fn note(&mut self, message: &str) {
        self.notes.push(console::strip_ansi_codes(message).to_string());
    }
}
