//! Interactive metadata editor
//!
//! Lets the user map Valo metadata fields onto template fields, team by team,
//! until every team they care about is fully matched.
//!
//! # Architecture
//!
//! - `EditorStep`: one variant per screen, in flow order
//! - `StepOutcome`: what a step asks the loop to do next
//! - `MetadataEditor`: owns the [`MappingSession`] and the remembered
//!   selections (team, source field) the later steps work on
//!
//! Every mutation goes through the session and the levels shown are
//! recomputed from it on each screen.

use anyhow::Result;
use console::style;
use tracing::debug;

use crate::pipeline::{
    propose_for, MappingSession, MetadataField, MigrationLevel, TargetOption, ValoTeam,
};
use crate::report::print_overview;
use crate::utils::level_style;

use super::prompts::Prompter;

// ============================================================================
// Step Definitions
// ============================================================================

/// Editor screens in flow order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorStep {
    SelectTeam,
    SelectAction,
    AutoMigrateCheck,
    SelectValoField,
    SelectTmField,
    CreateTmField,
    SelectToUnmap,
}

impl EditorStep {
    const ORDER: [EditorStep; 7] = [
        EditorStep::SelectTeam,
        EditorStep::SelectAction,
        EditorStep::AutoMigrateCheck,
        EditorStep::SelectValoField,
        EditorStep::SelectTmField,
        EditorStep::CreateTmField,
        EditorStep::SelectToUnmap,
    ];

    fn index(self) -> usize {
        Self::ORDER.iter().position(|s| *s == self).unwrap_or(0)
    }

    /// Following step; the last one wraps to [`EditorStep::SelectTeam`]
    pub fn next(self) -> Self {
        Self::ORDER[(self.index() + 1) % Self::ORDER.len()]
    }

    /// Preceding step; `None` for the first one
    pub fn prev(self) -> Option<Self> {
        self.index().checked_sub(1).map(|i| Self::ORDER[i])
    }
}

/// Transition requested by a step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Back,
    Advance,
    GoTo(EditorStep),
    /// Leave the editing loop for the overview
    Exit,
}

// ============================================================================
// Editor
// ============================================================================

pub struct MetadataEditor<P: Prompter> {
    session: MappingSession,
    prompter: P,
    step: EditorStep,
    team: Option<String>,
    field: Option<MetadataField>,
}

impl<P: Prompter> MetadataEditor<P> {
    pub fn new(session: MappingSession, prompter: P) -> Self {
        Self {
            session,
            prompter,
            step: EditorStep::SelectTeam,
            team: None,
            field: None,
        }
    }

    pub fn session(&self) -> &MappingSession {
        &self.session
    }

    pub fn into_session(self) -> MappingSession {
        self.session
    }

    pub fn prompter(&self) -> &P {
        &self.prompter
    }

    /// Edit until the user accepts the overview
    pub fn run(&mut self) -> Result<()> {
        loop {
            self.edit()?;
            print_overview(&self.session);
            if !self
                .prompter
                .confirm("Do you want to edit something?", false)?
            {
                return Ok(());
            }
        }
    }

    /// One pass of the editing loop, starting at [`EditorStep::SelectTeam`]
    pub fn edit(&mut self) -> Result<()> {
        self.step = EditorStep::SelectTeam;
        loop {
            let outcome = self.run_step(self.step)?;
            debug!(step = ?self.step, ?outcome, "Editor transition");
            match outcome {
                StepOutcome::Advance => self.step = self.step.next(),
                StepOutcome::Back => match self.step.prev() {
                    Some(step) => self.step = step,
                    None => return Ok(()),
                },
                StepOutcome::GoTo(step) => self.step = step,
                StepOutcome::Exit => return Ok(()),
            }
        }
    }

    fn run_step(&mut self, step: EditorStep) -> Result<StepOutcome> {
        match step {
            EditorStep::SelectTeam => self.select_team(),
            EditorStep::SelectAction => self.select_action(),
            EditorStep::AutoMigrateCheck => self.auto_migrate_check(),
            EditorStep::SelectValoField => self.select_valo_field(),
            EditorStep::SelectTmField => self.select_tm_field(),
            EditorStep::CreateTmField => self.create_tm_field(),
            EditorStep::SelectToUnmap => self.select_to_unmap(),
        }
    }

    fn current_team(&self) -> Option<ValoTeam> {
        self.team
            .as_deref()
            .and_then(|id| self.session.team(id))
            .cloned()
    }

    // ------------------------------------------------------------------------
    // Steps
    // ------------------------------------------------------------------------

    fn select_team(&mut self) -> Result<StepOutcome> {
        self.team = None;
        self.field = None;

        let (ids, items): (Vec<String>, Vec<String>) = self
            .session
            .levels()
            .into_iter()
            .map(|(team, level)| {
                let label = format!("{} ({})", team.title, level.label());
                (team.id.clone(), level_style(level, label).to_string())
            })
            .unzip();

        match self.prompter.select(
            "Choose team for which to change the fields (back opens the overview)",
            &items,
            true,
        )? {
            None => Ok(StepOutcome::Exit),
            Some(i) => {
                self.team = ids.get(i).cloned();
                Ok(StepOutcome::Advance)
            }
        }
    }

    fn select_action(&mut self) -> Result<StepOutcome> {
        let Some(team) = self.current_team() else {
            return Ok(StepOutcome::GoTo(EditorStep::SelectTeam));
        };

        if !self.session.has_links(&team.id) {
            return Ok(StepOutcome::Advance);
        }
        if self.session.level(&team).is_full_match() {
            return Ok(StepOutcome::GoTo(EditorStep::SelectToUnmap));
        }

        let items = vec!["Map".to_string(), "Unmap".to_string()];
        let prompt = format!("Choose action for '{}'", team.title);
        match self.prompter.select(&prompt, &items, true)? {
            None => Ok(StepOutcome::Back),
            Some(0) => Ok(StepOutcome::Advance),
            Some(_) => Ok(StepOutcome::GoTo(EditorStep::SelectToUnmap)),
        }
    }

    fn auto_migrate_check(&mut self) -> Result<StepOutcome> {
        let Some(team) = self.current_team() else {
            return Ok(StepOutcome::GoTo(EditorStep::SelectTeam));
        };
        if self.session.level(&team) != MigrationLevel::TypeMatch {
            return Ok(StepOutcome::Advance);
        }

        let proposal = propose_for(&self.session, &team);
        if proposal.is_empty() {
            return Ok(StepOutcome::Advance);
        }

        self.prompter.note(&format!(
            "The metadata of '{}' can be mapped automatically based on the types.\n    \
             You will still be able to edit the mapping later on.",
            team.title
        ));
        for link in &proposal {
            self.prompter.note(&format!(
                "    {}  {}  {}",
                link.from.field_name,
                style("-->").dim(),
                link.to
            ));
        }

        let items = vec![
            "Auto-migrate based on type".to_string(),
            "Manually migrate".to_string(),
        ];
        match self
            .prompter
            .select("Do you want to auto-migrate?", &items, true)?
        {
            None => Ok(StepOutcome::GoTo(EditorStep::SelectTeam)),
            Some(0) => {
                let added = self.session.apply_links(proposal);
                debug!(team = %team.title, added, "Applied auto-migration");
                Ok(StepOutcome::GoTo(EditorStep::SelectTeam))
            }
            Some(_) => Ok(StepOutcome::Advance),
        }
    }

    fn select_valo_field(&mut self) -> Result<StepOutcome> {
        self.field = None;
        let Some(team) = self.current_team() else {
            return Ok(StepOutcome::GoTo(EditorStep::SelectTeam));
        };

        let fields = self.session.unmapped_fields(&team);
        if fields.is_empty() {
            self.prompter
                .note(&format!("Every field of '{}' is mapped", team.title));
            return Ok(StepOutcome::GoTo(EditorStep::SelectTeam));
        }

        let items: Vec<String> = fields
            .iter()
            .map(|f| format!("{} {}", f.field_name, style(format!("({})", f.field_type)).dim()))
            .collect();
        match self
            .prompter
            .select("Choose a Valo metadata field", &items, true)?
        {
            None => Ok(StepOutcome::GoTo(EditorStep::SelectTeam)),
            Some(i) => {
                self.field = fields.get(i).cloned();
                Ok(StepOutcome::Advance)
            }
        }
    }

    fn select_tm_field(&mut self) -> Result<StepOutcome> {
        let Some(team) = self.current_team() else {
            return Ok(StepOutcome::GoTo(EditorStep::SelectTeam));
        };
        let Some(field) = self.field.clone() else {
            return Ok(StepOutcome::GoTo(EditorStep::SelectValoField));
        };

        let options = self.session.target_options(&team, &field);
        let mut items = vec![style("Create new metadata field").green().to_string()];
        items.extend(options.iter().map(|option| match option {
            TargetOption::Staged(f) => format!("{} {}", f.title, style("(new)").dim()),
            TargetOption::Template(f) => f.title.clone(),
        }));

        let prompt = format!(
            "Choose TM metadata field to migrate '{}' to",
            field.field_name
        );
        match self.prompter.select(&prompt, &items, true)? {
            None => Ok(StepOutcome::Back),
            Some(0) => Ok(StepOutcome::Advance),
            Some(i) => {
                let Some(target) = options.get(i - 1) else {
                    return Ok(StepOutcome::Back);
                };
                self.session.link(&team.id, field, target.title())?;
                Ok(StepOutcome::GoTo(EditorStep::SelectValoField))
            }
        }
    }

    fn create_tm_field(&mut self) -> Result<StepOutcome> {
        let Some(team) = self.current_team() else {
            return Ok(StepOutcome::GoTo(EditorStep::SelectTeam));
        };
        let Some(field) = self.field.clone() else {
            return Ok(StepOutcome::GoTo(EditorStep::SelectValoField));
        };

        let mut title = None;
        if self.session.validate_title(&field.field_name).is_ok() {
            let items = vec!["Use it".to_string(), "Enter custom name".to_string()];
            let prompt = format!(
                "Do you want to use '{}' for the name?",
                field.field_name
            );
            match self.prompter.select(&prompt, &items, true)? {
                None => return Ok(StepOutcome::Back),
                Some(0) => title = Some(field.field_name.clone()),
                Some(_) => {}
            }
        }

        let title = match title {
            Some(title) => title,
            None => match self.ask_custom_title()? {
                Some(title) => title,
                None => return Ok(StepOutcome::Back),
            },
        };

        match self.session.stage_and_link(&team.id, field, &title) {
            Ok(title) => {
                self.prompter
                    .note(&format!("'{}' will be created while migrating", title));
                Ok(StepOutcome::GoTo(EditorStep::SelectValoField))
            }
            Err(e) => {
                self.prompter.note(&style(e.to_string()).red().to_string());
                Ok(StepOutcome::Back)
            }
        }
    }

    /// Ask for a title until it's valid and confirmed; `None` when discarded
    fn ask_custom_title(&mut self) -> Result<Option<String>> {
        loop {
            let raw = self
                .prompter
                .input("Enter custom name for the field", None)?;
            let title = match self.session.validate_title(&raw) {
                Ok(title) => title,
                Err(e) => {
                    self.prompter.note(&style(e.to_string()).red().to_string());
                    continue;
                }
            };

            let items = vec![
                "No, continue and save the name".to_string(),
                "Yes, change the name".to_string(),
            ];
            let prompt = format!("Do you want to change the name '{}'?", title);
            match self.prompter.select(&prompt, &items, true)? {
                None => return Ok(None),
                Some(0) => return Ok(Some(title)),
                Some(_) => continue,
            }
        }
    }

    fn select_to_unmap(&mut self) -> Result<StepOutcome> {
        let Some(team) = self.current_team() else {
            return Ok(StepOutcome::GoTo(EditorStep::SelectTeam));
        };

        let links: Vec<_> = self.session.links_for(&team.id).cloned().collect();
        if links.is_empty() {
            return Ok(self.after_unmap(&team));
        }

        let items: Vec<String> = links
            .iter()
            .map(|l| format!("{}  {}  {}", l.from.field_name, style("-->").dim(), l.to))
            .collect();
        let Some(i) = self
            .prompter
            .select("Choose a TM metadata field to unmap", &items, true)?
        else {
            return Ok(self.after_unmap(&team));
        };
        let Some(link) = links.get(i) else {
            return Ok(self.after_unmap(&team));
        };

        if self.session.is_staged(&link.to) && self.session.usage_count(&link.to) == 1 {
            self.prompter.note(&format!(
                "'{}' would be created but is only used once,\n    \
                 so unmapping it removes it from the fields to create (not from Teams Manager)",
                link.to
            ));
            let items = vec![
                "Yes, unmap and delete".to_string(),
                "No, go back".to_string(),
            ];
            match self.prompter.select("Do you want to unmap it?", &items, false)? {
                Some(0) => {
                    self.session.unstage(&link.to);
                }
                _ => return Ok(StepOutcome::GoTo(EditorStep::SelectToUnmap)),
            }
        }

        self.session.unlink(&team.id, &link.from);
        Ok(self.after_unmap(&team))
    }

    fn after_unmap(&self, team: &ValoTeam) -> StepOutcome {
        if self.session.level(team).is_full_match() {
            StepOutcome::GoTo(EditorStep::SelectTeam)
        } else {
            StepOutcome::GoTo(EditorStep::SelectAction)
        }
    }
}
