//! Interactive prompts using dialoguer
//!
//! Everything the editor and the run loop ask goes through [`Prompter`], so
//! the same flows run against scripted answers in tests.

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use console::style;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input, MultiSelect, Password, Select};

use crate::pipeline::{MigrationLevel, ValoTeam};
use crate::tm::auth::AuthPrompt;
use crate::tm::{AuthError, Template};
use crate::utils::level_style;

/// Label of the extra entry that lets a selection go back
pub const BACK_LABEL: &str = "<- Back";

/// Questions asked on the terminal
pub trait Prompter {
    /// Pick one item; `None` when the user went back
    fn select(&mut self, prompt: &str, items: &[String], allow_back: bool) -> Result<Option<usize>>;

    /// Pick any number of items
    fn multi_select(&mut self, prompt: &str, items: &[String]) -> Result<Vec<usize>>;

    fn input(&mut self, prompt: &str, initial: Option<&str>) -> Result<String>;

    fn confirm(&mut self, prompt: &str, default: bool) -> Result<bool>;

    /// Show a message without asking anything
    fn note(&mut self, message: &str);
}

/// [`Prompter`] backed by dialoguer
pub struct TerminalPrompter {
    theme: ColorfulTheme,
}

impl TerminalPrompter {
    pub fn new() -> Self {
        Self {
            theme: ColorfulTheme::default(),
        }
    }
}

impl Default for TerminalPrompter {
    fn default() -> Self {
        Self::new()
    }
}

impl Prompter for TerminalPrompter {
    fn select(&mut self, prompt: &str, items: &[String], allow_back: bool) -> Result<Option<usize>> {
        let mut shown: Vec<String> = items.to_vec();
        if allow_back {
            shown.push(style(BACK_LABEL).dim().to_string());
        }
        let choice = Select::with_theme(&self.theme)
            .with_prompt(prompt)
            .items(&shown)
            .default(0)
            .interact_opt()?;
        Ok(choice.filter(|&i| i < items.len()))
    }

    fn multi_select(&mut self, prompt: &str, items: &[String]) -> Result<Vec<usize>> {
        let chosen = MultiSelect::with_theme(&self.theme)
            .with_prompt(prompt)
            .items(items)
            .interact()?;
        Ok(chosen)
    }

    fn input(&mut self, prompt: &str, initial: Option<&str>) -> Result<String> {
        let mut input = Input::<String>::with_theme(&self.theme)
            .with_prompt(prompt)
            .allow_empty(true);
        if let Some(initial) = initial {
            input = input.with_initial_text(initial);
        }
        Ok(input.interact_text()?)
    }

    fn confirm(&mut self, prompt: &str, default: bool) -> Result<bool> {
        let confirmed = Confirm::with_theme(&self.theme)
            .with_prompt(prompt)
            .default(default)
            .interact()?;
        Ok(confirmed)
    }

    fn note(&mut self, message: &str) {
        println!("    {}", message);
    }
}

/// Terminal answers for the auth flow
pub struct TerminalAuthPrompt;

impl AuthPrompt for TerminalAuthPrompt {
    fn confirm_reauth(&self) -> bool {
        Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt("The backend rejected the access token. Reauthenticate?")
            .default(true)
            .interact()
            .unwrap_or(false)
    }

    fn ask_token(&self) -> Result<Option<String>, AuthError> {
        let token = Password::with_theme(&ColorfulTheme::default())
            .with_prompt("Paste a new access token (empty to give up)")
            .allow_empty_password(true)
            .interact()
            .map_err(|e| AuthError::Prompt(e.to_string()))?;
        Ok(Some(token).filter(|t| !t.trim().is_empty()))
    }
}

/// JSON files directly inside the given directories, sorted per directory
pub fn find_json_files(dirs: &[PathBuf]) -> Vec<PathBuf> {
    let mut found = Vec::new();
    for dir in dirs {
        let Ok(read_dir) = std::fs::read_dir(dir) else {
            continue;
        };
        let mut files: Vec<PathBuf> = read_dir
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && is_json_file(path))
            .collect();
        files.sort();
        found.extend(files);
    }
    found
}

fn is_json_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"))
}

/// Let the user pick the team export from the working and home directories
///
/// Returns `None` when the user backs out.
pub fn select_input_file<P: Prompter>(prompter: &mut P, search_dirs: &[PathBuf]) -> Result<Option<PathBuf>> {
    let candidates = find_json_files(search_dirs);
    let mut items: Vec<String> = candidates.iter().map(|p| p.display().to_string()).collect();
    items.push("Enter a path manually".to_string());

    let Some(choice) = prompter.select("Choose the exported Valo team list", &items, true)? else {
        return Ok(None);
    };
    if choice < candidates.len() {
        return Ok(Some(candidates[choice].clone()));
    }

    let path = prompter.input("Path to the exported Valo team list", None)?;
    let path = path.trim();
    if path.is_empty() {
        return Ok(None);
    }
    Ok(Some(PathBuf::from(path)))
}

/// Directories searched for the team export
pub fn default_search_dirs() -> Vec<PathBuf> {
    let mut search = vec![PathBuf::from(".")];
    if let Some(home) = dirs::home_dir() {
        search.push(home);
    }
    search
}

/// Pick the target template, by name when one was given
pub fn select_template<P: Prompter>(
    prompter: &mut P,
    templates: &[Template],
    name: Option<&str>,
) -> Result<Option<Template>> {
    let named: Vec<&Template> = templates
        .iter()
        .filter(|t| !t.display_name.is_empty())
        .collect();

    if let Some(name) = name {
        return match named.iter().find(|t| t.display_name == name) {
            Some(template) => Ok(Some((*template).clone())),
            None => bail!("Template '{}' not found", name),
        };
    }

    if named.is_empty() {
        bail!("No templates available");
    }

    let items: Vec<String> = named.iter().map(|t| t.display_name.clone()).collect();
    let choice = prompter.select("Choose which template to use for migration", &items, false)?;
    Ok(choice.map(|i| named[i].clone()))
}

/// Pick the teams to migrate, each shown in the color of its level
pub fn select_teams<P: Prompter>(
    prompter: &mut P,
    template_name: &str,
    levels: &[(&ValoTeam, MigrationLevel)],
) -> Result<Vec<ValoTeam>> {
    let items: Vec<String> = levels
        .iter()
        .map(|(team, level)| level_style(*level, team.title.as_str()).to_string())
        .collect();
    let prompt = format!("Choose which teams to migrate with the template '{template_name}'");
    let chosen = prompter.multi_select(&prompt, &items)?;
    Ok(chosen
        .into_iter()
        .filter_map(|i| levels.get(i).map(|(team, _)| (*team).clone()))
        .collect())
}
