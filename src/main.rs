//! valo2tm: Valo to Teams Manager migration CLI
//!
//! Loads an exported Valo team list, lets the user map its metadata onto a
//! Teams Manager template and converts the fully matched teams.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;

use valo2tm::cli::{
    default_search_dirs, select_input_file, select_teams, select_template, Cli, MetadataEditor,
    TerminalAuthPrompt, TerminalPrompter,
};
use valo2tm::pipeline::{classify_teams, filter_unmanaged, load_teams, migrate_teams, MappingSession};
use valo2tm::report::{write_mapping_log, MigrationSummary};
use valo2tm::tm::auth::{AuthPrompt, TokenFileAuth, TokenProvider};
use valo2tm::tm::{TmBackend, TmClient};
use valo2tm::utils::logging::{init_logging, LogConfig};
use valo2tm::utils::{
    create_progress_bar, create_spinner, finish_with_success, finish_with_warning, print_banner,
    print_completion, print_count, print_info, print_legend, print_step_header, print_success,
    print_warning,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&LogConfig::from_verbosity(cli.verbose), cli.verbose > 0)?;

    print_banner(env!("CARGO_PKG_VERSION"));
    let mut prompter = TerminalPrompter::new();

    // Input problems are reported before any backend call
    let input = match cli.input() {
        Some(path) => path.clone(),
        None if cli.no_confirm => bail!(
            "Input file is required when using --no-confirm. Use -i/--input to specify a file."
        ),
        None => match select_input_file(&mut prompter, &default_search_dirs())? {
            Some(path) => path,
            None => {
                println!("Cancelled by user.");
                return Ok(());
            }
        },
    };
    let teams = load_teams(&input)
        .with_context(|| format!("Failed to load teams from {}", input.display()))?;
    print_success(&format!(
        "Loaded {} team(s) from {}",
        teams.len(),
        input.display()
    ));

    let auth_prompt: Arc<dyn AuthPrompt> = Arc::new(TerminalAuthPrompt);
    let auth: Arc<dyn TokenProvider> = Arc::new(
        TokenFileAuth::load(&cli.auth_file, Arc::clone(&auth_prompt)).with_context(|| {
            format!(
                "Failed to load the access token from {}",
                cli.auth_file.display()
            )
        })?,
    );
    let backend: Arc<dyn TmBackend> = Arc::new(TmClient::new(cli.host.clone(), auth, auth_prompt)?);

    // Step 1: Load what Teams Manager already has
    print_step_header("Teams Manager");

    let spinner = create_spinner("Fetching managed teams...");
    let managed = backend
        .fetch_managed_teams()
        .await
        .context("Failed to fetch managed teams")?;
    finish_with_success(&spinner, &format!("Found {} managed team(s)", managed.len()));

    let teams = filter_unmanaged(teams, &managed);
    if teams.is_empty() {
        bail!("No teams to migrate found");
    }
    print_count("team(s) not managed yet", teams.len());

    let spinner = create_spinner("Fetching templates...");
    let templates = backend
        .fetch_templates()
        .await
        .context("Failed to fetch templates")?;
    finish_with_success(&spinner, &format!("Found {} template(s)", templates.len()));

    // Step 2: Template and team selection
    let Some(template) = select_template(&mut prompter, &templates, cli.template.as_deref())?
    else {
        println!("Cancelled by user.");
        return Ok(());
    };

    let selected = if cli.no_confirm {
        teams
    } else {
        print_step_header("Team Selection");
        print_legend(&template.display_name);
        let levels = classify_teams(&template, &teams, &[]);
        select_teams(&mut prompter, &template.display_name, &levels)?
    };
    if selected.is_empty() {
        print_info("No teams selected");
        return Ok(());
    }

    let spinner = create_spinner("Loading metadata fields...");
    let catalog = backend
        .fetch_all_field_definitions()
        .await
        .context("Failed to fetch metadata fields")?;
    finish_with_success(&spinner, &format!("Loaded {} field(s)", catalog.len()));

    // Step 3: Mapping
    let session = MappingSession::new(template.clone(), selected, catalog);
    let session = if cli.no_confirm {
        session
    } else {
        print_step_header("Metadata Editor");
        let mut editor = MetadataEditor::new(session, prompter);
        editor.run()?;
        editor.into_session()
    };

    let mut summary = MigrationSummary::new(session.teams().len(), session.staged().len());

    // Step 4: Migration
    print_step_header("Migration");

    if !session.staged().is_empty() {
        let spinner = create_spinner("Creating metadata fields...");
        backend
            .create_fields(&template.id, session.staged())
            .await
            .context("Failed to create metadata fields")?;
        finish_with_success(
            &spinner,
            &format!("Created {} metadata field(s)", session.staged().len()),
        );
    }

    // Staged fields only have ids once created
    let spinner = create_spinner("Refreshing metadata fields...");
    let catalog = backend
        .fetch_all_field_definitions()
        .await
        .context("Failed to fetch metadata fields")?;
    finish_with_success(&spinner, "Metadata fields refreshed");

    write_mapping_log(&cli.mapping_log, &session)?;
    print_success(&format!(
        "Mapping log written to {}",
        cli.mapping_log.display()
    ));

    let ready = session.full_match_teams().len();
    if ready == 0 {
        print_warning("No selected team is fully matched; nothing to migrate");
    }

    let progress = create_progress_bar(ready as u64, "Migrating teams");
    let report = migrate_teams(
        Arc::clone(&backend),
        session.template(),
        session.teams(),
        session.links(),
        catalog,
        progress.clone(),
    )
    .await;

    let failed = report.failed().count();
    if report.is_aborted() {
        finish_with_warning(&progress, "Migration stopped");
    } else if failed == 0 {
        finish_with_success(&progress, "Migration finished");
    } else {
        finish_with_warning(&progress, &format!("{} team(s) failed", failed));
    }

    let aborted = report.aborted.clone();
    summary.set_report(report);
    summary.display();

    if let Some(reason) = aborted {
        bail!("Migration aborted: {}", reason);
    }

    print_completion();

    Ok(())
}
