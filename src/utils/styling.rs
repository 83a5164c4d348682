//! Terminal styling utilities

use console::{style, Emoji, StyledObject};

use crate::pipeline::MigrationLevel;

// Emoji icons with fallbacks for terminals that don't support them
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "[*] ");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", ">> ");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "[!] ");

/// Print the application banner
pub fn print_banner(version: &str) {
    println!();
    println!(
        "    {} {}",
        style("valo2tm").cyan().bold(),
        style("Valo to Teams Manager migration").dim()
    );
    println!("    {}", style(format!("v{}", version)).dim());
    println!("    {}", style("━".repeat(50)).dim());
    println!();
}

/// Color a piece of text by migration level
pub fn level_style<D>(level: MigrationLevel, text: D) -> StyledObject<D> {
    let styled = style(text);
    match level {
        MigrationLevel::NoMatch => styled.red(),
        MigrationLevel::TypeMatch => styled.yellow(),
        MigrationLevel::FullMatch => styled.green(),
        MigrationLevel::NoValues => styled.blue(),
    }
}

/// Print what the team colors mean for a template
pub fn print_legend(template_name: &str) {
    let rows = [
        (
            MigrationLevel::FullMatch,
            "Green",
            format!("Metadata types and names match with the template '{template_name}'"),
        ),
        (
            MigrationLevel::TypeMatch,
            "Yellow",
            format!("Metadata types match with the template '{template_name}'"),
        ),
        (
            MigrationLevel::NoMatch,
            "Red",
            format!("Metadata types and names don't match with the template '{template_name}'"),
        ),
        (
            MigrationLevel::NoValues,
            "Blue",
            "There are no metadata fields on the Valo team; migrated values will be empty"
                .to_string(),
        ),
    ];

    for (level, color, meaning) in rows {
        println!("    {:<8} -  {}", level_style(level, color), meaning);
    }
    println!();
}

/// Print a step header with styling
pub fn print_step_header(title: &str) {
    println!();
    println!("    {}", style(title).white().bold());
    println!("    {}", style("─".repeat(50)).dim());
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("    {} {}", style("✓").green().bold(), style(message).green());
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("    {} {}", INFO, message);
}

pub fn print_warning(message: &str) {
    println!("    {} {}", WARN, style(message).yellow());
}

/// Print the final completion message
pub fn print_completion() {
    println!();
    println!(
        "    {} {}",
        ROCKET,
        style("Migration complete!").green().bold()
    );
    println!();
}

/// Print a styled count message
pub fn print_count(description: &str, count: usize) {
    println!("      {} {}", style(count).yellow().bold(), description);
}

/// Shorten a string to `max_len` characters, keeping the start
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}
