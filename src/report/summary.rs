//! Migration summary report

use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, Color, Table};
use console::style;

use crate::pipeline::{MigrationReport, TeamOutcome};

/// Summary of one migration run
#[derive(Debug, Default)]
pub struct MigrationSummary {
    pub teams_selected: usize,
    pub fields_created: usize,
    pub report: MigrationReport,
}

impl MigrationSummary {
    pub fn new(teams_selected: usize, fields_created: usize) -> Self {
        Self {
            teams_selected,
            fields_created,
            ..Default::default()
        }
    }

    pub fn set_report(&mut self, report: MigrationReport) {
        self.report = report;
    }

    pub fn migrated(&self) -> usize {
        self.report.succeeded().count()
    }

    pub fn failed(&self) -> usize {
        self.report.failed().count()
    }

    /// Selected teams that were never sent: not fully matched, or left over
    /// after the run was stopped
    pub fn not_attempted(&self) -> usize {
        self.teams_selected
            .saturating_sub(self.report.results.len())
    }

    pub fn display(&self) {
        println!();
        println!(
            "    {} {}",
            style("📋").cyan(),
            style("MIGRATION SUMMARY").white().bold()
        );
        println!("    {}", style("─".repeat(50)).dim());
        println!();

        let mut table = Table::new();
        table.load_preset(UTF8_FULL_CONDENSED);
        table.set_header(vec![
            Cell::new("Metric").add_attribute(Attribute::Bold),
            Cell::new("Value").add_attribute(Attribute::Bold),
        ]);

        table.add_row(vec![
            Cell::new("👥 Selected Teams"),
            Cell::new(self.teams_selected),
        ]);
        table.add_row(vec![
            Cell::new("🆕 Created Fields"),
            Cell::new(self.fields_created),
        ]);
        table.add_row(vec![
            Cell::new("⏭️  Not Attempted"),
            Cell::new(self.not_attempted()).fg(if self.not_attempted() == 0 {
                Color::White
            } else {
                Color::Yellow
            }),
        ]);
        table.add_row(vec![
            Cell::new("❌ Failed"),
            Cell::new(self.failed()).fg(if self.failed() == 0 {
                Color::White
            } else {
                Color::Red
            }),
        ]);
        table.add_row(vec![
            Cell::new("✅ Migrated"),
            Cell::new(self.migrated())
                .fg(Color::Green)
                .add_attribute(Attribute::Bold),
        ]);

        // Indent the table
        for line in table.to_string().lines() {
            println!("    {}", line);
        }

        if let Some(reason) = &self.report.aborted {
            println!();
            println!(
                "    {} {}",
                style("Migration stopped early:").red().bold(),
                style(reason).dim()
            );
        }

        let failures: Vec<_> = self.report.failed().collect();
        if !failures.is_empty() {
            println!();
            println!(
                "    {} {}",
                style("📝").cyan(),
                style("FAILED TEAMS").white().bold()
            );
            println!("    {}", style("─".repeat(50)).dim());
            for result in failures {
                if let TeamOutcome::Failed(reason) = &result.outcome {
                    println!(
                        "        {} {} {}",
                        style("•").dim(),
                        result.team_title,
                        style(format!("({})", reason)).dim()
                    );
                }
            }
        }

        let incomplete: Vec<_> = self
            .report
            .succeeded()
            .filter(|r| !r.skipped_fields.is_empty() || !r.unresolved_people.is_empty())
            .collect();
        if !incomplete.is_empty() {
            println!();
            println!(
                "    {} {}",
                style("📝").cyan(),
                style("MIGRATED WITH GAPS").white().bold()
            );
            println!("    {}", style("─".repeat(50)).dim());
            for result in incomplete {
                println!("        {} {}", style("•").dim(), result.team_title);
                for field in &result.skipped_fields {
                    println!("          {} no target field", style(field).yellow());
                }
                for person in &result.unresolved_people {
                    println!("          {} user not found", style(person).yellow());
                }
            }
        }
    }
}
