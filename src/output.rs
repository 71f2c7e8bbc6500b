//! Output formatting and styling for the command-line collaborator.
//!
//! Centralizes colored output and progress display so the rest of the CLI
//! never touches styling directly. The core pipeline does not print; only
//! this layer does.

use crate::model::{ActionStatus, PlannedAction};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

/// Manages all CLI output with consistent styling.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an info message in cyan.
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    /// Prints a regular message without styling.
    pub fn plain(message: &str) {
        println!("{}", message);
    }

    /// Prints a section header.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Prints a dry-run notice message.
    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }

    /// Creates a progress bar sized for the action batch.
    pub fn create_progress_bar(total: u64) -> ProgressBar {
        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
                .expect("Invalid progress bar template")
                .progress_chars("█▓░"),
        );
        pb
    }

    /// Prints per-status totals for a finished run.
    pub fn run_summary(actions: &[PlannedAction]) {
        let count = |status: ActionStatus| actions.iter().filter(|a| a.status == status).count();

        Self::header("SUMMARY");
        println!("Total actions: {}", actions.len());

        let rows = [
            ("Succeeded", count(ActionStatus::Success).to_string().green()),
            ("Planned", count(ActionStatus::Planned).to_string().cyan()),
            ("Skipped", count(ActionStatus::Skipped).to_string().yellow()),
            ("Undone", count(ActionStatus::Undone).to_string().green()),
            ("Failed", count(ActionStatus::Failed).to_string().red()),
        ];
        for (label, value) in rows {
            println!("  {:<9} | {}", label, value);
        }
    }

    /// Prints the failure details for every failed action.
    pub fn failure_details(actions: &[PlannedAction]) {
        for action in actions {
            if action.status == ActionStatus::Failed {
                let reason = action.error_message.as_deref().unwrap_or("unknown error");
                Self::error(&format!("{}: {}", action.source_file.display(), reason));
            }
        }
    }
}
