//! Command-line collaborator for the organize pipeline.
//!
//! The core contract deliberately excludes argument parsing and progress
//! display; this module owns both. It builds validated `Settings` from the
//! config file plus flags (flags win), drives scan → plan → execute →
//! write_log or undo, and renders progress through the injected observer.

use crate::config::AppConfig;
use crate::executor::{execute, ProgressObserver};
use crate::model::{
    ActionStatus, ConflictPolicy, DateBasis, FolderFormat, ItemMode, OperationMode,
    OrganizeError, PlannedAction, Settings,
};
use crate::operation_log::write_log;
use crate::output::OutputFormatter;
use crate::planner::plan;
use crate::scanner::{scan, DATA_DIR_NAME};
use crate::undo::undo;
use clap::Parser;
use indicatif::ProgressBar;
use std::path::{Path, PathBuf};

/// Organize files and folders into date-based subdirectories.
#[derive(Parser, Debug)]
#[command(name = "datetidy", version)]
pub struct Cli {
    /// Source directory to organize.
    pub source: PathBuf,

    /// Target directory for date folders (defaults to the source directory).
    #[arg(short, long)]
    pub target: Option<PathBuf>,

    /// Descend into subdirectories.
    #[arg(short, long)]
    pub recursive: bool,

    /// Whether entries are moved or copied.
    #[arg(short, long, value_enum)]
    pub mode: Option<OperationMode>,

    /// Timestamp that decides which date folder an entry lands in.
    #[arg(long, value_enum)]
    pub date_basis: Option<DateBasis>,

    /// Date folder layout: flat (YYYY-MM-DD) or nested (YYYY/MM/DD).
    #[arg(long, value_enum)]
    pub format: Option<FolderFormat>,

    /// What to do when a target path is already taken.
    #[arg(long, value_enum)]
    pub on_conflict: Option<ConflictPolicy>,

    /// Preview the plan without touching the filesystem.
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Revert the previous run instead of organizing.
    #[arg(long)]
    pub undo: bool,

    /// Extension allow-list, comma separated (e.g. "jpg,png").
    #[arg(long, value_delimiter = ',')]
    pub ext: Vec<String>,

    /// Include hidden entries.
    #[arg(long)]
    pub include_hidden: bool,

    /// Minimum file size in bytes.
    #[arg(long)]
    pub min_size: Option<u64>,

    /// Maximum file size in bytes.
    #[arg(long)]
    pub max_size: Option<u64>,

    /// Which kinds of entries to organize.
    #[arg(long, value_enum)]
    pub items: Option<ItemMode>,

    /// Path to a configuration file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Path to the operation log; the undo state lives next to it.
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

/// Runs the CLI application.
///
/// This is the single entry point for the binary: it either organizes the
/// source directory or reverts the previous run, depending on the flags.
pub fn run(cli: Cli) -> Result<(), String> {
    let log_path = cli
        .log_file
        .clone()
        .unwrap_or_else(|| cli.source.join(DATA_DIR_NAME).join("operation.log"));

    if cli.undo {
        return run_undo(&log_path);
    }

    let settings = build_settings(&cli)?;
    run_organize(&settings, &log_path)
}

/// Builds run settings from the config file and command-line flags.
/// Precedence: flags over config over built-in defaults.
fn build_settings(cli: &Cli) -> Result<Settings, String> {
    let config = AppConfig::load(cli.config.as_deref())
        .map_err(|e| format!("Error loading configuration: {}", e))?;

    let mut settings = Settings::new(cli.source.clone(), cli.target.clone());
    config.apply_to(&mut settings);

    if let Some(mode) = cli.mode {
        settings.operation_mode = mode;
    }
    if let Some(basis) = cli.date_basis {
        settings.date_basis = basis;
    }
    if let Some(format) = cli.format {
        settings.folder_format = format;
    }
    if let Some(policy) = cli.on_conflict {
        settings.conflict_policy = policy;
    }
    if let Some(items) = cli.items {
        settings.item_mode = items;
    }
    if cli.recursive {
        settings.recursive = true;
    }
    if cli.include_hidden {
        settings.include_hidden = true;
    }
    if !cli.ext.is_empty() {
        settings.extensions = cli.ext.clone();
    }
    if cli.min_size.is_some() {
        settings.min_size_bytes = cli.min_size;
    }
    if cli.max_size.is_some() {
        settings.max_size_bytes = cli.max_size;
    }
    settings.dry_run = cli.dry_run;

    Ok(settings)
}

fn run_organize(settings: &Settings, log_path: &Path) -> Result<(), String> {
    OutputFormatter::info(&format!(
        "Organizing contents of: {}",
        settings.source_path.display()
    ));
    if settings.dry_run {
        OutputFormatter::dry_run_notice("No files will be modified.");
    }

    let files = scan(settings).map_err(|e| e.to_string())?;
    if files.is_empty() {
        OutputFormatter::plain("No entries found to organize.");
        return Ok(());
    }

    let actions = plan(&files, settings);

    let bar = OutputFormatter::create_progress_bar(actions.len() as u64);
    let mut observer = ProgressBarObserver { bar: bar.clone() };
    let executed = execute(actions, settings, &mut observer);
    bar.finish_and_clear();

    write_log(&executed, log_path, settings).map_err(|e| e.to_string())?;

    report_notes(&executed);
    OutputFormatter::run_summary(&executed);
    OutputFormatter::failure_details(&executed);

    if settings.dry_run {
        OutputFormatter::success("Dry run complete. No files were modified.");
        OutputFormatter::plain("Run again without --dry-run to execute the plan.");
    } else {
        OutputFormatter::success("Organization complete!");
        OutputFormatter::plain(&format!(
            "Use 'datetidy {} --undo' to revert this run.",
            settings.source_path.display()
        ));
    }
    Ok(())
}

fn run_undo(log_path: &Path) -> Result<(), String> {
    OutputFormatter::info("Undoing previous organization...");

    match undo(log_path) {
        Ok(actions) => {
            OutputFormatter::run_summary(&actions);
            OutputFormatter::failure_details(&actions);

            let failed = actions
                .iter()
                .filter(|a| a.status == ActionStatus::Failed)
                .count();
            if failed > 0 {
                OutputFormatter::warning(&format!(
                    "{} entr{} could not be restored; everything else was reverted.",
                    failed,
                    if failed == 1 { "y" } else { "ies" }
                ));
            } else {
                OutputFormatter::success("Undo complete!");
            }
            Ok(())
        }
        // Nothing to undo is a no-op with a message, not a failure.
        Err(OrganizeError::UndoStateMissing { .. }) => {
            OutputFormatter::warning("No previous run found; nothing to undo.");
            Ok(())
        }
        Err(e) => Err(format!("Error: {}", e)),
    }
}

/// Surfaces non-fatal planner notes (such as a date-basis fallback) that
/// were recorded on the actions.
fn report_notes(actions: &[PlannedAction]) {
    for action in actions {
        if action.status != ActionStatus::Skipped
            && let Some(note) = &action.note
        {
            OutputFormatter::warning(&format!("{}: {}", action.source_file.display(), note));
        }
    }
}

/// Drives the indicatif progress bar from the executor's notifications.
struct ProgressBarObserver {
    bar: ProgressBar,
}

impl ProgressObserver for ProgressBarObserver {
    fn action_completed(&mut self, _completed: usize, _total: usize, action: &PlannedAction) {
        if let Some(name) = action.source_file.file_name() {
            self.bar.set_message(name.to_string_lossy().to_string());
        }
        self.bar.inc(1);
    }
}
