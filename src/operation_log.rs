//! Persistence of executed runs: text log and structured state snapshot.
//!
//! Two artifacts are written after every execution. The text log is
//! append-only and human-readable, one `timestamp | LEVEL | message` line
//! per action, accumulating run-over-run history. The state snapshot is a
//! JSON document describing only the current run and is overwritten on each
//! non-dry-run execution; it is the sole input to the undo engine, which is
//! why it deliberately holds no history beyond one run. Dry runs append to
//! the text log but never touch the snapshot, so the last real run stays
//! undoable.

use crate::model::{
    ActionStatus, OperationMode, OrganizeError, OrganizeResult, PlannedAction, Settings,
};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Structured record of one run, persisted as the single undo slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSnapshot {
    pub created_at: String,
    pub operation_mode: OperationMode,
    pub dry_run: bool,
    /// Set by the undo engine once the run has been reversed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub undone_at: Option<String>,
    pub actions: Vec<PlannedAction>,
}

/// Companion state-snapshot path for a text log path:
/// `operation.log` → `operation.state.json`.
pub fn state_file_for(log_path: &Path) -> PathBuf {
    log_path.with_extension("state.json")
}

/// Writes both log artifacts for an executed (or dry-run) action list.
///
/// # Errors
///
/// Failing to write either artifact is structural (`LogWriteFailed`); the
/// caller should surface it as a whole-run failure since undo depends on it.
pub fn write_log(
    actions: &[PlannedAction],
    log_path: &Path,
    settings: &Settings,
) -> OrganizeResult<()> {
    if let Some(parent) = log_path.parent() {
        fs::create_dir_all(parent).map_err(|e| OrganizeError::LogWriteFailed {
            path: log_path.to_path_buf(),
            source: e,
        })?;
    }

    if !settings.dry_run {
        let snapshot = RunSnapshot {
            created_at: timestamp(),
            operation_mode: settings.operation_mode,
            dry_run: settings.dry_run,
            undone_at: None,
            actions: actions.to_vec(),
        };
        save_snapshot(&snapshot, log_path)?;
    }

    let mut lines = Vec::with_capacity(actions.len() + 3);
    lines.push(log_line("INFO", "Operation run started"));
    lines.push(log_line(
        "INFO",
        &format!(
            "Mode={} DryRun={} Total={}",
            settings.operation_mode,
            settings.dry_run,
            actions.len()
        ),
    ));
    for action in actions {
        lines.push(action_line(action, "->"));
    }
    lines.push(log_line("INFO", "Operation run finished"));

    append_lines(log_path, &lines)
}

/// Appends the undo run's outcome to the text log.
pub(crate) fn append_undo_log(
    log_path: &Path,
    actions: &[PlannedAction],
    mode: OperationMode,
) -> OrganizeResult<()> {
    let mut lines = Vec::with_capacity(actions.len() + 3);
    lines.push(log_line("INFO", "Undo run started"));
    lines.push(log_line(
        "INFO",
        &format!("Mode={} Total={}", mode, actions.len()),
    ));
    for action in actions {
        lines.push(action_line(action, "<-"));
    }
    lines.push(log_line("INFO", "Undo run finished"));

    append_lines(log_path, &lines)
}

/// Loads the state snapshot for the given text log path.
///
/// # Errors
///
/// `UndoStateMissing` when no snapshot exists, `LogReadFailed` when it
/// cannot be read, `InvalidStateFormat` when it does not parse.
pub fn load_snapshot(log_path: &Path) -> OrganizeResult<RunSnapshot> {
    let state_path = state_file_for(log_path);
    if !state_path.exists() {
        return Err(OrganizeError::UndoStateMissing { path: state_path });
    }

    let content = fs::read_to_string(&state_path).map_err(|e| OrganizeError::LogReadFailed {
        path: state_path.clone(),
        source: e,
    })?;

    serde_json::from_str(&content).map_err(|e| OrganizeError::InvalidStateFormat {
        reason: e.to_string(),
    })
}

/// Overwrites the state snapshot for the given text log path.
pub(crate) fn save_snapshot(snapshot: &RunSnapshot, log_path: &Path) -> OrganizeResult<()> {
    let state_path = state_file_for(log_path);
    let json = serde_json::to_string_pretty(snapshot).map_err(|e| {
        OrganizeError::InvalidStateFormat {
            reason: format!("JSON serialization failed: {}", e),
        }
    })?;

    fs::write(&state_path, json).map_err(|e| OrganizeError::LogWriteFailed {
        path: state_path,
        source: e,
    })
}

fn append_lines(log_path: &Path, lines: &[String]) -> OrganizeResult<()> {
    let write_failed = |e: std::io::Error| OrganizeError::LogWriteFailed {
        path: log_path.to_path_buf(),
        source: e,
    };

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .map_err(write_failed)?;
    file.write_all((lines.join("\n") + "\n").as_bytes())
        .map_err(write_failed)
}

fn action_line(action: &PlannedAction, arrow: &str) -> String {
    let target = action
        .target_file
        .as_ref()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "-".to_string());
    let mut message = format!(
        "{}: {} {} {}",
        action.status,
        action.source_file.display(),
        arrow,
        target
    );
    if let Some(note) = &action.note {
        message = format!("{} | note={}", message, note);
    }
    if let Some(error) = &action.error_message {
        message = format!("{} | error={}", message, error);
    }

    let level = if action.status == ActionStatus::Failed {
        "ERROR"
    } else {
        "INFO"
    };
    log_line(level, &message)
}

fn log_line(level: &str, message: &str) -> String {
    format!("{} | {} | {}", timestamp(), level, message)
}

fn timestamp() -> String {
    Local::now().format("%Y-%m-%dT%H:%M:%S").to_string()
}
