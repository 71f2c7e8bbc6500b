//! Undo of the most recent non-dry-run execution.
//!
//! The undo engine consumes the state snapshot written by the operation
//! logger and reverses every recorded success: moved entries are relocated
//! back to their original paths, copied entries are deleted (the original
//! was never removed). Actions are processed in reverse of execution order,
//! and date folders left empty by the reversal are removed innermost-first.
//! Undo restores everything it safely can; an original location occupied by
//! an unrelated entry is reported as a per-entry failure rather than
//! clobbered.

use crate::executor::{move_entry, remove_entry};
use crate::model::{ActionStatus, OperationMode, OrganizeResult, PlannedAction};
use crate::operation_log;
use chrono::Local;
use regex::Regex;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

// Date folder names produced by the target builder: flat "YYYY-MM-DD" or the
// "YYYY"/"MM"/"DD" segments of the nested format. Cleanup only ever removes
// directories matching these.
static DATE_DIR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("Invalid date dir pattern"));
static DATE_SEGMENT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{2}$|^\d{4}$").expect("Invalid date segment pattern"));

/// Reverses the last recorded run.
///
/// Returns the processed actions in the order they were undone (reverse of
/// execution order). Successfully reversed actions are marked `Undone`;
/// entries that could not be restored are marked `Failed` with an error
/// message, and the rest of the batch still proceeds. The snapshot is
/// written back with the final statuses, so running undo again is a no-op.
///
/// # Errors
///
/// `UndoStateMissing` when no snapshot exists, `LogReadFailed` /
/// `InvalidStateFormat` when it cannot be loaded, `LogWriteFailed` when the
/// outcome cannot be persisted.
pub fn undo(log_path: &Path) -> OrganizeResult<Vec<PlannedAction>> {
    let mut snapshot = operation_log::load_snapshot(log_path)?;
    let mode = snapshot.operation_mode;

    let mut undone: Vec<PlannedAction> = Vec::with_capacity(snapshot.actions.len());
    for action in snapshot.actions.iter().rev() {
        let mut action = action.clone();
        if action.status == ActionStatus::Success {
            revert(&mut action, mode);
        }
        undone.push(action);
    }

    snapshot.actions = undone.iter().rev().cloned().collect();
    snapshot.undone_at = Some(Local::now().format("%Y-%m-%dT%H:%M:%S").to_string());
    operation_log::save_snapshot(&snapshot, log_path)?;
    operation_log::append_undo_log(log_path, &undone, mode)?;

    Ok(undone)
}

/// Reverses a single recorded success, updating its status in place.
fn revert(action: &mut PlannedAction, mode: OperationMode) {
    let Some(target) = action.target_file.clone() else {
        action.status = ActionStatus::Failed;
        action.error_message = Some("recorded success has no target path".to_string());
        return;
    };

    match mode {
        OperationMode::Move => {
            if !target.exists() {
                // Deleted or relocated externally since the run; the date
                // folder may still need cleaning.
                action.status = ActionStatus::Undone;
                action.note = Some("target no longer present; nothing to restore".to_string());
            } else if action.source_file.exists() {
                action.status = ActionStatus::Failed;
                action.error_message =
                    Some("original location already occupied; not restored".to_string());
                return;
            } else {
                let restore = action
                    .source_file
                    .parent()
                    .map(fs::create_dir_all)
                    .unwrap_or(Ok(()))
                    .and_then(|_| move_entry(&target, &action.source_file));
                match restore {
                    Ok(()) => action.status = ActionStatus::Undone,
                    Err(e) => {
                        action.status = ActionStatus::Failed;
                        action.error_message = Some(format!("failed to restore: {}", e));
                        return;
                    }
                }
            }
        }
        OperationMode::Copy => {
            if target.exists()
                && let Err(e) = remove_entry(&target)
            {
                action.status = ActionStatus::Failed;
                action.error_message = Some(format!("failed to remove copy: {}", e));
                return;
            }
            action.status = ActionStatus::Undone;
        }
    }

    if let Some(parent) = target.parent() {
        cleanup_empty_date_dirs(parent);
    }
}

/// Removes date-named folders that are now empty, ascending from the
/// innermost one and stopping at the first non-empty or non-date-named
/// ancestor. Only folders this tool could have created are ever touched.
fn cleanup_empty_date_dirs(start_dir: &Path) {
    let mut current = start_dir.to_path_buf();
    loop {
        if !current.is_dir() || !is_date_like_dir_name(&current) || !is_empty_dir(&current) {
            break;
        }
        if fs::remove_dir(&current).is_err() {
            break;
        }
        match current.parent() {
            Some(parent) => current = parent.to_path_buf(),
            None => break,
        }
    }
}

fn is_date_like_dir_name(path: &Path) -> bool {
    path.file_name()
        .map(|name| {
            let name = name.to_string_lossy();
            DATE_DIR_PATTERN.is_match(&name) || DATE_SEGMENT_PATTERN.is_match(&name)
        })
        .unwrap_or(false)
}

fn is_empty_dir(path: &Path) -> bool {
    fs::read_dir(path)
        .map(|mut entries| entries.next().is_none())
        .unwrap_or(false)
}
