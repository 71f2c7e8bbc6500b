//! Execution of planned actions against the filesystem.
//!
//! The executor owns the action list for the duration of the call and hands
//! it back with final statuses in the original order. A single failing
//! action never halts the batch. Progress is reported through an injected
//! observer with one notification per completed action, which keeps the
//! executor free of any UI technology and trivially testable.

use crate::model::{
    ActionStatus, ConflictPolicy, OperationMode, OrganizeError, OrganizeResult, PlannedAction,
    Settings,
};
use std::fs;
use std::path::Path;

/// Receives a notification after each action completes, with the running
/// count so the caller can render progress or compute an ETA. Called for
/// every action, including skipped ones.
pub trait ProgressObserver {
    fn action_completed(&mut self, completed: usize, total: usize, action: &PlannedAction);
}

/// Observer that discards all notifications.
pub struct NullObserver;

impl ProgressObserver for NullObserver {
    fn action_completed(&mut self, _completed: usize, _total: usize, _action: &PlannedAction) {}
}

/// Performs the planned actions, or simulates them in dry-run mode.
///
/// Actions in the `Planned` state are moved or copied per the operation
/// mode; in dry-run mode they are left at `Planned` and the filesystem is
/// not touched at all. Filesystem errors are captured per action as
/// `Failed` with an error message. Skipped and already-failed actions pass
/// through unchanged but still trigger the progress notification.
pub fn execute(
    mut actions: Vec<PlannedAction>,
    settings: &Settings,
    observer: &mut dyn ProgressObserver,
) -> Vec<PlannedAction> {
    let total = actions.len();

    for (index, action) in actions.iter_mut().enumerate() {
        if action.status == ActionStatus::Planned && !settings.dry_run {
            perform(action, settings);
        }
        observer.action_completed(index + 1, total, action);
    }

    actions
}

fn perform(action: &mut PlannedAction, settings: &Settings) {
    let Some(target) = action.target_file.clone() else {
        action.status = ActionStatus::Failed;
        action.error_message = Some("planned action has no target path".to_string());
        return;
    };

    let result = match settings.operation_mode {
        OperationMode::Move => {
            transfer_move(&action.source_file, &target, settings.conflict_policy)
        }
        OperationMode::Copy => {
            transfer_copy(&action.source_file, &target, settings.conflict_policy)
        }
    };

    match result {
        Ok(()) => action.status = ActionStatus::Success,
        Err(e) => {
            action.status = ActionStatus::Failed;
            action.error_message = Some(e.to_string());
        }
    }
}

/// Moves an entry into place, falling back to copy-and-delete when a plain
/// rename fails (for instance across filesystems).
fn transfer_move(source: &Path, target: &Path, policy: ConflictPolicy) -> OrganizeResult<()> {
    prepare_destination(source, target, policy)?;
    move_entry(source, target).map_err(|e| fs_failure(source, target, e))
}

/// Copies an entry into place; the source is left untouched.
fn transfer_copy(source: &Path, target: &Path, policy: ConflictPolicy) -> OrganizeResult<()> {
    prepare_destination(source, target, policy)?;

    if source.is_dir() {
        copy_dir_recursive(source, target).map_err(|e| fs_failure(source, target, e))?;
    } else {
        fs::copy(source, target).map_err(|e| fs_failure(source, target, e))?;
    }
    Ok(())
}

/// Creates the date folder and, under the overwrite policy, removes any
/// existing entry at the target. Removing first avoids merge ambiguity when
/// the old and new entries are directories.
fn prepare_destination(
    source: &Path,
    target: &Path,
    policy: ConflictPolicy,
) -> OrganizeResult<()> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(|e| fs_failure(source, target, e))?;
    }

    if policy == ConflictPolicy::Overwrite && target.exists() {
        remove_entry(target).map_err(|e| fs_failure(source, target, e))?;
    }

    Ok(())
}

/// Relocates a file or directory, preferring rename and falling back to a
/// copy followed by deletion of the original. Shared with the undo engine.
pub(crate) fn move_entry(source: &Path, target: &Path) -> std::io::Result<()> {
    if fs::rename(source, target).is_ok() {
        return Ok(());
    }

    if source.is_dir() {
        copy_dir_recursive(source, target)?;
        fs::remove_dir_all(source)
    } else {
        fs::copy(source, target)?;
        fs::remove_file(source)
    }
}

/// Deletes a file or directory tree. Shared with the undo engine.
pub(crate) fn remove_entry(path: &Path) -> std::io::Result<()> {
    if path.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}

fn copy_dir_recursive(source: &Path, target: &Path) -> std::io::Result<()> {
    fs::create_dir_all(target)?;
    for entry in fs::read_dir(source)? {
        let entry = entry?;
        let destination = target.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir_recursive(&entry.path(), &destination)?;
        } else {
            fs::copy(entry.path(), &destination)?;
        }
    }
    Ok(())
}

fn fs_failure(source: &Path, target: &Path, error: std::io::Error) -> OrganizeError {
    OrganizeError::FilesystemOperationFailed {
        source_path: source.to_path_buf(),
        destination: target.to_path_buf(),
        source: error,
    }
}
