//! Planning: date resolution, target building, conflict resolution.
//!
//! The planner combines the scanner's candidate list with the configured
//! policies into an ordered list of `PlannedAction`s without touching the
//! filesystem. Planning is resilient: a bad entry becomes a failed action
//! with an error message, never an aborted batch.

use crate::model::{
    ConflictPolicy, DateBasis, FolderFormat, OrganizeError, OrganizeResult, PlannedAction,
    Settings,
};
use chrono::{DateTime, Local};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Derives the organizing date for an entry from filesystem metadata.
///
/// # Errors
///
/// Returns `MetadataUnavailable` when the entry cannot be stat'ed or the
/// filesystem does not expose the requested timestamp (creation time is not
/// supported everywhere). Callers are expected to fall back to the modified
/// time rather than abort the run.
pub fn resolve_date(path: &Path, basis: DateBasis) -> OrganizeResult<DateTime<Local>> {
    let unavailable = |source: std::io::Error| OrganizeError::MetadataUnavailable {
        path: path.to_path_buf(),
        basis,
        source,
    };

    let metadata = fs::metadata(path).map_err(unavailable)?;
    let timestamp = match basis {
        DateBasis::CreationTime => metadata.created(),
        DateBasis::ModifiedTime => metadata.modified(),
    }
    .map_err(unavailable)?;

    Ok(DateTime::<Local>::from(timestamp))
}

/// Maps an entry and its resolved date to a destination path.
///
/// Pure with respect to the filesystem: the result is
/// `target_path / <date folder(s)> / <entry name>` and existence is not
/// checked here. Same inputs always yield the same output.
pub fn build_target(
    path: &Path,
    date: DateTime<Local>,
    settings: &Settings,
) -> OrganizeResult<PathBuf> {
    let date_dir = match settings.folder_format {
        FolderFormat::Flat => settings
            .target_path
            .join(date.format("%Y-%m-%d").to_string()),
        FolderFormat::Nested => settings
            .target_path
            .join(date.format("%Y").to_string())
            .join(date.format("%m").to_string())
            .join(date.format("%d").to_string()),
    };

    let name = path
        .file_name()
        .ok_or_else(|| OrganizeError::FilesystemOperationFailed {
            source_path: path.to_path_buf(),
            destination: date_dir.clone(),
            source: std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "entry has no file name component",
            ),
        })?;

    Ok(date_dir.join(name))
}

/// Decides the final destination for a desired target path.
///
/// A target counts as occupied when it exists on disk or has already been
/// claimed by an earlier action in the same planning pass; the claimed set
/// is what keeps two actions in one plan from colliding before any file has
/// moved. Returns `None` when the policy says to skip the entry.
pub fn resolve_conflict(
    target: &Path,
    policy: ConflictPolicy,
    claimed: &HashSet<PathBuf>,
) -> OrganizeResult<Option<PathBuf>> {
    let occupied = target.exists() || claimed.contains(target);
    if !occupied {
        return Ok(Some(target.to_path_buf()));
    }

    match policy {
        ConflictPolicy::Overwrite => Ok(Some(target.to_path_buf())),
        ConflictPolicy::Skip => Ok(None),
        ConflictPolicy::AutoRename => auto_rename(target, claimed).map(Some),
    }
}

/// Appends ` (1)`, ` (2)`, … before the extension until an unoccupied,
/// unclaimed candidate is found. The search is unbounded, so with a valid
/// file name it always terminates.
fn auto_rename(target: &Path, claimed: &HashSet<PathBuf>) -> OrganizeResult<PathBuf> {
    let parent = target.parent().unwrap_or_else(|| Path::new(""));
    let stem = target
        .file_stem()
        .ok_or_else(|| OrganizeError::ConflictUnresolvable {
            path: target.to_path_buf(),
        })?
        .to_string_lossy()
        .to_string();
    let extension = target.extension().map(|ext| ext.to_string_lossy().to_string());

    let mut index: u64 = 1;
    loop {
        let candidate_name = match &extension {
            Some(ext) => format!("{} ({}).{}", stem, index, ext),
            None => format!("{} ({})", stem, index),
        };
        let candidate = parent.join(candidate_name);
        if !candidate.exists() && !claimed.contains(&candidate) {
            return Ok(candidate);
        }
        index += 1;
    }
}

/// Builds the full action plan for the scanned entries, in scanner order.
///
/// Each entry flows through date resolution, target building, and conflict
/// resolution; per-entry failures become `Failed` actions with an error
/// message and do not block the remaining entries. When the creation time is
/// unavailable the planner falls back to the modified time and records a
/// note on the action.
pub fn plan(files: &[PathBuf], settings: &Settings) -> Vec<PlannedAction> {
    let mut claimed: HashSet<PathBuf> = HashSet::new();
    files
        .iter()
        .map(|path| plan_entry(path, settings, &mut claimed))
        .collect()
}

fn plan_entry(path: &Path, settings: &Settings, claimed: &mut HashSet<PathBuf>) -> PlannedAction {
    let (date, note) = match resolve_date(path, settings.date_basis) {
        Ok(date) => (date, None),
        Err(OrganizeError::MetadataUnavailable { .. })
            if settings.date_basis == DateBasis::CreationTime =>
        {
            match resolve_date(path, DateBasis::ModifiedTime) {
                Ok(date) => (
                    date,
                    Some("creation time unavailable; used modified time".to_string()),
                ),
                Err(e) => return PlannedAction::failed(path.to_path_buf(), e.to_string()),
            }
        }
        Err(e) => return PlannedAction::failed(path.to_path_buf(), e.to_string()),
    };

    let target = match build_target(path, date, settings) {
        Ok(target) => target,
        Err(e) => return PlannedAction::failed(path.to_path_buf(), e.to_string()),
    };

    match resolve_conflict(&target, settings.conflict_policy, claimed) {
        Ok(Some(resolved)) => {
            claimed.insert(resolved.clone());
            let mut action = PlannedAction::planned(path.to_path_buf(), resolved);
            action.note = note;
            action
        }
        Ok(None) => {
            let mut action = PlannedAction::skipped(path.to_path_buf());
            action.note = Some("target already exists; skipped by conflict policy".to_string());
            action
        }
        Err(e) => PlannedAction::failed(path.to_path_buf(), e.to_string()),
    }
}
