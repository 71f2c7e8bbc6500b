//! Core data model: run settings, planned actions, and the crate-wide error type.
//!
//! Every component of the scan → plan → execute → log → undo pipeline speaks
//! in terms of the types defined here. A `PlannedAction` is created by the
//! planner, mutated only by the executor (and later the undo engine), and
//! persisted verbatim into the operation log.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Whether entries are moved into the target tree or copied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum OperationMode {
    Move,
    Copy,
}

impl std::fmt::Display for OperationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OperationMode::Move => f.write_str("move"),
            OperationMode::Copy => f.write_str("copy"),
        }
    }
}

/// Which filesystem timestamp drives the date folder an entry lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum DateBasis {
    CreationTime,
    ModifiedTime,
}

/// Shape of the date subfolder under the target directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum FolderFormat {
    /// A single `YYYY-MM-DD` folder.
    Flat,
    /// Nested `YYYY/MM/DD` folders (three path segments).
    Nested,
}

/// Rule applied when a desired target path is already taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    /// Replace the existing entry at execute time.
    Overwrite,
    /// Leave both the source and the existing target untouched.
    Skip,
    /// Append an incrementing ` (N)` suffix until a free name is found.
    AutoRename,
}

/// Which kinds of directory entries are candidates for organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ItemMode {
    FilesAndFolders,
    FilesOnly,
    FoldersOnly,
}

/// Immutable per-run settings for one organize operation.
///
/// Constructed by the caller (CLI, or any other collaborator); the core does
/// not re-validate beyond what the scanner needs. `target_path` defaults to
/// `source_path` when the caller leaves it unset.
#[derive(Debug, Clone)]
pub struct Settings {
    pub source_path: PathBuf,
    pub target_path: PathBuf,
    pub recursive: bool,
    pub operation_mode: OperationMode,
    pub date_basis: DateBasis,
    pub folder_format: FolderFormat,
    pub conflict_policy: ConflictPolicy,
    pub dry_run: bool,
    /// Extension allow-list, e.g. `["txt", ".jpg"]`. Empty means no filter.
    pub extensions: Vec<String>,
    pub include_hidden: bool,
    pub min_size_bytes: Option<u64>,
    pub max_size_bytes: Option<u64>,
    pub item_mode: ItemMode,
    /// Glob patterns excluding entries by name or source-relative path.
    pub exclude_patterns: Vec<String>,
}

impl Settings {
    /// Creates settings for a source directory with the default policies.
    ///
    /// When `target` is `None` the entries are organized in place, i.e. the
    /// date folders are created under the source directory itself.
    pub fn new(source: PathBuf, target: Option<PathBuf>) -> Self {
        let target_path = target.unwrap_or_else(|| source.clone());
        Self {
            source_path: source,
            target_path,
            recursive: false,
            operation_mode: OperationMode::Move,
            date_basis: DateBasis::CreationTime,
            folder_format: FolderFormat::Flat,
            conflict_policy: ConflictPolicy::AutoRename,
            dry_run: false,
            extensions: Vec::new(),
            include_hidden: false,
            min_size_bytes: None,
            max_size_bytes: None,
            item_mode: ItemMode::FilesAndFolders,
            exclude_patterns: Vec::new(),
        }
    }

    /// True when an extension or size filter is active. Folder-level actions
    /// are disabled in that case so a moved folder cannot smuggle filtered
    /// files along with it.
    pub fn file_filter_active(&self) -> bool {
        !self.extensions.is_empty()
            || self.min_size_bytes.is_some()
            || self.max_size_bytes.is_some()
    }
}

/// Lifecycle state of a planned action.
///
/// The planner emits `Planned` or `Skipped`; the executor advances `Planned`
/// to `Success` or `Failed` (never back); the undo engine marks reversed
/// actions `Undone`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    Planned,
    Skipped,
    Success,
    Failed,
    Undone,
}

impl std::fmt::Display for ActionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ActionStatus::Planned => "planned",
            ActionStatus::Skipped => "skipped",
            ActionStatus::Success => "success",
            ActionStatus::Failed => "failed",
            ActionStatus::Undone => "undone",
        };
        f.write_str(label)
    }
}

/// One proposed filesystem operation with its not-yet-executed (or final)
/// outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannedAction {
    /// The entry as found under the source directory.
    pub source_file: PathBuf,
    /// Final resolved destination; `None` when the action was skipped or
    /// planning failed before a target could be assigned.
    pub target_file: Option<PathBuf>,
    pub status: ActionStatus,
    /// Present iff `status == Failed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Non-fatal remark, e.g. a date-basis fallback. Flows into the text log.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl PlannedAction {
    /// Creates an action in the `Planned` state with a resolved target.
    pub fn planned(source: PathBuf, target: PathBuf) -> Self {
        Self {
            source_file: source,
            target_file: Some(target),
            status: ActionStatus::Planned,
            error_message: None,
            note: None,
        }
    }

    /// Creates an action skipped by the conflict policy. Per the data model
    /// a skipped action carries no target.
    pub fn skipped(source: PathBuf) -> Self {
        Self {
            source_file: source,
            target_file: None,
            status: ActionStatus::Skipped,
            error_message: None,
            note: None,
        }
    }

    /// Creates an action that failed during planning.
    pub fn failed(source: PathBuf, message: String) -> Self {
        Self {
            source_file: source,
            target_file: None,
            status: ActionStatus::Failed,
            error_message: Some(message),
            note: None,
        }
    }
}

/// Errors raised by the organize pipeline.
#[derive(Debug)]
pub enum OrganizeError {
    /// The filesystem does not expose the requested timestamp for this entry.
    MetadataUnavailable {
        path: PathBuf,
        basis: DateBasis,
        source: std::io::Error,
    },
    /// No collision-free target name could be derived for this entry.
    ConflictUnresolvable { path: PathBuf },
    /// A move/copy/delete against the filesystem failed.
    FilesystemOperationFailed {
        source_path: PathBuf,
        destination: PathBuf,
        source: std::io::Error,
    },
    /// The source path is missing or not a directory.
    InvalidSourcePath {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The target directory is nested inside the source directory.
    TargetInsideSource { source_path: PathBuf, target: PathBuf },
    /// An exclude glob pattern failed to compile.
    InvalidPattern { pattern: String },
    /// The text log or state snapshot could not be written.
    LogWriteFailed { path: PathBuf, source: std::io::Error },
    /// The state snapshot could not be read.
    LogReadFailed { path: PathBuf, source: std::io::Error },
    /// The state snapshot exists but does not parse.
    InvalidStateFormat { reason: String },
    /// No state snapshot exists, so there is nothing to undo.
    UndoStateMissing { path: PathBuf },
}

impl std::fmt::Display for OrganizeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MetadataUnavailable { path, basis, source } => {
                let basis = match basis {
                    DateBasis::CreationTime => "creation time",
                    DateBasis::ModifiedTime => "modified time",
                };
                write!(f, "{} unavailable for {}: {}", basis, path.display(), source)
            }
            Self::ConflictUnresolvable { path } => {
                write!(f, "Cannot derive a conflict-free name for {}", path.display())
            }
            Self::FilesystemOperationFailed {
                source_path,
                destination,
                source,
            } => {
                write!(
                    f,
                    "Failed to transfer {} to {}: {}",
                    source_path.display(),
                    destination.display(),
                    source
                )
            }
            Self::InvalidSourcePath { path, source } => {
                write!(f, "Invalid source path {}: {}", path.display(), source)
            }
            Self::TargetInsideSource { source_path, target } => {
                write!(
                    f,
                    "Target directory {} is inside source directory {}",
                    target.display(),
                    source_path.display()
                )
            }
            Self::InvalidPattern { pattern } => {
                write!(f, "Invalid exclude pattern '{}'", pattern)
            }
            Self::LogWriteFailed { path, source } => {
                write!(f, "Failed to write log {}: {}", path.display(), source)
            }
            Self::LogReadFailed { path, source } => {
                write!(f, "Failed to read state log {}: {}", path.display(), source)
            }
            Self::InvalidStateFormat { reason } => {
                write!(f, "Invalid state log format: {}", reason)
            }
            Self::UndoStateMissing { path } => {
                write!(
                    f,
                    "No state log found at {}; nothing to undo",
                    path.display()
                )
            }
        }
    }
}

impl std::error::Error for OrganizeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::MetadataUnavailable { source, .. }
            | Self::FilesystemOperationFailed { source, .. }
            | Self::InvalidSourcePath { source, .. }
            | Self::LogWriteFailed { source, .. }
            | Self::LogReadFailed { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Result type for organize operations.
pub type OrganizeResult<T> = Result<T, OrganizeError>;

/// Returns true if `child` is `parent` itself or nested under it.
///
/// Both paths are canonicalized when possible; a target that does not exist
/// yet is compared as given.
pub fn is_subdirectory(parent: &Path, child: &Path) -> bool {
    let parent = parent.canonicalize().unwrap_or_else(|_| parent.to_path_buf());
    let child = child.canonicalize().unwrap_or_else(|_| child.to_path_buf());
    child.starts_with(&parent)
}
