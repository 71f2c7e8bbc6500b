//! datetidy - organize files and folders into date-based subdirectories
//!
//! This library provides the scan → plan → execute → log → undo pipeline:
//! enumerating candidate entries, deriving a date folder for each from its
//! filesystem timestamps, resolving naming conflicts deterministically,
//! executing move/copy batches with per-action error capture, and reversing
//! the most recent run from a persisted state snapshot.

pub mod cli;
pub mod config;
pub mod executor;
pub mod model;
pub mod operation_log;
pub mod output;
pub mod planner;
pub mod scanner;
pub mod undo;

pub use config::{AppConfig, ConfigError};
pub use executor::{NullObserver, ProgressObserver, execute};
pub use model::{
    ActionStatus, ConflictPolicy, DateBasis, FolderFormat, ItemMode, OperationMode,
    OrganizeError, OrganizeResult, PlannedAction, Settings,
};
pub use operation_log::{RunSnapshot, load_snapshot, write_log};
pub use planner::{build_target, plan, resolve_conflict, resolve_date};
pub use scanner::{DATA_DIR_NAME, scan};
pub use undo::undo;
