//! Candidate enumeration for the organize pipeline.
//!
//! The scanner turns a source directory plus filter settings into a
//! deterministic, lexicographically ordered list of paths for the planner.
//! Filters apply in a fixed precedence: item-type selector, then hidden-entry
//! exclusion, then the extension allow-list, then size bounds. Whenever an
//! extension or size filter is active, folder-level entries are dropped
//! entirely so a wholesale folder move cannot bypass file-level filters on
//! its contents.

use crate::model::{is_subdirectory, ItemMode, OrganizeError, OrganizeResult, Settings};
use glob::Pattern;
use std::path::{Path, PathBuf};

/// Name of the application's own runtime-data directory. Entries under a
/// directory with this name are never organized, which keeps the operation
/// log and state snapshot out of their own batches.
pub const DATA_DIR_NAME: &str = "datetidy_data";

/// Enumerates candidate entries under the source directory per the settings.
///
/// Returns paths directly under `source_path`, descending into
/// subdirectories only when `recursive` is set. When folders are eligible, a
/// selected folder's descendants are suppressed so nothing is moved twice.
/// The result is sorted by path, so repeated scans of an unchanged directory
/// yield identical lists.
///
/// # Errors
///
/// Returns `InvalidSourcePath` if the source is missing or not a directory,
/// `TargetInsideSource` if the target directory is nested under the source,
/// and `InvalidPattern` if an exclude glob does not compile.
pub fn scan(settings: &Settings) -> OrganizeResult<Vec<PathBuf>> {
    let source = &settings.source_path;
    if !source.is_dir() {
        return Err(OrganizeError::InvalidSourcePath {
            path: source.clone(),
            source: std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "source path is not a directory",
            ),
        });
    }

    let same_root = paths_refer_to_same(source, &settings.target_path);
    if !same_root && is_subdirectory(source, &settings.target_path) {
        return Err(OrganizeError::TargetInsideSource {
            source_path: source.clone(),
            target: settings.target_path.clone(),
        });
    }

    let excludes = compile_excludes(&settings.exclude_patterns)?;
    let protected = protected_paths();

    let escaped = Pattern::escape(&source.to_string_lossy());
    let pattern = if settings.recursive {
        format!("{}/**/*", escaped)
    } else {
        format!("{}/*", escaped)
    };
    let entries = glob::glob(&pattern).map_err(|_| OrganizeError::InvalidPattern {
        pattern: pattern.clone(),
    })?;

    let candidates: Vec<PathBuf> = entries
        .flatten()
        .filter(|path| path != source)
        .filter(|path| allowed_by_runtime_exclusions(path, &protected))
        .filter(|path| !matches_excludes(path, source, &excludes))
        .collect();

    let mut selected = select_by_item_mode(&candidates, settings);
    selected.sort();
    Ok(selected)
}

/// Applies the item-type selector and the per-item filter chain.
fn select_by_item_mode(candidates: &[PathBuf], settings: &Settings) -> Vec<PathBuf> {
    // Extension/size filters imply files-only scanning: a directory-level
    // action would carry filtered-out files along inside the directory.
    if settings.item_mode == ItemMode::FilesOnly || settings.file_filter_active() {
        return candidates
            .iter()
            .filter(|path| path.is_file())
            .filter(|path| allowed_by_hidden_filter(path, settings))
            .filter(|path| file_allowed_by_filters(path, settings))
            .cloned()
            .collect();
    }

    if settings.item_mode == ItemMode::FoldersOnly {
        return dedup_nested_directories(candidates, settings);
    }

    // Files and folders: selected directories win over their own contents.
    let directories = dedup_nested_directories(candidates, settings);
    let mut selected = directories.clone();
    for path in candidates {
        if !path.is_file() {
            continue;
        }
        if !allowed_by_hidden_filter(path, settings) {
            continue;
        }
        if directories.iter().any(|dir| path.starts_with(dir)) {
            continue;
        }
        selected.push(path.clone());
    }
    selected
}

/// Returns eligible directories with nested duplicates removed: once a
/// directory is selected, none of its descendants are.
fn dedup_nested_directories(candidates: &[PathBuf], settings: &Settings) -> Vec<PathBuf> {
    let mut directories: Vec<&PathBuf> = candidates
        .iter()
        .filter(|path| path.is_dir())
        .filter(|path| allowed_by_hidden_filter(path, settings))
        .collect();
    directories.sort_by_key(|path| path.components().count());

    let mut selected: Vec<PathBuf> = Vec::new();
    for directory in directories {
        let nested = selected
            .iter()
            .any(|chosen| directory.starts_with(chosen) && directory != chosen);
        if !nested {
            selected.push(directory.clone());
        }
    }
    selected
}

fn allowed_by_hidden_filter(path: &Path, settings: &Settings) -> bool {
    if settings.include_hidden {
        return true;
    }
    !is_hidden(path)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().starts_with('.'))
        .unwrap_or(false)
}

/// Extension allow-list and size bounds, files only.
fn file_allowed_by_filters(path: &Path, settings: &Settings) -> bool {
    if !settings.extensions.is_empty() {
        let allowed = normalize_extensions(&settings.extensions);
        let extension = path
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()));
        match extension {
            Some(ext) if allowed.contains(&ext) => {}
            _ => return false,
        }
    }

    if settings.min_size_bytes.is_some() || settings.max_size_bytes.is_some() {
        let Ok(metadata) = path.metadata() else {
            return false;
        };
        let size = metadata.len();
        if let Some(min) = settings.min_size_bytes
            && size < min
        {
            return false;
        }
        if let Some(max) = settings.max_size_bytes
            && size > max
        {
            return false;
        }
    }

    true
}

/// Normalizes extension filters to lowercase dotted form, so "JPG", ".jpg"
/// and "jpg" all mean the same thing.
fn normalize_extensions(raw: &[String]) -> Vec<String> {
    raw.iter()
        .map(|ext| ext.trim().to_lowercase())
        .filter(|ext| !ext.is_empty())
        .map(|ext| {
            if ext.starts_with('.') {
                ext
            } else {
                format!(".{}", ext)
            }
        })
        .collect()
}

fn compile_excludes(patterns: &[String]) -> OrganizeResult<Vec<Pattern>> {
    patterns
        .iter()
        .map(|pattern| {
            Pattern::new(pattern).map_err(|_| OrganizeError::InvalidPattern {
                pattern: pattern.clone(),
            })
        })
        .collect()
}

/// A pattern excludes an entry when it matches either the bare name or the
/// path relative to the source directory.
fn matches_excludes(path: &Path, source: &Path, excludes: &[Pattern]) -> bool {
    if excludes.is_empty() {
        return false;
    }
    let relative = path.strip_prefix(source).unwrap_or(path);
    excludes.iter().any(|pattern| {
        pattern.matches_path(relative)
            || path
                .file_name()
                .map(|name| pattern.matches(&name.to_string_lossy()))
                .unwrap_or(false)
    })
}

/// Paths the scanner must never hand to the planner: anything inside the
/// runtime-data directory and the currently running executable.
fn protected_paths() -> Vec<PathBuf> {
    let mut protected = Vec::new();
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        protected.push(resolved);
    }
    protected
}

fn allowed_by_runtime_exclusions(path: &Path, protected: &[PathBuf]) -> bool {
    let in_data_dir = path
        .components()
        .any(|component| component.as_os_str() == DATA_DIR_NAME);
    if in_data_dir {
        return false;
    }

    let resolved = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    !protected.contains(&resolved)
}

fn paths_refer_to_same(a: &Path, b: &Path) -> bool {
    let a = a.canonicalize().unwrap_or_else(|_| a.to_path_buf());
    let b = b.canonicalize().unwrap_or_else(|_| b.to_path_buf());
    a == b
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn settings_for(source: &Path, target: &Path) -> Settings {
        Settings::new(source.to_path_buf(), Some(target.to_path_buf()))
    }

    fn make_dirs(root: &Path) -> (PathBuf, PathBuf) {
        let source = root.join("source");
        let target = root.join("target");
        fs::create_dir(&source).expect("Failed to create source");
        fs::create_dir(&target).expect("Failed to create target");
        (source, target)
    }

    #[test]
    fn test_scan_rejects_missing_source() {
        let settings = Settings::new(PathBuf::from("/no/such/source"), None);
        let result = scan(&settings);
        assert!(matches!(result, Err(OrganizeError::InvalidSourcePath { .. })));
    }

    #[test]
    fn test_scan_rejects_target_inside_source() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let (source, _) = make_dirs(temp_dir.path());
        let nested_target = source.join("organized");
        fs::create_dir(&nested_target).expect("Failed to create nested target");

        let settings = settings_for(&source, &nested_target);
        let result = scan(&settings);
        assert!(matches!(result, Err(OrganizeError::TargetInsideSource { .. })));
    }

    #[test]
    fn test_scan_in_place_target_is_allowed() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let (source, _) = make_dirs(temp_dir.path());
        fs::write(source.join("a.txt"), "a").expect("Failed to write file");

        let settings = Settings::new(source.clone(), None);
        let items = scan(&settings).expect("Scan failed");
        assert_eq!(items, vec![source.join("a.txt")]);
    }

    #[test]
    fn test_scan_is_sorted_and_stable() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let (source, target) = make_dirs(temp_dir.path());
        fs::write(source.join("b.txt"), "b").expect("Failed to write file");
        fs::write(source.join("a.txt"), "a").expect("Failed to write file");
        fs::write(source.join("c.txt"), "c").expect("Failed to write file");

        let settings = settings_for(&source, &target);
        let first = scan(&settings).expect("Scan failed");
        let second = scan(&settings).expect("Scan failed");

        assert_eq!(
            first,
            vec![
                source.join("a.txt"),
                source.join("b.txt"),
                source.join("c.txt")
            ]
        );
        assert_eq!(first, second);
    }

    #[test]
    fn test_recursive_scan_suppresses_nested_duplicates() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let (source, target) = make_dirs(temp_dir.path());
        let top_dir = source.join("top");
        let nested_dir = top_dir.join("nested");
        fs::create_dir_all(&nested_dir).expect("Failed to create dirs");
        fs::write(nested_dir.join("inside.txt"), "content").expect("Failed to write file");
        fs::write(source.join("root.txt"), "content").expect("Failed to write file");

        let mut settings = settings_for(&source, &target);
        settings.recursive = true;

        let items = scan(&settings).expect("Scan failed");
        assert!(items.contains(&top_dir));
        assert!(items.contains(&source.join("root.txt")));
        assert!(!items.contains(&nested_dir));
        assert!(!items.contains(&nested_dir.join("inside.txt")));
    }

    #[test]
    fn test_extension_filter_excludes_folders() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let (source, target) = make_dirs(temp_dir.path());
        let folder = source.join("images");
        fs::create_dir(&folder).expect("Failed to create folder");
        fs::write(folder.join("a.jpg"), "jpg").expect("Failed to write file");
        fs::write(folder.join("b.txt"), "txt").expect("Failed to write file");

        let mut settings = settings_for(&source, &target);
        settings.recursive = true;
        settings.extensions = vec![".txt".to_string()];

        let items = scan(&settings).expect("Scan failed");
        assert!(!items.contains(&folder));
        assert!(items.contains(&folder.join("b.txt")));
        assert!(!items.contains(&folder.join("a.jpg")));
    }

    #[test]
    fn test_extension_filter_is_case_insensitive_and_dot_agnostic() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let (source, target) = make_dirs(temp_dir.path());
        fs::write(source.join("photo.JPG"), "x").expect("Failed to write file");
        fs::write(source.join("note.txt"), "x").expect("Failed to write file");

        let mut settings = settings_for(&source, &target);
        settings.extensions = vec!["jpg".to_string()];

        let items = scan(&settings).expect("Scan failed");
        assert_eq!(items, vec![source.join("photo.JPG")]);
    }

    #[test]
    fn test_size_filters_exclude_out_of_range_files() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let (source, target) = make_dirs(temp_dir.path());
        fs::write(source.join("small.txt"), "1234").expect("Failed to write file");
        fs::write(source.join("big.txt"), "x".repeat(4096)).expect("Failed to write file");

        let mut settings = settings_for(&source, &target);
        settings.min_size_bytes = Some(100);
        settings.max_size_bytes = Some(5000);

        let items = scan(&settings).expect("Scan failed");
        assert!(items.contains(&source.join("big.txt")));
        assert!(!items.contains(&source.join("small.txt")));
    }

    #[test]
    fn test_hidden_files_excluded_unless_enabled() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let (source, target) = make_dirs(temp_dir.path());
        fs::write(source.join("visible.txt"), "v").expect("Failed to write file");
        fs::write(source.join(".hidden.txt"), "h").expect("Failed to write file");

        let default_settings = settings_for(&source, &target);
        let mut included_settings = settings_for(&source, &target);
        included_settings.include_hidden = true;

        let default_items = scan(&default_settings).expect("Scan failed");
        let included_items = scan(&included_settings).expect("Scan failed");

        assert!(default_items.contains(&source.join("visible.txt")));
        assert!(!default_items.contains(&source.join(".hidden.txt")));
        assert!(included_items.contains(&source.join(".hidden.txt")));
    }

    #[test]
    fn test_folders_only_mode_returns_only_directories() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let (source, target) = make_dirs(temp_dir.path());
        let folder = source.join("folder_a");
        fs::create_dir(&folder).expect("Failed to create folder");
        fs::write(folder.join("inside.txt"), "x").expect("Failed to write file");
        fs::write(source.join("root.txt"), "y").expect("Failed to write file");

        let mut settings = settings_for(&source, &target);
        settings.recursive = true;
        settings.item_mode = ItemMode::FoldersOnly;

        let items = scan(&settings).expect("Scan failed");
        assert!(items.contains(&folder));
        assert!(!items.contains(&source.join("root.txt")));
    }

    #[test]
    fn test_files_only_mode_skips_directories() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let (source, target) = make_dirs(temp_dir.path());
        fs::create_dir(source.join("sub")).expect("Failed to create folder");
        fs::write(source.join("a.txt"), "a").expect("Failed to write file");

        let mut settings = settings_for(&source, &target);
        settings.item_mode = ItemMode::FilesOnly;

        let items = scan(&settings).expect("Scan failed");
        assert_eq!(items, vec![source.join("a.txt")]);
    }

    #[test]
    fn test_runtime_data_directory_is_excluded() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let (source, target) = make_dirs(temp_dir.path());
        let data_dir = source.join(DATA_DIR_NAME);
        fs::create_dir(&data_dir).expect("Failed to create data dir");
        fs::write(data_dir.join("operation.log"), "log").expect("Failed to write file");
        fs::write(source.join("a.txt"), "a").expect("Failed to write file");

        let mut settings = settings_for(&source, &target);
        settings.recursive = true;

        let items = scan(&settings).expect("Scan failed");
        assert_eq!(items, vec![source.join("a.txt")]);
    }

    #[test]
    fn test_exclude_patterns_match_names_and_relative_paths() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let (source, target) = make_dirs(temp_dir.path());
        fs::write(source.join("keep.txt"), "k").expect("Failed to write file");
        fs::write(source.join("scratch.tmp"), "t").expect("Failed to write file");

        let mut settings = settings_for(&source, &target);
        settings.exclude_patterns = vec!["*.tmp".to_string()];

        let items = scan(&settings).expect("Scan failed");
        assert_eq!(items, vec![source.join("keep.txt")]);
    }

    #[test]
    fn test_invalid_exclude_pattern_is_an_error() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let (source, target) = make_dirs(temp_dir.path());

        let mut settings = settings_for(&source, &target);
        settings.exclude_patterns = vec!["[invalid".to_string()];

        let result = scan(&settings);
        assert!(matches!(result, Err(OrganizeError::InvalidPattern { .. })));
    }
}
