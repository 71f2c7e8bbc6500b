//! Optional TOML configuration for run defaults and scanner excludes.
//!
//! Callers that want persistent preferences can keep a config file with
//! default policies and exclude patterns; command-line flags always win over
//! config values, which in turn win over the built-in defaults.
//!
//! # Configuration File Format
//!
//! ```toml
//! [defaults]
//! operation_mode = "copy"
//! date_basis = "modified_time"
//! folder_format = "nested"
//! conflict_policy = "skip"
//! recursive = true
//! include_hidden = false
//!
//! [filters]
//! extensions = ["jpg", "png"]
//! exclude_patterns = ["*.tmp", "node_modules"]
//! ```

use crate::model::{ConflictPolicy, DateBasis, FolderFormat, OperationMode, Settings};
use glob::Pattern;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Errors that can occur during configuration loading.
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// Configuration file not found at the specified path.
    ConfigNotFound(PathBuf),
    /// Invalid TOML syntax or structure.
    ConfigInvalid(String),
    /// Invalid glob pattern provided.
    InvalidGlobPattern(String),
    /// IO error while reading configuration.
    IoError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ConfigNotFound(path) => {
                write!(f, "Configuration file not found: {}", path.display())
            }
            ConfigError::ConfigInvalid(msg) => write!(f, "Invalid configuration: {}", msg),
            ConfigError::InvalidGlobPattern(pattern) => {
                write!(f, "Invalid glob pattern '{}'", pattern)
            }
            ConfigError::IoError(msg) => write!(f, "IO error reading configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Root configuration document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Default run policies, each optional.
    #[serde(default)]
    pub defaults: RunDefaults,

    /// Scanner filter configuration.
    #[serde(default)]
    pub filters: FilterDefaults,
}

/// Default policies applied when the caller does not specify them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunDefaults {
    pub operation_mode: Option<OperationMode>,
    pub date_basis: Option<DateBasis>,
    pub folder_format: Option<FolderFormat>,
    pub conflict_policy: Option<ConflictPolicy>,
    pub recursive: Option<bool>,
    pub include_hidden: Option<bool>,
}

/// Filter defaults merged into the scanner settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterDefaults {
    /// Extension allow-list (e.g. `["jpg", "png"]`). Empty means no filter.
    #[serde(default)]
    pub extensions: Vec<String>,

    /// Glob patterns excluding entries by name or source-relative path.
    #[serde(default)]
    pub exclude_patterns: Vec<String>,
}

impl AppConfig {
    /// Load configuration from a file, with fallback to defaults.
    ///
    /// Attempts to load configuration in the following order:
    /// 1. If `config_path` is provided, load from that file
    /// 2. Look for `.datetidyrc.toml` in the current directory
    /// 3. Look for `~/.config/datetidy/config.toml` in the home directory
    /// 4. Fall back to default configuration
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration file is explicitly provided but
    /// cannot be read, or if any exclude pattern is not a valid glob.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(".datetidyrc.toml");
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Ok(home) = std::env::var("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("datetidy")
                .join("config.toml");
            if home_config.exists() {
                return Self::load_from_file(&home_config);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        let config: Self =
            toml::from_str(&content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))?;
        config.validate_patterns()?;
        Ok(config)
    }

    /// Validate all exclude glob patterns up front so a typo surfaces at
    /// load time instead of mid-scan.
    fn validate_patterns(&self) -> Result<(), ConfigError> {
        for pattern in &self.filters.exclude_patterns {
            Pattern::new(pattern).map_err(|_| ConfigError::InvalidGlobPattern(pattern.clone()))?;
        }
        Ok(())
    }

    /// Merge this configuration into freshly constructed settings. Only
    /// fields the config actually sets are touched.
    pub fn apply_to(&self, settings: &mut Settings) {
        if let Some(mode) = self.defaults.operation_mode {
            settings.operation_mode = mode;
        }
        if let Some(basis) = self.defaults.date_basis {
            settings.date_basis = basis;
        }
        if let Some(format) = self.defaults.folder_format {
            settings.folder_format = format;
        }
        if let Some(policy) = self.defaults.conflict_policy {
            settings.conflict_policy = policy;
        }
        if let Some(recursive) = self.defaults.recursive {
            settings.recursive = recursive;
        }
        if let Some(include_hidden) = self.defaults.include_hidden {
            settings.include_hidden = include_hidden;
        }
        if !self.filters.extensions.is_empty() {
            settings.extensions = self.filters.extensions.clone();
        }
        settings
            .exclude_patterns
            .extend(self.filters.exclude_patterns.iter().cloned());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_config(dir: &Path, content: &str) -> PathBuf {
        let path = dir.join("config.toml");
        let mut file = fs::File::create(&path).expect("Failed to create config file");
        file.write_all(content.as_bytes())
            .expect("Failed to write config");
        path
    }

    #[test]
    fn test_missing_explicit_config_is_an_error() {
        let result = AppConfig::load(Some(Path::new("/no/such/config.toml")));
        assert!(matches!(result, Err(ConfigError::ConfigNotFound(_))));
    }

    #[test]
    fn test_defaults_when_nothing_configured() {
        let config = AppConfig::default();
        let mut settings = Settings::new(PathBuf::from("/data"), None);
        config.apply_to(&mut settings);

        assert_eq!(settings.operation_mode, OperationMode::Move);
        assert_eq!(settings.conflict_policy, ConflictPolicy::AutoRename);
        assert!(settings.exclude_patterns.is_empty());
    }

    #[test]
    fn test_load_and_apply_full_config() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = write_config(
            temp_dir.path(),
            r#"
            [defaults]
            operation_mode = "copy"
            date_basis = "modified_time"
            folder_format = "nested"
            conflict_policy = "skip"
            recursive = true
            include_hidden = true

            [filters]
            extensions = ["jpg", "png"]
            exclude_patterns = ["*.tmp"]
            "#,
        );

        let config = AppConfig::load(Some(&path)).expect("Failed to load config");
        let mut settings = Settings::new(PathBuf::from("/data"), None);
        config.apply_to(&mut settings);

        assert_eq!(settings.operation_mode, OperationMode::Copy);
        assert_eq!(settings.date_basis, DateBasis::ModifiedTime);
        assert_eq!(settings.folder_format, FolderFormat::Nested);
        assert_eq!(settings.conflict_policy, ConflictPolicy::Skip);
        assert!(settings.recursive);
        assert!(settings.include_hidden);
        assert_eq!(settings.extensions, vec!["jpg", "png"]);
        assert_eq!(settings.exclude_patterns, vec!["*.tmp"]);
    }

    #[test]
    fn test_partial_config_leaves_other_defaults() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = write_config(
            temp_dir.path(),
            r#"
            [defaults]
            operation_mode = "copy"
            "#,
        );

        let config = AppConfig::load(Some(&path)).expect("Failed to load config");
        let mut settings = Settings::new(PathBuf::from("/data"), None);
        config.apply_to(&mut settings);

        assert_eq!(settings.operation_mode, OperationMode::Copy);
        assert_eq!(settings.conflict_policy, ConflictPolicy::AutoRename);
        assert_eq!(settings.date_basis, DateBasis::CreationTime);
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = write_config(temp_dir.path(), "not [ valid toml");

        let result = AppConfig::load(Some(&path));
        assert!(matches!(result, Err(ConfigError::ConfigInvalid(_))));
    }

    #[test]
    fn test_invalid_glob_pattern_returns_error() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = write_config(
            temp_dir.path(),
            r#"
            [filters]
            exclude_patterns = ["[invalid"]
            "#,
        );

        let result = AppConfig::load(Some(&path));
        assert!(matches!(result, Err(ConfigError::InvalidGlobPattern(_))));
    }
}
