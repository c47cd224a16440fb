//! Archive configuration loading and rule merging.
//!
//! Configuration is optional. When the file is missing, built-in defaults are
//! used; when it exists, it must parse, otherwise the run is aborted before any
//! file is touched.
//!
//! # Configuration File Format
//!
//! YAML is the default format. A path ending in `.toml` is read as TOML with
//! the same keys.
//!
//! ```yaml
//! documents_dir: /home/user/Archive
//! ignore_files:
//!   - .DS_Store
//!   - thumbs.db
//! custom_rules:
//!   EBOOKS: [.epub, .mobi]
//!   DOCUMENTS: [.pdf, .md]
//! ```
//!
//! Each `custom_rules` entry replaces the whole extension list of a built-in
//! category with the same name, or adds a new category.

use crate::rules::RuleTable;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Default configuration file name, resolved against the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";

/// Directory created under the working directory when no destination is configured.
pub const DEFAULT_DOCUMENTS_DIR: &str = "DOCUMENTS";

/// Filenames skipped when no configuration file exists.
pub const DEFAULT_IGNORE_FILES: &[&str] = &[".DS_Store", "thumbs.db"];

/// Errors that can occur while loading configuration.
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// The configuration file exists but could not be read.
    Io { path: PathBuf, reason: String },
    /// Invalid YAML/TOML syntax or structure.
    Invalid { path: PathBuf, reason: String },
    /// A custom rule names a category that would escape the destination root.
    InvalidCategory { category: String, reason: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io { path, reason } => {
                write!(f, "Could not read configuration {}: {}", path.display(), reason)
            }
            ConfigError::Invalid { path, reason } => {
                write!(f, "Invalid configuration {}: {}", path.display(), reason)
            }
            ConfigError::InvalidCategory { category, reason } => {
                write!(f, "Invalid custom rule category '{}': {}", category, reason)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// On-disk shape of the configuration. Every key is optional.
#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    #[serde(default)]
    documents_dir: Option<PathBuf>,
    #[serde(default)]
    ignore_files: Option<Vec<String>>,
    #[serde(default)]
    custom_rules: Option<RuleTable>,
}

/// Settings for one archive run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveConfig {
    /// Destination root from the file, if any.
    pub documents_dir: Option<PathBuf>,
    /// Exact filenames to leave alone.
    pub ignore_files: Vec<String>,
    /// Rules overlaid onto the built-in table.
    pub custom_rules: RuleTable,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            documents_dir: None,
            ignore_files: DEFAULT_IGNORE_FILES.iter().map(|s| s.to_string()).collect(),
            custom_rules: RuleTable::empty(),
        }
    }
}

impl ArchiveConfig {
    /// Loads configuration from `path`, falling back to defaults if it is not a file.
    ///
    /// Keys missing from an existing file take empty values, so a file that
    /// omits `ignore_files` ignores nothing.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Io` if the file cannot be read.
    /// Returns `ConfigError::Invalid` if parsing fails.
    /// Returns `ConfigError::InvalidCategory` if a custom category is unsafe.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.is_file() {
            tracing::debug!(path = %path.display(), "no configuration file, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let parsed = if is_toml(path) {
            Self::from_toml_str(&content)
        } else {
            Self::from_yaml_str(&content)
        };
        let config = parsed.map_err(|reason| ConfigError::Invalid {
            path: path.to_path_buf(),
            reason,
        })?;

        config.validate()?;
        tracing::debug!(
            path = %path.display(),
            custom_rules = config.custom_rules.len(),
            ignored = config.ignore_files.len(),
            "loaded configuration"
        );
        Ok(config)
    }

    /// Parses YAML configuration text. Blank or comment-only text is an empty config.
    pub fn from_yaml_str(content: &str) -> Result<Self, String> {
        let blank = content.lines().all(|line| {
            let line = line.trim();
            line.is_empty() || line.starts_with('#') || line == "---"
        });
        if blank {
            return Ok(RawConfig::default().into());
        }
        let raw: RawConfig = serde_yaml::from_str(content).map_err(|e| e.to_string())?;
        Ok(raw.into())
    }

    /// Parses TOML configuration text.
    pub fn from_toml_str(content: &str) -> Result<Self, String> {
        let raw: RawConfig = toml::from_str(content).map_err(|e| e.to_string())?;
        Ok(raw.into())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for category in self.custom_rules.categories() {
            category
                .validate()
                .map_err(|reason| ConfigError::InvalidCategory {
                    category: category.to_string(),
                    reason,
                })?;
        }
        Ok(())
    }

    /// Returns the built-in rule table with `custom_rules` overlaid.
    ///
    /// A custom category that already exists keeps its position and has its
    /// extension list replaced, not extended. New categories are appended in
    /// file order.
    pub fn merged_rules(&self) -> RuleTable {
        let mut rules = RuleTable::builtin();
        rules.overlay(&self.custom_rules);
        rules
    }

    /// Resolves where sorted files go: `explicit`, then `documents_dir`, then
    /// `cwd/DOCUMENTS`.
    pub fn destination_root(&self, explicit: Option<&Path>, cwd: &Path) -> PathBuf {
        explicit
            .map(Path::to_path_buf)
            .or_else(|| self.documents_dir.clone())
            .unwrap_or_else(|| cwd.join(DEFAULT_DOCUMENTS_DIR))
    }
}

impl From<RawConfig> for ArchiveConfig {
    fn from(raw: RawConfig) -> Self {
        Self {
            documents_dir: raw.documents_dir,
            ignore_files: raw.ignore_files.unwrap_or_default(),
            custom_rules: raw.custom_rules.unwrap_or_else(RuleTable::empty),
        }
    }
}

fn is_toml(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("toml"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{Category, Extension};
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).expect("Failed to write config");
        path
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let config = ArchiveConfig::load(Path::new("/non/existent/config.yaml"))
            .expect("missing config is not an error");

        assert_eq!(config.documents_dir, None);
        assert!(config.ignore_files.contains(&".DS_Store".to_string()));
        assert!(config.ignore_files.contains(&"thumbs.db".to_string()));
        assert!(config.custom_rules.is_empty());
    }

    #[test]
    fn test_load_yaml() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = write(
            &temp_dir,
            "config.yaml",
            "documents_dir: /tmp/docs\nignore_files:\n  - secret.txt\ncustom_rules:\n  CUSTOM: [.custom]\n",
        );

        let config = ArchiveConfig::load(&path).expect("Failed to load config");
        assert_eq!(config.documents_dir, Some(PathBuf::from("/tmp/docs")));
        assert_eq!(config.ignore_files, vec!["secret.txt".to_string()]);
        assert_eq!(
            config.custom_rules.get(&Category::new("CUSTOM")),
            Some(&[Extension::new(".custom")][..])
        );
    }

    #[test]
    fn test_load_toml_matches_yaml() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let yaml = write(
            &temp_dir,
            "config.yaml",
            "ignore_files: [keep.me]\ncustom_rules:\n  MISC: [.py]\n",
        );
        let toml = write(
            &temp_dir,
            "config.toml",
            "ignore_files = [\"keep.me\"]\n\n[custom_rules]\nMISC = [\".py\"]\n",
        );

        let from_yaml = ArchiveConfig::load(&yaml).expect("yaml");
        let from_toml = ArchiveConfig::load(&toml).expect("toml");
        assert_eq!(from_yaml, from_toml);
    }

    #[test]
    fn test_missing_keys_take_empty_values() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = write(&temp_dir, "config.yaml", "documents_dir: out\n");

        let config = ArchiveConfig::load(&path).expect("Failed to load config");
        assert!(config.ignore_files.is_empty());
        assert!(config.custom_rules.is_empty());
    }

    #[test]
    fn test_blank_file_is_empty_config() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = write(&temp_dir, "config.yaml", "# nothing here\n");

        let config = ArchiveConfig::load(&path).expect("Failed to load config");
        assert_eq!(config.documents_dir, None);
        assert!(config.ignore_files.is_empty());
    }

    #[test]
    fn test_malformed_yaml_is_fatal() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = write(&temp_dir, "config.yaml", "ignore_files: [unterminated\n");

        let result = ArchiveConfig::load(&path);
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn test_wrong_shape_is_fatal() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = write(&temp_dir, "config.yaml", "custom_rules: [.pdf, .txt]\n");

        assert!(ArchiveConfig::load(&path).is_err());
    }

    #[test]
    fn test_escaping_category_is_rejected() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = write(&temp_dir, "config.yaml", "custom_rules:\n  ../etc: [.conf]\n");

        let result = ArchiveConfig::load(&path);
        assert!(matches!(result, Err(ConfigError::InvalidCategory { .. })));
    }

    #[test]
    fn test_merged_rules_replace_not_extend() {
        let config = ArchiveConfig::from_yaml_str(
            "custom_rules:\n  DOCUMENTS: [.md]\n  EBOOKS: [.mobi]\n",
        )
        .expect("valid yaml");
        let rules = config.merged_rules();

        assert_eq!(
            rules.get(&Category::new("DOCUMENTS")),
            Some(&[Extension::new(".md")][..])
        );
        assert_eq!(rules.categories().next(), Some(&Category::new("DOCUMENTS")));
        assert_eq!(rules.categories().last(), Some(&Category::new("EBOOKS")));
        assert_eq!(rules.len(), RuleTable::builtin().len() + 1);
    }

    #[test]
    fn test_merged_rules_without_custom_is_builtin() {
        assert_eq!(ArchiveConfig::default().merged_rules(), RuleTable::builtin());
    }

    #[test]
    fn test_destination_root_precedence() {
        let cwd = Path::new("/work");
        let mut config = ArchiveConfig::default();
        assert_eq!(
            config.destination_root(None, cwd),
            PathBuf::from("/work/DOCUMENTS")
        );

        config.documents_dir = Some(PathBuf::from("/archive"));
        assert_eq!(config.destination_root(None, cwd), PathBuf::from("/archive"));
        assert_eq!(
            config.destination_root(Some(Path::new("/cli")), cwd),
            PathBuf::from("/cli")
        );
    }
}
