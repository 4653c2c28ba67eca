//! Collection configuration types.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::timestamp::WeekdayNames;

/// Name of the configuration file inside the config directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Configuration for a collection run.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct CollectConfig {
    /// Root directory to inventory.
    pub root: PathBuf,

    /// File base names to skip.
    #[builder(default)]
    #[serde(default)]
    pub exclude_files: BTreeSet<String>,

    /// Directory base names to skip, together with everything below them.
    #[builder(default)]
    #[serde(default)]
    pub exclude_dirs: BTreeSet<String>,

    /// File extensions to skip. `txt` and `.txt` are equivalent.
    #[builder(default)]
    #[serde(default)]
    pub exclude_extensions: BTreeSet<String>,

    /// Weekday labels used in display strings.
    #[builder(default)]
    #[serde(default)]
    pub weekday_names: WeekdayNames,

    /// Descend into symlinked directories.
    #[builder(default = "false")]
    #[serde(default)]
    pub follow_symlinks: bool,

    /// Number of threads for directory reads (0 = auto, 1 = serial).
    #[builder(default = "0")]
    #[serde(default)]
    pub threads: usize,

    /// Abort on the first unreadable file instead of skipping it.
    #[builder(default = "false")]
    #[serde(default)]
    pub strict: bool,
}

impl CollectConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        match self.root {
            Some(ref root) if root.as_os_str().is_empty() => {
                Err("Root path cannot be empty".to_string())
            }
            Some(_) => Ok(()),
            None => Err("Root path is required".to_string()),
        }
    }
}

impl CollectConfig {
    /// Create a new config builder.
    pub fn builder() -> CollectConfigBuilder {
        CollectConfigBuilder::default()
    }

    /// Create a config for a path with no exclusions.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            exclude_files: BTreeSet::new(),
            exclude_dirs: BTreeSet::new(),
            exclude_extensions: BTreeSet::new(),
            weekday_names: WeekdayNames::default(),
            follow_symlinks: false,
            threads: 0,
            strict: false,
        }
    }
}

impl Default for CollectConfig {
    fn default() -> Self {
        Self::new(".")
    }
}

/// Contents of a `config.toml` file. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub root: Option<PathBuf>,
    pub exclude_files: Vec<String>,
    pub exclude_dirs: Vec<String>,
    pub exclude_extensions: Vec<String>,
    pub weekday_names: Option<WeekdayNames>,
    pub follow_symlinks: Option<bool>,
    pub threads: Option<usize>,
    pub strict: Option<bool>,
    /// Directory the snapshot file is written to.
    pub output_dir: Option<PathBuf>,
    /// Carry history forward from the latest snapshot in `output_dir`.
    pub accumulate: Option<bool>,
}

impl ConfigFile {
    /// Platform default location, e.g. `~/.config/modhistory/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("modhistory").join(CONFIG_FILE_NAME))
    }

    /// Parse TOML text.
    pub fn parse(content: &str, origin: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })
    }

    /// Load a config file from an explicit path.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content, path)
    }

    /// Load the config file at the default location, if there is one.
    pub fn load_default() -> Result<Option<Self>, ConfigError> {
        match Self::default_path() {
            Some(path) if path.is_file() => Self::load(&path).map(Some),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = CollectConfig::builder()
            .root("/home/user")
            .exclude_dirs(BTreeSet::from(["node_modules".to_string()]))
            .threads(4usize)
            .strict(true)
            .build()
            .unwrap();

        assert_eq!(config.root, PathBuf::from("/home/user"));
        assert!(config.exclude_dirs.contains("node_modules"));
        assert!(config.exclude_files.is_empty());
        assert_eq!(config.threads, 4);
        assert!(config.strict);
        assert!(!config.follow_symlinks);
        assert_eq!(config.weekday_names, WeekdayNames::English);
    }

    #[test]
    fn test_builder_requires_root() {
        assert!(CollectConfig::builder().build().is_err());
        assert!(CollectConfig::builder().root("").build().is_err());
    }

    #[test]
    fn test_config_simple() {
        let config = CollectConfig::new("/data");
        assert_eq!(config.root, PathBuf::from("/data"));
        assert!(!config.strict);
        assert_eq!(config.threads, 0);
    }

    #[test]
    fn test_parse_config_file() {
        let text = r#"
            root = "/srv/share"
            exclude_files = ["ignore_file_name.txt"]
            exclude_dirs = ["folder1", "folder2"]
            exclude_extensions = [".txt", "png"]
            weekday_names = "korean"
            output_dir = "/tmp/out"
            accumulate = true
        "#;
        let file = ConfigFile::parse(text, Path::new("config.toml")).unwrap();

        assert_eq!(file.root, Some(PathBuf::from("/srv/share")));
        assert_eq!(file.exclude_dirs, ["folder1", "folder2"]);
        assert_eq!(file.exclude_extensions, [".txt", "png"]);
        assert_eq!(file.weekday_names, Some(WeekdayNames::Korean));
        assert_eq!(file.accumulate, Some(true));
        assert_eq!(file.strict, None);
    }

    #[test]
    fn test_parse_rejects_unknown_keys() {
        let err = ConfigFile::parse("colour = \"red\"", Path::new("bad.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_load_missing_file() {
        let err = ConfigFile::load(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
