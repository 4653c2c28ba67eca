//! Error and warning types for collection runs.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::CollectConfigBuilderError;

/// Errors that end a collection run.
#[derive(Debug, Error)]
pub enum CollectError {
    /// Root path does not exist.
    #[error("Root path not found: {path}")]
    RootNotFound { path: PathBuf },

    /// Root path exists but is not a directory.
    #[error("Root path is not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// Root path could not be resolved or read.
    #[error("Cannot access root path {path}: {source}")]
    RootAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Metadata for a discovered file could not be read.
    ///
    /// Only returned in strict mode; otherwise recorded as a warning.
    #[error("Cannot read metadata for {path}: {source}")]
    FileAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Run was cancelled before completion.
    #[error("Collection cancelled")]
    Cancelled,

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

impl CollectError {
    /// Classify an I/O failure while resolving the root path.
    pub fn root(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::NotFound => Self::RootNotFound { path },
            _ => Self::RootAccess { path, source },
        }
    }

    /// True for errors about the root path itself, raised before any output.
    pub fn is_traversal(&self) -> bool {
        matches!(
            self,
            Self::RootNotFound { .. } | Self::NotADirectory { .. } | Self::RootAccess { .. }
        )
    }
}

impl From<CollectConfigBuilderError> for CollectError {
    fn from(err: CollectConfigBuilderError) -> Self {
        Self::InvalidConfig {
            message: err.to_string(),
        }
    }
}

/// Errors loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File could not be read.
    #[error("Cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File is not valid TOML or has unknown keys.
    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Kind of collection warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarningKind {
    /// File metadata could not be read.
    FileAccess,
    /// A directory could not be listed.
    ReadDir,
    /// Symbolic link target does not exist.
    BrokenSymlink,
    /// Name is not valid UTF-8 and reads the same as a sibling's.
    NameCollision,
}

/// Non-fatal problem with a single entry; the entry was skipped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectWarning {
    /// Path where the warning occurred.
    pub path: PathBuf,
    /// Human-readable message.
    pub message: String,
    /// Kind of warning.
    pub kind: WarningKind,
}

impl CollectWarning {
    /// Create a new warning.
    pub fn new(path: impl Into<PathBuf>, message: impl Into<String>, kind: WarningKind) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            kind,
        }
    }

    /// Warning for a file whose metadata could not be read.
    pub fn file_access(path: impl Into<PathBuf>, error: &std::io::Error) -> Self {
        Self::new(path, format!("Cannot read metadata: {error}"), WarningKind::FileAccess)
    }

    /// Warning for a directory that could not be listed.
    pub fn read_dir(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::new(path, message, WarningKind::ReadDir)
    }

    /// Warning for a symlink whose target is missing.
    pub fn broken_symlink(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            message: format!("Broken symlink: {}", path.display()),
            path,
            kind: WarningKind::BrokenSymlink,
        }
    }

    /// Warning for an entry whose name cannot be told apart from a sibling's.
    pub fn name_collision(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            message: format!(
                "Name is not valid UTF-8 and collides with another entry: {}",
                path.display()
            ),
            path,
            kind: WarningKind::NameCollision,
        }
    }
}
