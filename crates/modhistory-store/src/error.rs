//! Snapshot store errors.

use std::path::PathBuf;

use thiserror::Error;

/// Errors writing or reading snapshot files.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Hierarchy could not be encoded as JSON.
    #[error("Failed to encode snapshot for {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Snapshot file could not be created or written.
    #[error("Failed to write snapshot to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Snapshot file or directory could not be read.
    #[error("Failed to read snapshot {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Snapshot file is not valid JSON of the expected shape.
    #[error("Invalid snapshot {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Snapshot file holds a single record instead of a directory tree.
    #[error("Snapshot {path} does not contain a directory hierarchy")]
    NotAHierarchy { path: PathBuf },
}
