//! Collected snapshot container and statistics.

use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};

use crate::error::CollectWarning;
use crate::node::HierarchyNode;

/// Counters for a collection run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectStats {
    /// Files with a metadata record in the hierarchy.
    pub files_recorded: u64,
    /// Directories inserted into the hierarchy.
    pub dirs_recorded: u64,
    /// Files skipped by name or extension rules.
    pub files_excluded: u64,
    /// Directories pruned by name, including their subtrees.
    pub dirs_excluded: u64,
    /// Files skipped because their metadata could not be read.
    pub files_failed: u64,
}

impl CollectStats {
    /// Create new empty stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total entries the walk looked at.
    pub fn entries_seen(&self) -> u64 {
        self.files_recorded
            + self.dirs_recorded
            + self.files_excluded
            + self.dirs_excluded
            + self.files_failed
    }
}

/// Result of one collection run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// Hierarchy rooted at the scanned directory.
    pub root: HierarchyNode,

    /// Canonical root path that was scanned.
    pub root_path: PathBuf,

    /// When the run finished.
    pub taken_at: SystemTime,

    /// How long the walk took.
    pub duration: Duration,

    /// Summary counters.
    pub stats: CollectStats,

    /// Entries skipped because of errors.
    pub warnings: Vec<CollectWarning>,
}

impl Snapshot {
    /// Create a new snapshot.
    pub fn new(
        root: HierarchyNode,
        root_path: PathBuf,
        stats: CollectStats,
        duration: Duration,
        warnings: Vec<CollectWarning>,
    ) -> Self {
        Self {
            root,
            root_path,
            taken_at: SystemTime::now(),
            duration,
            stats,
            warnings,
        }
    }

    /// Check if any entries were skipped because of errors.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}
