//! Collection progress reporting.

use std::path::PathBuf;
use std::time::Duration;

/// Progress information during a collection run.
#[derive(Debug, Clone, Default)]
pub struct CollectProgress {
    /// Files recorded so far.
    pub files_recorded: u64,
    /// Directories recorded so far.
    pub dirs_recorded: u64,
    /// Files skipped by exclusion rules so far.
    pub files_excluded: u64,
    /// Warnings raised so far.
    pub warnings: u64,
    /// Most recent path visited.
    pub current_path: PathBuf,
    /// Time elapsed since the run started.
    pub elapsed: Duration,
}

impl CollectProgress {
    /// Calculate rate in recorded files per second.
    pub fn files_per_second(&self) -> f64 {
        if self.elapsed.as_secs_f64() > 0.0 {
            self.files_recorded as f64 / self.elapsed.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Get total entries handled (files, directories and exclusions).
    pub fn total_items(&self) -> u64 {
        self.files_recorded + self.dirs_recorded + self.files_excluded
    }
}
