//! Directory-tree metadata collector for modhistory.
//!
//! This crate walks a directory tree with jwalk and builds the nested
//! [`HierarchyNode`] snapshot consumed by `modhistory-store`.
//!
//! # Overview
//!
//! - **Top-down traversal** with excluded directories pruned before descent
//! - **Name and extension filters** applied to every file
//! - **Best-effort** by default: unreadable files become warnings
//! - **Progress updates** via broadcast channels
//! - **Cancellation** via [`CancellationToken`]
//!
//! # Example
//!
//! ```rust,no_run
//! use modhistory_scan::{CollectConfig, TreeCollector};
//!
//! let config = CollectConfig::builder()
//!     .root("/path/to/scan")
//!     .exclude_dirs(["target".to_string()])
//!     .exclude_extensions([".log".to_string()])
//!     .build()
//!     .unwrap();
//!
//! let snapshot = TreeCollector::new().collect(&config).unwrap();
//! println!("{} files recorded", snapshot.stats.files_recorded);
//! ```

mod collector;
mod progress;

pub use collector::TreeCollector;
pub use progress::CollectProgress;
pub use tokio_util::sync::CancellationToken;

// Re-export core types for convenience
pub use modhistory_core::{
    CollectConfig, CollectError, CollectStats, CollectWarning, HierarchyNode, MetadataRecord,
    Snapshot, WarningKind,
};
