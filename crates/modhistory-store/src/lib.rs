//! Snapshot files for modhistory.
//!
//! A snapshot is the collected hierarchy written as indented UTF-8 JSON to
//! `File-Modified-History_(YYYYMMDD_HHMMSS).json`, where the timestamp is the
//! local wall-clock time of the write. Non-ASCII names and weekday labels
//! are written literally.
//!
//! ```rust,no_run
//! use modhistory_core::HierarchyNode;
//! use modhistory_store::{SnapshotWriter, find_latest_snapshot, read_snapshot};
//!
//! let root = HierarchyNode::empty_directory();
//! let written = SnapshotWriter::new("snapshots").write(&root).unwrap();
//!
//! let latest = find_latest_snapshot("snapshots").unwrap().unwrap();
//! assert_eq!(latest, written);
//! let back = read_snapshot(&latest).unwrap();
//! assert_eq!(back, root);
//! ```

mod error;
mod reader;
mod writer;

pub use error::SnapshotError;
pub use reader::{find_latest_snapshot, parse_snapshot_file_name, read_snapshot};
pub use writer::{
    SNAPSHOT_PREFIX, SNAPSHOT_SUFFIX, SnapshotWriter, snapshot_file_name, to_pretty_json,
};
