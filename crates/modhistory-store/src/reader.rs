//! Loading earlier snapshots.

use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::Deserialize;
use tracing::debug;

use modhistory_core::HierarchyNode;

use crate::error::SnapshotError;
use crate::writer::{SNAPSHOT_PREFIX, SNAPSHOT_SUFFIX, STAMP_FORMAT};

/// Read a snapshot file back into a hierarchy.
///
/// Nesting depth is unbounded, so any tree the writer produced reads back.
pub fn read_snapshot(path: impl AsRef<Path>) -> Result<HierarchyNode, SnapshotError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| SnapshotError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let decode_err = |source: serde_json::Error| SnapshotError::Decode {
        path: path.to_path_buf(),
        source,
    };

    let mut de = serde_json::Deserializer::from_reader(BufReader::new(file));
    de.disable_recursion_limit();
    let root = HierarchyNode::deserialize(serde_stacker::Deserializer::new(&mut de))
        .map_err(decode_err)?;
    de.end().map_err(decode_err)?;

    if root.is_file() {
        return Err(SnapshotError::NotAHierarchy {
            path: path.to_path_buf(),
        });
    }
    Ok(root)
}

/// Timestamp embedded in a snapshot file name, if `name` is one.
pub fn parse_snapshot_file_name(name: &str) -> Option<NaiveDateTime> {
    let stamp = name
        .strip_prefix(SNAPSHOT_PREFIX)?
        .strip_suffix(SNAPSHOT_SUFFIX)?;
    NaiveDateTime::parse_from_str(stamp, STAMP_FORMAT).ok()
}

/// Most recent snapshot file in `dir`, judged by the time in its name.
///
/// A missing directory has no snapshots.
pub fn find_latest_snapshot(dir: impl AsRef<Path>) -> Result<Option<PathBuf>, SnapshotError> {
    let dir = dir.as_ref();
    let read_err = |source: io::Error| SnapshotError::Read {
        path: dir.to_path_buf(),
        source,
    };

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(read_err(err)),
    };

    let mut latest: Option<(NaiveDateTime, PathBuf)> = None;
    for entry in entries {
        let entry = entry.map_err(read_err)?;
        let Some(stamp) = entry.file_name().to_str().and_then(parse_snapshot_file_name) else {
            continue;
        };
        if !entry.file_type().map_err(read_err)?.is_file() {
            continue;
        }
        if latest.as_ref().is_none_or(|(newest, _)| stamp > *newest) {
            latest = Some((stamp, entry.path()));
        }
    }

    if let Some((_, path)) = &latest {
        debug!(path = %path.display(), "found previous snapshot");
    }
    Ok(latest.map(|(_, path)| path))
}
