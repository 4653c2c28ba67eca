//! Snapshot file naming and writing.

use std::fmt::Display;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, TimeZone};
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use tracing::{debug, info};

use modhistory_core::HierarchyNode;

use crate::error::SnapshotError;

/// File name prefix, up to and including the opening parenthesis.
pub const SNAPSHOT_PREFIX: &str = "File-Modified-History_(";
/// File name suffix, from the closing parenthesis.
pub const SNAPSHOT_SUFFIX: &str = ").json";

pub(crate) const STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
const INDENT: &[u8] = b"    ";

/// Name of a snapshot written at `at`.
pub fn snapshot_file_name<Tz>(at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    format!("{SNAPSHOT_PREFIX}{}{SNAPSHOT_SUFFIX}", at.format(STAMP_FORMAT))
}

/// Render a hierarchy as the JSON text of a snapshot file.
pub fn to_pretty_json(root: &HierarchyNode) -> Result<String, serde_json::Error> {
    let mut buf = Vec::new();
    encode(root, &mut buf)?;
    String::from_utf8(buf).map_err(<serde_json::Error as serde::ser::Error>::custom)
}

fn encode<W: Write>(root: &HierarchyNode, writer: W) -> Result<(), serde_json::Error> {
    let mut ser = Serializer::with_formatter(writer, PrettyFormatter::with_indent(INDENT));
    root.serialize(&mut ser)
}

/// Writes snapshot files into a directory.
#[derive(Debug, Clone)]
pub struct SnapshotWriter {
    output_dir: PathBuf,
}

impl SnapshotWriter {
    /// Create a writer targeting `output_dir`. The directory is created on
    /// first write if needed.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Directory snapshots are written to.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Write `root` to a file named after the current local time.
    pub fn write(&self, root: &HierarchyNode) -> Result<PathBuf, SnapshotError> {
        self.write_at(root, &Local::now())
    }

    /// Write `root` to the file named for `at`, replacing any file of the
    /// same name.
    pub fn write_at<Tz>(&self, root: &HierarchyNode, at: &DateTime<Tz>) -> Result<PathBuf, SnapshotError>
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let path = self.output_dir.join(snapshot_file_name(at));
        let write_err = |source: io::Error| SnapshotError::Write {
            path: path.clone(),
            source,
        };

        if !self.output_dir.as_os_str().is_empty() {
            fs::create_dir_all(&self.output_dir).map_err(write_err)?;
        }

        debug!(path = %path.display(), "writing snapshot");
        let mut writer = BufWriter::new(File::create(&path).map_err(write_err)?);
        encode(root, &mut writer).map_err(|source| {
            if source.is_io() {
                write_err(source.into())
            } else {
                SnapshotError::Encode {
                    path: path.clone(),
                    source,
                }
            }
        })?;
        writer.flush().map_err(write_err)?;

        info!(path = %path.display(), files = root.file_count(), "snapshot written");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, NaiveDate};
    use modhistory_core::MetadataRecord;

    #[test]
    fn test_snapshot_file_name() {
        let at = FixedOffset::east_opt(9 * 3600)
            .unwrap()
            .from_local_datetime(
                &NaiveDate::from_ymd_opt(2024, 7, 3)
                    .unwrap()
                    .and_hms_opt(14, 5, 9)
                    .unwrap(),
            )
            .unwrap();
        assert_eq!(
            snapshot_file_name(&at),
            "File-Modified-History_(20240703_140509).json"
        );
    }

    #[test]
    fn test_pretty_json_uses_four_space_indent() {
        let mut root = HierarchyNode::empty_directory();
        root.insert(&["d", "f"], Some(MetadataRecord::new("c", "m")));

        let json = to_pretty_json(&root).unwrap();
        assert!(json.starts_with("{\n    \"d\": {\n        \"f\": {\n"));
        assert!(json.contains("\"Modified_times\": [\n"));
    }

    #[test]
    fn test_empty_directory_renders_as_empty_object() {
        let json = to_pretty_json(&HierarchyNode::empty_directory()).unwrap();
        assert_eq!(json, "{}");
    }
}
