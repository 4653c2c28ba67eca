//! Hierarchy nodes and per-file metadata records.

use std::collections::BTreeMap;

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// Child entries of a directory node, keyed by base name.
pub type Children = BTreeMap<CompactString, HierarchyNode>;

/// Creation and modification history of a single file.
///
/// `modification_history` is never empty and its last entry always equals
/// `last_modified_display`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RecordFields")]
pub struct MetadataRecord {
    #[serde(rename = "Date_of_creation")]
    creation_display: String,
    #[serde(rename = "Modified_times")]
    modification_history: Vec<String>,
    #[serde(rename = "Last_modified")]
    last_modified_display: String,
}

/// Wire form of a record, validated before it becomes a `MetadataRecord`.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RecordFields {
    #[serde(rename = "Date_of_creation")]
    creation_display: String,
    #[serde(rename = "Modified_times")]
    modification_history: Vec<String>,
    #[serde(rename = "Last_modified")]
    last_modified_display: String,
}

impl TryFrom<RecordFields> for MetadataRecord {
    type Error = String;

    fn try_from(fields: RecordFields) -> Result<Self, Self::Error> {
        match fields.modification_history.last() {
            Some(last) if *last == fields.last_modified_display => Ok(Self {
                creation_display: fields.creation_display,
                modification_history: fields.modification_history,
                last_modified_display: fields.last_modified_display,
            }),
            Some(last) => Err(format!(
                "Last_modified '{}' does not match final Modified_times entry '{last}'",
                fields.last_modified_display
            )),
            None => Err("Modified_times must not be empty".to_string()),
        }
    }
}

impl MetadataRecord {
    /// Create a record for a file seen for the first time.
    pub fn new(creation_display: impl Into<String>, modified_display: impl Into<String>) -> Self {
        let modified = modified_display.into();
        Self {
            creation_display: creation_display.into(),
            modification_history: vec![modified.clone()],
            last_modified_display: modified,
        }
    }

    /// Display string of the creation time.
    pub fn creation_display(&self) -> &str {
        &self.creation_display
    }

    /// All modification times observed, oldest first.
    pub fn modification_history(&self) -> &[String] {
        &self.modification_history
    }

    /// Most recent modification time observed.
    pub fn last_modified_display(&self) -> &str {
        &self.last_modified_display
    }

    /// Record another observation of the file's modification time.
    ///
    /// Appends to the history only when it differs from the latest entry.
    pub fn record_modification(&mut self, modified_display: impl Into<String>) {
        let modified = modified_display.into();
        if modified != self.last_modified_display {
            self.modification_history.push(modified.clone());
            self.last_modified_display = modified;
        }
    }

    /// Fold a newer observation of the same path into this record.
    ///
    /// The original creation time is kept.
    pub fn absorb(&mut self, newer: MetadataRecord) {
        self.record_modification(newer.last_modified_display);
    }

    /// Replace this record's history with `prior`'s, then re-apply the
    /// current modification time on top of it.
    pub fn inherit_history(&mut self, prior: &MetadataRecord) {
        let current = std::mem::replace(
            &mut self.last_modified_display,
            prior.last_modified_display.clone(),
        );
        self.modification_history = prior.modification_history.clone();
        self.record_modification(current);
    }
}

/// One level of the scanned hierarchy.
///
/// Serialized untagged: a directory is a JSON object of its children, a file
/// is the record object itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HierarchyNode {
    /// A regular file and its metadata.
    File(MetadataRecord),
    /// A directory, possibly empty.
    Directory(Children),
}

impl Default for HierarchyNode {
    fn default() -> Self {
        Self::empty_directory()
    }
}

impl HierarchyNode {
    /// Create an empty directory node.
    pub fn empty_directory() -> Self {
        Self::Directory(Children::new())
    }

    /// Check if this node is a directory.
    pub fn is_dir(&self) -> bool {
        matches!(self, Self::Directory(_))
    }

    /// Check if this node is a file.
    pub fn is_file(&self) -> bool {
        matches!(self, Self::File(_))
    }

    /// The file record, if this node is a file.
    pub fn as_record(&self) -> Option<&MetadataRecord> {
        match self {
            Self::File(record) => Some(record),
            Self::Directory(_) => None,
        }
    }

    /// Direct children, if this node is a directory.
    pub fn children(&self) -> Option<&Children> {
        match self {
            Self::Directory(children) => Some(children),
            Self::File(_) => None,
        }
    }

    /// Insert a directory (no record) or a file (with record) at the path
    /// given by `segments`, relative to this node.
    ///
    /// Missing intermediate directories are created; existing ones are left
    /// untouched. Re-inserting a file folds the new observation into the
    /// existing record.
    pub fn insert<S: AsRef<str>>(&mut self, segments: &[S], record: Option<MetadataRecord>) {
        let Some((last, parents)) = segments.split_last() else {
            return;
        };

        let mut current = self;
        for segment in parents {
            current = current
                .children_mut()
                .entry(CompactString::new(segment.as_ref()))
                .or_default();
        }

        let children = current.children_mut();
        let key = CompactString::new(last.as_ref());
        match record {
            Some(record) => match children.get_mut(&key) {
                Some(Self::File(existing)) => existing.absorb(record),
                _ => {
                    children.insert(key, Self::File(record));
                }
            },
            None => {
                children.entry(key).or_default();
            }
        }
    }

    /// Look up a descendant by path segments. An empty path yields `self`.
    pub fn get<S: AsRef<str>>(&self, segments: &[S]) -> Option<&HierarchyNode> {
        segments.iter().try_fold(self, |node, segment| {
            node.children()?.get(segment.as_ref())
        })
    }

    /// Check whether a descendant exists at the given path.
    pub fn contains<S: AsRef<str>>(&self, segments: &[S]) -> bool {
        self.get(segments).is_some()
    }

    /// Check whether any node anywhere below this one has the given name.
    pub fn contains_name(&self, name: &str) -> bool {
        self.children().is_some_and(|children| {
            children
                .iter()
                .any(|(key, child)| key.as_str() == name || child.contains_name(name))
        })
    }

    /// Number of file records in this subtree.
    pub fn file_count(&self) -> u64 {
        match self {
            Self::File(_) => 1,
            Self::Directory(children) => children.values().map(Self::file_count).sum(),
        }
    }

    /// Number of directories below this node (not counting itself).
    pub fn dir_count(&self) -> u64 {
        match self {
            Self::File(_) => 0,
            Self::Directory(children) => children
                .values()
                .filter(|child| child.is_dir())
                .map(|child| 1 + child.dir_count())
                .sum(),
        }
    }

    /// All descendant paths, `/`-joined, in sorted order.
    pub fn paths(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_paths("", &mut out);
        out.sort();
        out
    }

    fn collect_paths(&self, prefix: &str, out: &mut Vec<String>) {
        if let Self::Directory(children) = self {
            for (name, child) in children {
                let path = if prefix.is_empty() {
                    name.to_string()
                } else {
                    format!("{prefix}/{name}")
                };
                child.collect_paths(&path, out);
                out.push(path);
            }
        }
    }

    /// Carry modification history forward from an earlier snapshot.
    ///
    /// Files present at the same path in both trees get `prior`'s history
    /// followed by their current modification time. Entries that only exist
    /// in `prior` are not copied.
    pub fn carry_history_from(&mut self, prior: &HierarchyNode) {
        match (self, prior) {
            (Self::Directory(children), Self::Directory(prior_children)) => {
                for (name, child) in children.iter_mut() {
                    if let Some(prior_child) = prior_children.get(name) {
                        child.carry_history_from(prior_child);
                    }
                }
            }
            (Self::File(record), Self::File(prior_record)) => record.inherit_history(prior_record),
            _ => {}
        }
    }

    fn children_mut(&mut self) -> &mut Children {
        // The filesystem is authoritative: a path walked through is a directory.
        if self.is_file() {
            *self = Self::empty_directory();
        }
        match self {
            Self::Directory(children) => children,
            Self::File(_) => unreachable!("file node replaced by directory above"),
        }
    }
}
