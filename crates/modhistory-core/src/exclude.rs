//! Exclusion rules for files, directories and extensions.

use std::collections::HashSet;

use crate::config::CollectConfig;

/// Name- and extension-based exclusion sets, normalized for matching.
///
/// Extensions are stored in dotted form: a configured `png` matches the same
/// files as `.png`. Matching is exact and case-sensitive.
#[derive(Debug, Clone, Default)]
pub struct ExclusionRules {
    files: HashSet<String>,
    dirs: HashSet<String>,
    extensions: HashSet<String>,
}

impl ExclusionRules {
    /// Create rules from raw name lists.
    pub fn new<I, J, K>(files: I, dirs: J, extensions: K) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
        J: IntoIterator,
        J::Item: Into<String>,
        K: IntoIterator,
        K::Item: AsRef<str>,
    {
        Self {
            files: files.into_iter().map(Into::into).collect(),
            dirs: dirs.into_iter().map(Into::into).collect(),
            extensions: extensions
                .into_iter()
                .filter_map(|ext| canonical_extension(ext.as_ref()))
                .collect(),
        }
    }

    /// Build rules from a collection config.
    pub fn from_config(config: &CollectConfig) -> Self {
        Self::new(
            config.exclude_files.iter().cloned(),
            config.exclude_dirs.iter().cloned(),
            &config.exclude_extensions,
        )
    }

    /// Should a directory with this base name be skipped (with its subtree)?
    pub fn excludes_dir(&self, name: &str) -> bool {
        self.dirs.contains(name)
    }

    /// Should a file with this base name be skipped?
    pub fn excludes_file(&self, name: &str) -> bool {
        if self.files.contains(name) {
            return true;
        }
        let ext = extension_of(name);
        !ext.is_empty() && self.extensions.contains(ext)
    }

    /// Normalized extension set.
    pub fn extensions(&self) -> impl Iterator<Item = &str> {
        self.extensions.iter().map(String::as_str)
    }
}

/// Normalize a configured extension to dotted form. Empty entries yield `None`.
pub fn canonical_extension(raw: &str) -> Option<String> {
    if raw.is_empty() {
        None
    } else if raw.starts_with('.') {
        Some(raw.to_string())
    } else {
        Some(format!(".{raw}"))
    }
}

/// Extension of a file name including the dot, or `""` if there is none.
///
/// Leading dots do not start an extension: `.bashrc` has none, `a.tar.gz`
/// has `.gz`, and a trailing dot (`notes.`) is the extension `.`.
pub fn extension_of(name: &str) -> &str {
    match name.rfind('.') {
        Some(idx) if name[..idx].bytes().any(|b| b != b'.') => &name[idx..],
        _ => "",
    }
}
