//! JWalk-based directory-tree metadata collector.

use std::collections::HashSet;
use std::fs::{FileType, Metadata};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant, SystemTime};

#[cfg(unix)]
use std::os::unix::fs::MetadataExt;

use compact_str::CompactString;
use jwalk::{Parallelism, WalkDirGeneric};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use modhistory_core::{
    CollectConfig, CollectError, CollectStats, CollectWarning, ExclusionRules, HierarchyNode,
    MetadataRecord, Snapshot, TimestampFormatter,
};

use crate::progress::CollectProgress;

/// Files recorded between progress updates.
const PROGRESS_INTERVAL: u64 = 500;

/// Per-entry walk state: `true` marks a name collision found while reading
/// the parent directory.
type WalkState = ((), bool);
type Entry = jwalk::DirEntry<WalkState>;

/// Walks a directory tree and builds its metadata hierarchy.
pub struct TreeCollector {
    progress_tx: broadcast::Sender<CollectProgress>,
}

impl TreeCollector {
    /// Create a new collector.
    pub fn new() -> Self {
        let (progress_tx, _) = broadcast::channel(100);
        Self { progress_tx }
    }

    /// Subscribe to progress updates.
    pub fn subscribe(&self) -> broadcast::Receiver<CollectProgress> {
        self.progress_tx.subscribe()
    }

    /// Collect a snapshot of the configured root.
    pub fn collect(&self, config: &CollectConfig) -> Result<Snapshot, CollectError> {
        self.collect_with_cancel(config, &CancellationToken::new())
    }

    /// Collect a snapshot, stopping early if `cancel` fires.
    ///
    /// A cancelled run returns [`CollectError::Cancelled`] and no partial
    /// hierarchy.
    pub fn collect_with_cancel(
        &self,
        config: &CollectConfig,
        cancel: &CancellationToken,
    ) -> Result<Snapshot, CollectError> {
        let start = Instant::now();
        let root_path = resolve_root(&config.root)?;
        if cancel.is_cancelled() {
            return Err(CollectError::Cancelled);
        }

        let rules = Arc::new(ExclusionRules::from_config(config));
        let formatter = TimestampFormatter::new(config.weekday_names);
        let pruned_dirs = Arc::new(AtomicU64::new(0));

        debug!(
            root = %root_path.display(),
            exclude_files = config.exclude_files.len(),
            exclude_dirs = config.exclude_dirs.len(),
            exclude_extensions = ?rules.extensions().collect::<Vec<_>>(),
            weekdays = %formatter.weekday_names(),
            strict = config.strict,
            "starting collection"
        );

        let mut run = Run {
            root_path: &root_path,
            rules: &rules,
            formatter,
            strict: config.strict,
            root: HierarchyNode::empty_directory(),
            stats: CollectStats::new(),
            warnings: Vec::new(),
        };

        let walker = self.walker(config, &root_path, Arc::clone(&rules), Arc::clone(&pruned_dirs));

        for entry_result in walker {
            if cancel.is_cancelled() {
                info!(root = %root_path.display(), "collection cancelled");
                return Err(CollectError::Cancelled);
            }

            let entry = match entry_result {
                Ok(entry) => entry,
                Err(err) => {
                    let path = err.path().map(Path::to_path_buf).unwrap_or_default();
                    warn!(path = %path.display(), error = %err, "cannot read directory");
                    run.warnings.push(CollectWarning::read_dir(path, err.to_string()));
                    continue;
                }
            };

            let path = entry.path();
            if entry.client_state {
                run.skip_name_collision(&path, entry.file_type());
                continue;
            }

            let name = entry.file_name().to_string_lossy().into_owned();
            let recorded_file = run.visit(&path, &name, entry.file_type())?;

            if recorded_file && run.stats.files_recorded % PROGRESS_INTERVAL == 0 {
                self.publish(&run, &path, start.elapsed());
            }
        }

        run.stats.dirs_excluded += pruned_dirs.load(Ordering::Relaxed);
        let duration = start.elapsed();
        self.publish(&run, &root_path, duration);

        info!(
            root = %root_path.display(),
            files = run.stats.files_recorded,
            dirs = run.stats.dirs_recorded,
            excluded = run.stats.files_excluded + run.stats.dirs_excluded,
            warnings = run.warnings.len(),
            elapsed_ms = duration.as_millis() as u64,
            "collection finished"
        );

        let Run {
            root,
            stats,
            warnings,
            ..
        } = run;
        Ok(Snapshot::new(root, root_path, stats, duration, warnings))
    }

    /// Configure the walk. Excluded directories are pruned while their parent
    /// is read, so nothing below them is ever visited.
    fn walker(
        &self,
        config: &CollectConfig,
        root_path: &Path,
        rules: Arc<ExclusionRules>,
        pruned_dirs: Arc<AtomicU64>,
    ) -> WalkDirGeneric<WalkState> {
        let parallelism = match config.threads {
            0 => Parallelism::RayonDefaultPool {
                busy_timeout: Duration::from_millis(100),
            },
            1 => Parallelism::Serial,
            n => Parallelism::RayonNewPool(n),
        };

        WalkDirGeneric::<WalkState>::new(root_path)
            .parallelism(parallelism)
            .skip_hidden(false)
            .follow_links(config.follow_symlinks)
            .sort(true)
            .min_depth(1)
            .process_read_dir(move |depth, _dir, _state, children| {
                // The root itself arrives with no depth and is never pruned.
                if depth.is_none() {
                    return;
                }
                children.retain(|child| match child {
                    Ok(entry) => {
                        let pruned = entry.file_type().is_dir()
                            && rules.excludes_dir(&entry.file_name().to_string_lossy());
                        if pruned {
                            pruned_dirs.fetch_add(1, Ordering::Relaxed);
                        }
                        !pruned
                    }
                    Err(_) => true,
                });
                if children
                    .iter()
                    .flatten()
                    .any(|entry| entry.file_name().to_str().is_none())
                {
                    flag_name_collisions(children);
                }
            })
    }

    fn publish(&self, run: &Run<'_>, current_path: &Path, elapsed: Duration) {
        // No subscribers is fine.
        let _ = self.progress_tx.send(CollectProgress {
            files_recorded: run.stats.files_recorded,
            dirs_recorded: run.stats.dirs_recorded,
            files_excluded: run.stats.files_excluded,
            warnings: run.warnings.len() as u64,
            current_path: current_path.to_path_buf(),
            elapsed,
        });
    }
}

impl Default for TreeCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// State of a single collection run.
struct Run<'a> {
    root_path: &'a Path,
    rules: &'a ExclusionRules,
    formatter: TimestampFormatter,
    strict: bool,
    root: HierarchyNode,
    stats: CollectStats,
    warnings: Vec<CollectWarning>,
}

impl Run<'_> {
    /// Handle one walked entry. Returns `true` if a file record was added.
    fn visit(&mut self, path: &Path, name: &str, file_type: FileType) -> Result<bool, CollectError> {
        let Some(segments) = relative_segments(self.root_path, path) else {
            return Ok(false);
        };

        if file_type.is_dir() {
            self.root.insert(&segments, None);
            self.stats.dirs_recorded += 1;
            return Ok(false);
        }

        // Symlinks are classified by their target.
        let metadata = match std::fs::metadata(path) {
            Ok(metadata) => metadata,
            Err(err) => return self.skip_unreadable(path, file_type.is_symlink(), err),
        };

        if metadata.is_dir() {
            // Symlinked directory that the walk does not descend into.
            if self.rules.excludes_dir(name) {
                self.stats.dirs_excluded += 1;
            } else {
                self.root.insert(&segments, None);
                self.stats.dirs_recorded += 1;
            }
            return Ok(false);
        }

        if self.rules.excludes_file(name) {
            self.stats.files_excluded += 1;
            return Ok(false);
        }

        match self.read_record(&metadata) {
            Ok(record) => {
                self.root.insert(&segments, Some(record));
                self.stats.files_recorded += 1;
                Ok(true)
            }
            Err(err) => self.skip_unreadable(path, false, err),
        }
    }

    fn read_record(&self, metadata: &Metadata) -> io::Result<MetadataRecord> {
        let modified = metadata.modified()?;
        let created = creation_time(metadata)?;
        Ok(MetadataRecord::new(
            self.formatter.format(created),
            self.formatter.format(modified),
        ))
    }

    /// Skip an entry whose name collides with a sibling's once decoded.
    fn skip_name_collision(&mut self, path: &Path, file_type: FileType) {
        warn!(path = %path.display(), "skipping entry with colliding non-UTF-8 name");
        self.warnings.push(CollectWarning::name_collision(path));
        if !file_type.is_dir() {
            self.stats.files_failed += 1;
        }
    }

    /// Record an unreadable file, or abort the run in strict mode.
    fn skip_unreadable(
        &mut self,
        path: &Path,
        symlink: bool,
        err: io::Error,
    ) -> Result<bool, CollectError> {
        if self.strict {
            return Err(CollectError::FileAccess {
                path: path.to_path_buf(),
                source: err,
            });
        }

        let warning = if symlink && err.kind() == io::ErrorKind::NotFound {
            CollectWarning::broken_symlink(path)
        } else {
            CollectWarning::file_access(path, &err)
        };
        warn!(path = %path.display(), error = %err, "skipping unreadable file");
        self.warnings.push(warning);
        self.stats.files_failed += 1;
        Ok(false)
    }
}

/// Mark siblings whose lossily decoded name repeats an earlier one's, and
/// keep the walk out of them. Only the first entry under a name is recorded.
fn flag_name_collisions(children: &mut [Result<Entry, jwalk::Error>]) {
    let mut seen = HashSet::new();
    for entry in children.iter_mut().flatten() {
        if !seen.insert(entry.file_name().to_string_lossy().into_owned()) {
            entry.client_state = true;
            entry.read_children_path = None;
        }
    }
}

/// Canonicalize the root and make sure it is a directory.
fn resolve_root(root: &Path) -> Result<PathBuf, CollectError> {
    let root_path = root
        .canonicalize()
        .map_err(|e| CollectError::root(root, e))?;
    if !root_path.is_dir() {
        return Err(CollectError::NotADirectory { path: root_path });
    }
    Ok(root_path)
}

/// Path components of `path` below `root`.
fn relative_segments(root: &Path, path: &Path) -> Option<Vec<CompactString>> {
    let relative = path.strip_prefix(root).ok()?;
    let segments: Vec<CompactString> = relative
        .components()
        .map(|c| CompactString::new(c.as_os_str().to_string_lossy()))
        .collect();
    (!segments.is_empty()).then_some(segments)
}

/// Birth time where the platform records one, otherwise the inode change time.
fn creation_time(metadata: &Metadata) -> io::Result<SystemTime> {
    match metadata.created() {
        Ok(created) => Ok(created),
        Err(err) => change_time(metadata).ok_or(err),
    }
}

#[cfg(unix)]
fn change_time(metadata: &Metadata) -> Option<SystemTime> {
    let secs = metadata.ctime();
    let nanos = Duration::from_nanos(metadata.ctime_nsec().max(0) as u64);
    let base = if secs >= 0 {
        SystemTime::UNIX_EPOCH.checked_add(Duration::from_secs(secs as u64))
    } else {
        SystemTime::UNIX_EPOCH.checked_sub(Duration::from_secs(secs.unsigned_abs()))
    };
    base?.checked_add(nanos)
}

#[cfg(not(unix))]
fn change_time(_metadata: &Metadata) -> Option<SystemTime> {
    None
}
