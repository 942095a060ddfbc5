//! JWalk-based size indexer.

use std::path::{Path, PathBuf};
use std::time::Instant;

use jwalk::{Parallelism, WalkDir};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use dupsweep_core::{FileRecord, ScanConfig, ScanError, ScanWarning, SizeIndex, WarningKind};

use crate::progress::{ProgressTracker, ScanProgress};

/// Entries between progress broadcasts.
const PROGRESS_INTERVAL: u64 = 1000;

/// Result of walking a tree.
#[derive(Debug, Clone, Default)]
pub struct IndexOutcome {
    /// Canonical root that was walked.
    pub root: PathBuf,
    /// Size buckets with two or more files.
    pub index: SizeIndex,
    /// Every non-directory entry seen.
    pub total_files: u64,
    /// Entries whose size could not be read.
    pub skipped_files: u64,
    /// Entries and directories the walk could not read.
    pub walk_errors: u64,
    /// Problems encountered during the walk.
    pub warnings: Vec<ScanWarning>,
}

/// Walks a directory tree and groups regular files by size.
pub struct SizeIndexer {
    progress_tx: broadcast::Sender<ScanProgress>,
}

impl SizeIndexer {
    /// Create a new indexer with its own progress channel.
    pub fn new() -> Self {
        let (progress_tx, _) = broadcast::channel(100);
        Self { progress_tx }
    }

    /// Create an indexer that reports on an existing progress channel.
    pub fn with_sender(progress_tx: broadcast::Sender<ScanProgress>) -> Self {
        Self { progress_tx }
    }

    /// Subscribe to walk progress updates.
    pub fn subscribe(&self) -> broadcast::Receiver<ScanProgress> {
        self.progress_tx.subscribe()
    }

    /// Walk `root` and return the size buckets that may hold duplicates.
    ///
    /// Unreadable entries become warnings; only a missing, non-directory or
    /// unlistable root (or cancellation) is an error.
    pub fn index(
        &self,
        root: &Path,
        config: &ScanConfig,
        cancel: &CancellationToken,
    ) -> Result<IndexOutcome, ScanError> {
        let start = Instant::now();
        let root_path = check_root(root)?;
        let ignore = config.ignore_matcher()?;

        let parallelism = match config.threads {
            0 => Parallelism::RayonDefaultPool {
                busy_timeout: std::time::Duration::from_millis(100),
            },
            n => Parallelism::RayonNewPool(n),
        };

        let walker = WalkDir::new(&root_path)
            .parallelism(parallelism)
            .sort(true)
            .skip_hidden(!config.include_hidden)
            .follow_links(config.follow_symlinks)
            .min_depth(0)
            .max_depth(config.max_depth.map(|d| d as usize).unwrap_or(usize::MAX))
            .process_read_dir(move |_depth, _path, _state, children| {
                if !ignore.is_empty() {
                    children.retain(|child| match child {
                        Ok(entry) => !ignore.is_match(entry.file_name()),
                        Err(_) => true,
                    });
                }
            });

        let mut index = SizeIndex::new();
        let mut skipped_files = 0;
        let mut walk_errors = 0;
        let mut warnings = Vec::new();
        let mut tracker = ProgressTracker::new(start);

        for entry_result in walker {
            if cancel.is_cancelled() {
                tracing::info!(root = %root_path.display(), "indexing cancelled");
                return Err(ScanError::Interrupted);
            }

            let entry = match entry_result {
                Ok(e) => e,
                Err(err) => {
                    let path = err.path().map(|p| p.to_path_buf()).unwrap_or_default();
                    tracing::debug!(path = %path.display(), error = %err, "skipping unreadable entry");
                    warnings.push(walk_warning(path, &err));
                    walk_errors += 1;
                    tracker.record_error();
                    continue;
                }
            };

            let file_type = entry.file_type();
            if file_type.is_dir() {
                // jwalk reports a directory it cannot list on the entry itself.
                if let Some(err) = &entry.read_children_error {
                    let path = entry.path();
                    tracing::warn!(path = %path.display(), error = %err, "skipping unreadable directory");
                    warnings.push(walk_warning(path, err));
                    walk_errors += 1;
                    tracker.record_error();
                }
                continue;
            }

            let path = entry.path();
            tracker.record_file(path.clone());
            if tracker.files_seen() % PROGRESS_INTERVAL == 0 {
                let _ = self.progress_tx.send(tracker.snapshot());
            }

            if !file_type.is_file() {
                // Unfollowed symlinks, sockets, devices.
                tracing::debug!(path = %path.display(), "not a regular file");
                continue;
            }

            let size = match entry.metadata() {
                Ok(m) => m.len(),
                Err(err) => {
                    let warning = match err.io_error() {
                        Some(source) => ScanWarning::metadata(&path, source),
                        None => ScanWarning::new(&path, err.to_string(), WarningKind::MetadataError),
                    };
                    tracing::debug!(path = %path.display(), error = %err, "size unreadable");
                    warnings.push(warning);
                    skipped_files += 1;
                    tracker.record_error();
                    continue;
                }
            };

            if size < config.min_size {
                continue;
            }

            index.insert(FileRecord::new(path, size));
        }

        let total_files = tracker.files_seen();
        index.retain_candidates();

        tracing::info!(
            root = %root_path.display(),
            total_files,
            walk_errors,
            buckets = index.len(),
            candidates = index.file_count(),
            "indexing complete"
        );

        let _ = self.progress_tx.send(tracker.snapshot());

        Ok(IndexOutcome {
            root: root_path,
            index,
            total_files,
            skipped_files,
            walk_errors,
            warnings,
        })
    }
}

impl Default for SizeIndexer {
    fn default() -> Self {
        Self::new()
    }
}

/// Classify a jwalk error, keeping permission problems distinct.
fn walk_warning(path: PathBuf, err: &jwalk::Error) -> ScanWarning {
    match err.io_error() {
        Some(source) => ScanWarning::walk(path, source),
        None => ScanWarning::new(path, err.to_string(), WarningKind::WalkError),
    }
}

/// Resolve the root and make sure it can be listed.
fn check_root(root: &Path) -> Result<PathBuf, ScanError> {
    let root_path = root.canonicalize().map_err(|e| ScanError::io(root, e))?;

    if !root_path.is_dir() {
        return Err(ScanError::NotADirectory { path: root_path });
    }

    std::fs::read_dir(&root_path).map_err(|e| ScanError::io(&root_path, e))?;

    Ok(root_path)
}
