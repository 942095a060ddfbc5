//! Walk output: file records and size buckets.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A regular file discovered during the walk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Path to the file.
    pub path: PathBuf,
    /// Size in bytes.
    pub size: u64,
}

impl FileRecord {
    /// Create a new file record.
    pub fn new(path: impl Into<PathBuf>, size: u64) -> Self {
        Self {
            path: path.into(),
            size,
        }
    }
}

/// Files grouped by byte size, in discovery order.
///
/// Built incrementally during the walk; [`SizeIndex::retain_candidates`]
/// drops every size shared by fewer than two files.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SizeIndex {
    buckets: IndexMap<u64, Vec<PathBuf>>,
}

impl SizeIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a file under its size.
    pub fn insert(&mut self, record: FileRecord) {
        self.buckets.entry(record.size).or_default().push(record.path);
    }

    /// Drop buckets that cannot contain a duplicate.
    pub fn retain_candidates(&mut self) {
        self.buckets.retain(|_, paths| paths.len() > 1);
    }

    /// Paths recorded for a size.
    pub fn get(&self, size: u64) -> Option<&[PathBuf]> {
        self.buckets.get(&size).map(Vec::as_slice)
    }

    /// Check whether a path was recorded in any bucket.
    pub fn contains_path(&self, path: &Path) -> bool {
        self.buckets.values().any(|paths| paths.iter().any(|p| p == path))
    }

    /// Iterate over `(size, paths)` buckets.
    pub fn iter(&self) -> impl Iterator<Item = (u64, &[PathBuf])> {
        self.buckets.iter().map(|(size, paths)| (*size, paths.as_slice()))
    }

    /// Number of buckets.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Check if the index has no buckets.
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Total number of paths across all buckets.
    pub fn file_count(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    /// Consume the index into its buckets.
    pub fn into_buckets(self) -> Vec<(u64, Vec<PathBuf>)> {
        self.buckets.into_iter().collect()
    }
}
