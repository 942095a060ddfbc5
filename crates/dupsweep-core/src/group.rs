//! Duplicate groups and the merged result of a scan.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::digest::Digest;

/// A group of files sharing the same content.
///
/// The first path is treated as the original to keep. This is walk
/// discovery order, not age or any other property of the files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateGroup {
    /// Digest shared by all files in this group.
    pub digest: Digest,

    /// Size of each file in bytes.
    pub size: u64,

    /// Paths to all copies, in discovery order.
    pub paths: Vec<PathBuf>,
}

impl DuplicateGroup {
    /// Create a new group.
    pub fn new(digest: Digest, size: u64, paths: Vec<PathBuf>) -> Self {
        Self { digest, size, paths }
    }

    /// Get the number of copies.
    pub fn count(&self) -> usize {
        self.paths.len()
    }

    /// The copy kept when the others are removed.
    pub fn original(&self) -> Option<&Path> {
        self.paths.first().map(PathBuf::as_path)
    }

    /// Every copy except the original.
    pub fn duplicates(&self) -> &[PathBuf] {
        self.paths.get(1..).unwrap_or(&[])
    }

    /// Check if keeping one file, how many could be deleted.
    pub fn deletable_count(&self) -> usize {
        self.paths.len().saturating_sub(1)
    }

    /// Space reclaimed by removing every duplicate: size * (count - 1).
    pub fn wasted_bytes(&self) -> u64 {
        self.size * self.deletable_count() as u64
    }
}

/// All duplicate groups found by one scan, keyed by digest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateSet {
    groups: IndexMap<Digest, DuplicateGroup>,
}

impl DuplicateSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a group into the set.
    ///
    /// A group whose digest is already present has its paths appended to the
    /// existing group, so the digest stays the unique key.
    pub fn merge(&mut self, group: DuplicateGroup) {
        match self.groups.get_mut(&group.digest) {
            Some(existing) => existing.paths.extend(group.paths),
            None => {
                self.groups.insert(group.digest, group);
            }
        }
    }

    /// Look up a group by digest.
    pub fn get(&self, digest: &Digest) -> Option<&DuplicateGroup> {
        self.groups.get(digest)
    }

    /// Find the group containing a path.
    pub fn group_of(&self, path: &Path) -> Option<&DuplicateGroup> {
        self.groups
            .values()
            .find(|g| g.paths.iter().any(|p| p == path))
    }

    /// Iterate over the groups in merge order.
    pub fn groups(&self) -> impl Iterator<Item = &DuplicateGroup> {
        self.groups.values()
    }

    /// Number of groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Check if no duplicates were found.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Total number of files across all groups.
    pub fn file_count(&self) -> usize {
        self.groups.values().map(DuplicateGroup::count).sum()
    }

    /// Total reclaimable space across all groups.
    pub fn wasted_bytes(&self) -> u64 {
        self.groups.values().map(DuplicateGroup::wasted_bytes).sum()
    }

    /// Every removal candidate across all groups.
    pub fn removal_candidates(&self) -> Vec<PathBuf> {
        self.groups
            .values()
            .flat_map(|g| g.duplicates().iter().cloned())
            .collect()
    }

    /// Consume the set into a digest → paths mapping.
    pub fn into_paths(self) -> IndexMap<Digest, Vec<PathBuf>> {
        self.groups
            .into_iter()
            .map(|(digest, group)| (digest, group.paths))
            .collect()
    }
}

impl FromIterator<DuplicateGroup> for DuplicateSet {
    fn from_iter<I: IntoIterator<Item = DuplicateGroup>>(iter: I) -> Self {
        let mut set = Self::new();
        for group in iter {
            set.merge(group);
        }
        set
    }
}
