//! Confirms duplicates within one size bucket by content digest.

use std::path::PathBuf;

use indexmap::IndexMap;
use tokio_util::sync::CancellationToken;

use dupsweep_core::{Digest, DuplicateGroup, ScanError, ScanWarning};

use crate::hasher::Hasher;

/// Result of resolving one size bucket.
#[derive(Debug, Clone, Default)]
pub struct BucketOutcome {
    /// Groups of two or more identical files, in first-seen digest order.
    pub groups: Vec<DuplicateGroup>,
    /// Files successfully hashed.
    pub hashed: u64,
    /// Bytes read while hashing.
    pub bytes_hashed: u64,
    /// Files that could not be hashed.
    pub failures: Vec<ScanWarning>,
}

/// Hashes same-size files and groups them by digest.
#[derive(Debug, Clone, Default)]
pub struct DuplicateResolver {
    hasher: Hasher,
}

impl DuplicateResolver {
    /// Create a resolver using the given hasher.
    pub fn new(hasher: Hasher) -> Self {
        Self { hasher }
    }

    /// Hash every path of a size bucket and keep digests shared by two or
    /// more files.
    ///
    /// Unreadable files are reported in [`BucketOutcome::failures`] and left
    /// out. Only cancellation is an error.
    pub fn resolve(
        &self,
        size: u64,
        paths: &[PathBuf],
        cancel: &CancellationToken,
    ) -> Result<BucketOutcome, ScanError> {
        let mut by_digest: IndexMap<Digest, Vec<PathBuf>> = IndexMap::new();
        let mut outcome = BucketOutcome::default();

        for path in paths {
            if cancel.is_cancelled() {
                return Err(ScanError::Interrupted);
            }

            match self.hasher.hash_file(path, cancel) {
                Ok(hashed) => {
                    by_digest.entry(hashed.digest).or_default().push(path.clone());
                    outcome.hashed += 1;
                    outcome.bytes_hashed += hashed.bytes;
                }
                Err(err) if err.is_cancelled() => return Err(ScanError::Interrupted),
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "skipping unreadable file");
                    outcome.failures.push(ScanWarning::from(&err));
                }
            }
        }

        outcome.groups = by_digest
            .into_iter()
            .filter(|(_, paths)| paths.len() > 1)
            .map(|(digest, paths)| DuplicateGroup::new(digest, size, paths))
            .collect();

        Ok(outcome)
    }
}
