//! Per-scan counters and scan lifecycle.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum::Display;

/// Lifecycle of a scan.
///
/// `Idle → Indexing → Resolving → Done`. A failed or cancelled scan returns
/// to `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
pub enum ScanPhase {
    /// No scan running.
    #[default]
    Idle,
    /// Walking the tree and grouping files by size.
    Indexing,
    /// Hashing size buckets and grouping by digest.
    Resolving,
    /// Scan finished; stats are final.
    Done,
}

/// Counters for a single scan run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanStats {
    /// Every non-directory entry visited, whether or not it was grouped.
    pub total_files: u64,
    /// Files whose digest was actually computed.
    pub scanned_files: u64,
    /// Entries whose size could not be read.
    pub skipped_files: u64,
    /// Files that failed while hashing.
    pub failed_files: u64,
    /// Walk entries and directories that could not be read.
    pub walk_errors: u64,
    /// Size buckets with two or more files.
    pub size_buckets: u64,
    /// Bytes fed to the hasher.
    pub bytes_hashed: u64,
    /// Wall-clock time of the scan.
    pub elapsed: Duration,
}

impl ScanStats {
    /// Create new zeroed stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset every counter for a new scan.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Number of recoverable problems during the scan.
    pub fn error_count(&self) -> u64 {
        self.skipped_files + self.failed_files + self.walk_errors
    }

    /// Hashing throughput in bytes per second.
    pub fn bytes_per_second(&self) -> f64 {
        if self.elapsed.as_secs_f64() > 0.0 {
            self.bytes_hashed as f64 / self.elapsed.as_secs_f64()
        } else {
            0.0
        }
    }
}
