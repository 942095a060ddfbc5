//! Scan progress reporting.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use dupsweep_core::ScanPhase;

/// Progress snapshot broadcast while a scan runs.
#[derive(Debug, Clone)]
pub struct ScanProgress {
    /// Phase the scan is in.
    pub phase: ScanPhase,
    /// Non-directory entries seen by the walk so far.
    pub files_seen: u64,
    /// Files hashed so far.
    pub files_hashed: u64,
    /// Size buckets resolved so far.
    pub buckets_done: u64,
    /// Size buckets to resolve (0 while indexing).
    pub buckets_total: u64,
    /// Bytes hashed so far.
    pub bytes_hashed: u64,
    /// Path most recently visited.
    pub current_path: PathBuf,
    /// Number of warnings so far.
    pub errors_count: u64,
    /// Time elapsed since the scan started.
    pub elapsed: Duration,
}

impl ScanProgress {
    /// Create initial progress state.
    pub fn new() -> Self {
        Self {
            phase: ScanPhase::Idle,
            files_seen: 0,
            files_hashed: 0,
            buckets_done: 0,
            buckets_total: 0,
            bytes_hashed: 0,
            current_path: PathBuf::new(),
            errors_count: 0,
            elapsed: Duration::ZERO,
        }
    }

    /// Fraction of buckets resolved (0.0 to 1.0).
    pub fn resolve_fraction(&self) -> f64 {
        if self.buckets_total > 0 {
            self.buckets_done as f64 / self.buckets_total as f64
        } else {
            0.0
        }
    }

    /// Walk rate in entries per second.
    pub fn files_per_second(&self) -> f64 {
        if self.elapsed.as_secs_f64() > 0.0 {
            self.files_seen as f64 / self.elapsed.as_secs_f64()
        } else {
            0.0
        }
    }
}

impl Default for ScanProgress {
    fn default() -> Self {
        Self::new()
    }
}

/// Walk-side progress tracker with timing.
#[derive(Debug)]
pub(crate) struct ProgressTracker {
    start_time: Instant,
    files_seen: u64,
    errors_count: u64,
    current_path: PathBuf,
}

impl ProgressTracker {
    pub fn new(start_time: Instant) -> Self {
        Self {
            start_time,
            files_seen: 0,
            errors_count: 0,
            current_path: PathBuf::new(),
        }
    }

    pub fn record_file(&mut self, path: PathBuf) {
        self.files_seen += 1;
        self.current_path = path;
    }

    pub fn record_error(&mut self) {
        self.errors_count += 1;
    }

    pub fn files_seen(&self) -> u64 {
        self.files_seen
    }

    pub fn snapshot(&self) -> ScanProgress {
        ScanProgress {
            phase: ScanPhase::Indexing,
            files_seen: self.files_seen,
            current_path: self.current_path.clone(),
            errors_count: self.errors_count,
            elapsed: self.start_time.elapsed(),
            ..ScanProgress::new()
        }
    }
}
