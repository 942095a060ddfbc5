//! Two-phase scan: size indexing, then digest resolution per bucket.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use rayon::prelude::*;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use dupsweep_core::{DuplicateSet, ScanConfig, ScanError, ScanPhase, ScanStats, ScanWarning};
use dupsweep_scan::{ScanProgress, SizeIndexer};

use crate::hasher::Hasher;
use crate::resolver::{BucketOutcome, DuplicateResolver};

/// Runs duplicate scans and owns the per-scan state.
///
/// Stats and warnings describe the most recent scan and are reset when the
/// next one starts, so one coordinator can be reused across scans.
pub struct ScanCoordinator {
    config: ScanConfig,
    phase: ScanPhase,
    stats: ScanStats,
    warnings: Vec<ScanWarning>,
    root: Option<PathBuf>,
    progress_tx: broadcast::Sender<ScanProgress>,
    cancel: CancellationToken,
}

impl ScanCoordinator {
    /// Create a coordinator with the given configuration.
    pub fn new(config: ScanConfig) -> Self {
        let (progress_tx, _) = broadcast::channel(100);
        Self {
            config,
            phase: ScanPhase::Idle,
            stats: ScanStats::new(),
            warnings: Vec::new(),
            root: None,
            progress_tx,
            cancel: CancellationToken::new(),
        }
    }

    /// Subscribe to progress updates for both phases.
    pub fn subscribe(&self) -> broadcast::Receiver<ScanProgress> {
        self.progress_tx.subscribe()
    }

    /// Token that stops the current or next scan when cancelled.
    ///
    /// A cancelled scan installs a fresh token, so fetch the token again
    /// before the next scan.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Get the configuration.
    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> ScanPhase {
        self.phase
    }

    /// Counters from the most recent scan.
    pub fn stats(&self) -> &ScanStats {
        &self.stats
    }

    /// Recoverable problems from the most recent scan.
    pub fn warnings(&self) -> &[ScanWarning] {
        &self.warnings
    }

    /// Canonical root of the most recent successful scan.
    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    /// Scan `root` for files with identical content.
    ///
    /// Blocks until both phases finish. Unreadable files are skipped and
    /// recorded as warnings; the scan only fails if the root cannot be
    /// walked or the scan is cancelled, in which case partial results are
    /// discarded.
    pub fn scan(&mut self, root: &Path) -> Result<DuplicateSet, ScanError> {
        self.config.validate()?;

        self.stats.reset();
        self.warnings.clear();
        self.root = None;

        let start = Instant::now();
        let result = self.run(root, start);
        self.stats.elapsed = start.elapsed();

        match result {
            Ok(duplicates) => {
                self.phase = ScanPhase::Done;
                let _ = self.progress_tx.send(self.snapshot(start, ScanPhase::Done));
                tracing::info!(
                    total_files = self.stats.total_files,
                    scanned_files = self.stats.scanned_files,
                    groups = duplicates.len(),
                    elapsed_ms = self.stats.elapsed.as_millis() as u64,
                    "scan complete"
                );
                Ok(duplicates)
            }
            Err(err) => {
                self.phase = ScanPhase::Idle;
                if self.cancel.is_cancelled() {
                    self.cancel = CancellationToken::new();
                }
                tracing::info!(error = %err, "scan failed");
                Err(err)
            }
        }
    }

    fn run(&mut self, root: &Path, start: Instant) -> Result<DuplicateSet, ScanError> {
        self.phase = ScanPhase::Indexing;
        let indexer = SizeIndexer::with_sender(self.progress_tx.clone());
        let outcome = indexer.index(root, &self.config, &self.cancel)?;

        self.stats.total_files = outcome.total_files;
        self.stats.skipped_files = outcome.skipped_files;
        self.stats.walk_errors = outcome.walk_errors;
        self.stats.size_buckets = outcome.index.len() as u64;
        self.warnings.extend(outcome.warnings);

        self.phase = ScanPhase::Resolving;
        tracing::info!(buckets = self.stats.size_buckets, "resolving size buckets");

        let buckets = outcome.index.into_buckets();
        let resolver = DuplicateResolver::new(Hasher::with_chunk_size(self.config.chunk_size));
        let progress = ResolveProgress::new(&self.progress_tx, start, buckets.len() as u64);
        let cancel = &self.cancel;

        let resolve_bucket = |(size, paths): &(u64, Vec<PathBuf>)| {
            let bucket = resolver.resolve(*size, paths, cancel)?;
            progress.record(&bucket, paths.last());
            Ok::<_, ScanError>(bucket)
        };

        let resolved: Result<Vec<BucketOutcome>, ScanError> = if self.config.parallel {
            match self.config.threads {
                0 => buckets.par_iter().map(&resolve_bucket).collect(),
                n => rayon::ThreadPoolBuilder::new()
                    .num_threads(n)
                    .build()
                    .map_err(|e| ScanError::Other {
                        message: format!("Failed to build worker pool: {e}"),
                    })?
                    .install(|| buckets.par_iter().map(&resolve_bucket).collect()),
            }
        } else {
            buckets.iter().map(&resolve_bucket).collect()
        };

        // Merge in bucket order so parallel and sequential runs agree.
        let mut duplicates = DuplicateSet::new();
        for bucket in resolved? {
            self.stats.scanned_files += bucket.hashed;
            self.stats.bytes_hashed += bucket.bytes_hashed;
            self.stats.failed_files += bucket.failures.len() as u64;
            self.warnings.extend(bucket.failures);
            for group in bucket.groups {
                duplicates.merge(group);
            }
        }

        self.root = Some(outcome.root);
        Ok(duplicates)
    }

    fn snapshot(&self, start: Instant, phase: ScanPhase) -> ScanProgress {
        ScanProgress {
            phase,
            files_seen: self.stats.total_files,
            files_hashed: self.stats.scanned_files,
            buckets_done: self.stats.size_buckets,
            buckets_total: self.stats.size_buckets,
            bytes_hashed: self.stats.bytes_hashed,
            errors_count: self.warnings.len() as u64,
            elapsed: start.elapsed(),
            ..ScanProgress::new()
        }
    }
}

impl Default for ScanCoordinator {
    fn default() -> Self {
        Self::new(ScanConfig::default())
    }
}

/// Shared counters updated by resolver workers.
struct ResolveProgress<'a> {
    tx: &'a broadcast::Sender<ScanProgress>,
    start: Instant,
    buckets_total: u64,
    buckets_done: AtomicU64,
    files_hashed: AtomicU64,
    bytes_hashed: AtomicU64,
    errors: AtomicU64,
}

impl<'a> ResolveProgress<'a> {
    fn new(tx: &'a broadcast::Sender<ScanProgress>, start: Instant, buckets_total: u64) -> Self {
        Self {
            tx,
            start,
            buckets_total,
            buckets_done: AtomicU64::new(0),
            files_hashed: AtomicU64::new(0),
            bytes_hashed: AtomicU64::new(0),
            errors: AtomicU64::new(0),
        }
    }

    fn record(&self, bucket: &BucketOutcome, current: Option<&PathBuf>) {
        let done = self.buckets_done.fetch_add(1, Ordering::Relaxed) + 1;
        let files = self.files_hashed.fetch_add(bucket.hashed, Ordering::Relaxed) + bucket.hashed;
        let bytes =
            self.bytes_hashed.fetch_add(bucket.bytes_hashed, Ordering::Relaxed) + bucket.bytes_hashed;
        let failures = bucket.failures.len() as u64;
        let errors = self.errors.fetch_add(failures, Ordering::Relaxed) + failures;

        let _ = self.tx.send(ScanProgress {
            phase: ScanPhase::Resolving,
            files_hashed: files,
            buckets_done: done,
            buckets_total: self.buckets_total,
            bytes_hashed: bytes,
            current_path: current.cloned().unwrap_or_default(),
            errors_count: errors,
            elapsed: self.start.elapsed(),
            ..ScanProgress::new()
        });
    }
}
