//! Background scanning with channel-based progress.

use std::path::PathBuf;

use serde::Serialize;
use tokio::sync::mpsc;

use dupsweep_core::{DuplicateSet, ScanError, ScanStats, ScanWarning};
use dupsweep_scan::ScanProgress;

use crate::coordinator::ScanCoordinator;

/// Channel buffer size for background scan events.
pub const SCAN_CHANNEL_SIZE: usize = 100;

/// Everything a finished scan produced.
#[derive(Debug, Clone, Serialize)]
pub struct ScanOutcome {
    /// Canonical root that was scanned.
    pub root: PathBuf,
    /// Counters for the scan.
    pub stats: ScanStats,
    /// Recoverable problems, in the order they were met.
    pub warnings: Vec<ScanWarning>,
    /// Duplicate groups keyed by digest.
    pub duplicates: DuplicateSet,
}

impl ScanOutcome {
    /// Collect the outcome of the coordinator's most recent scan.
    pub fn from_coordinator(coordinator: &ScanCoordinator, duplicates: DuplicateSet) -> Self {
        Self {
            root: coordinator.root().map(PathBuf::from).unwrap_or_default(),
            stats: coordinator.stats().clone(),
            warnings: coordinator.warnings().to_vec(),
            duplicates,
        }
    }
}

/// Event sent while a background scan runs.
#[derive(Debug)]
pub enum ScanEvent {
    /// Progress update.
    Progress(ScanProgress),
    /// The scan finished.
    Complete(Result<ScanOutcome, ScanError>),
}

/// Start a scan on a blocking worker.
///
/// Returns a receiver that gets progress updates and then exactly one
/// [`ScanEvent::Complete`]. Grab [`ScanCoordinator::cancel_token`] before
/// calling this to be able to stop the scan. Must be called from within a
/// tokio runtime.
pub fn start_scan(root: PathBuf, mut coordinator: ScanCoordinator) -> mpsc::Receiver<ScanEvent> {
    let (tx, rx) = mpsc::channel(SCAN_CHANNEL_SIZE);

    tokio::spawn(async move {
        let mut progress_rx = coordinator.subscribe();

        // Forward progress updates
        let tx_progress = tx.clone();
        let progress_task = tokio::spawn(async move {
            while let Ok(progress) = progress_rx.recv().await {
                if tx_progress.send(ScanEvent::Progress(progress)).await.is_err() {
                    break;
                }
            }
        });

        // jwalk and rayon block, so keep them off the async workers
        let result = tokio::task::spawn_blocking(move || {
            coordinator
                .scan(&root)
                .map(|duplicates| ScanOutcome::from_coordinator(&coordinator, duplicates))
        })
        .await
        .unwrap_or_else(|e| {
            Err(ScanError::Other {
                message: e.to_string(),
            })
        });

        progress_task.abort();
        let _ = tx.send(ScanEvent::Complete(result)).await;
    });

    rx
}
