//! Async quarantine batches with progress reporting.

use std::path::PathBuf;

use tokio::sync::mpsc;

use crate::quarantine::{Quarantine, QuarantineSummary};
use crate::OPERATION_CHANNEL_SIZE;

/// Result sent through the channel during a quarantine batch.
#[derive(Debug)]
pub enum QuarantineEvent {
    /// One file was processed.
    Progress {
        completed: usize,
        total: usize,
        current: PathBuf,
    },
    /// The batch completed.
    Complete(QuarantineSummary),
}

/// Start moving `paths` into quarantine on a blocking worker.
///
/// Returns a receiver for progress updates and the final summary.
pub fn start_quarantine(
    paths: Vec<PathBuf>,
    quarantine: Quarantine,
) -> mpsc::Receiver<QuarantineEvent> {
    let (tx, rx) = mpsc::channel(OPERATION_CHANNEL_SIZE);

    tokio::task::spawn_blocking(move || {
        let total = paths.len();
        let mut summary = QuarantineSummary::default();

        for (i, path) in paths.into_iter().enumerate() {
            let result = quarantine.move_file(&path);
            summary.record(path.clone(), result);

            let _ = tx.blocking_send(QuarantineEvent::Progress {
                completed: i + 1,
                total,
                current: path,
            });
        }

        let _ = tx.blocking_send(QuarantineEvent::Complete(summary));
    });

    rx
}
