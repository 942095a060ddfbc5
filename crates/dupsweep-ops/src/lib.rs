//! File operations for dupsweep.
//!
//! Duplicates are never deleted outright: they are moved into a quarantine
//! directory (by default `Deleted_Duplicates` under the scanned root) where
//! they can be reviewed and restored. Name clashes inside quarantine are
//! resolved by appending an incrementing number before the extension.
//!
//! The scan engine never calls into this crate; it only supplies the
//! candidate paths.

mod batch;
mod quarantine;

pub use batch::{start_quarantine, QuarantineEvent};
pub use quarantine::{
    quarantine_path, Quarantine, QuarantineError, QuarantineFailure, QuarantineSummary,
    QUARANTINE_DIR_NAME,
};

/// Default channel buffer size for quarantine progress updates.
pub const OPERATION_CHANNEL_SIZE: usize = 100;
