//! Duplicate detection for dupsweep.
//!
//! A scan runs in two phases:
//!
//! 1. Walk the tree and group files by size ([`dupsweep_scan::SizeIndexer`])
//! 2. Hash every file of each size bucket with two or more members and group
//!    by BLAKE3 digest ([`DuplicateResolver`]), in parallel across buckets
//!
//! Files with a unique size are never read. [`ScanCoordinator`] chains the
//! two phases and keeps the counters for the most recent scan.
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! use dupsweep_analyze::{ScanConfig, ScanCoordinator};
//!
//! let mut coordinator = ScanCoordinator::new(ScanConfig::default());
//! let duplicates = coordinator.scan(Path::new("/path/to/scan")).unwrap();
//!
//! for group in duplicates.groups() {
//!     println!("{} copies of {} bytes", group.count(), group.size);
//! }
//! println!("Hashed {} of {} files", coordinator.stats().scanned_files, coordinator.stats().total_files);
//! ```
//!
//! # Background Scans
//!
//! [`start_scan`] runs the coordinator on a blocking worker and streams
//! progress over a channel, ending with a single completion event.

mod background;
mod coordinator;
mod hasher;
mod resolver;

pub use background::{start_scan, ScanEvent, ScanOutcome, SCAN_CHANNEL_SIZE};
pub use coordinator::ScanCoordinator;
pub use hasher::{FileDigest, Hasher};
pub use resolver::{BucketOutcome, DuplicateResolver};

// Re-export core types
pub use dupsweep_core::{
    Digest, DuplicateGroup, DuplicateSet, ReadError, ScanConfig, ScanError, ScanPhase, ScanStats,
    ScanWarning, WarningKind,
};
pub use dupsweep_scan::ScanProgress;
