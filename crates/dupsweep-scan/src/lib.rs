//! Directory walking for dupsweep.
//!
//! This crate implements the first phase of a duplicate scan: walking a
//! directory tree with jwalk and grouping every regular file by byte size.
//! Sizes shared by fewer than two files are dropped, since a file with a
//! unique size cannot have a duplicate.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! use dupsweep_scan::{ScanConfig, SizeIndexer};
//! use tokio_util::sync::CancellationToken;
//!
//! let indexer = SizeIndexer::new();
//! let outcome = indexer
//!     .index(Path::new("/path/to/scan"), &ScanConfig::default(), &CancellationToken::new())
//!     .unwrap();
//!
//! for (size, paths) in outcome.index.iter() {
//!     println!("{size} bytes: {} candidates", paths.len());
//! }
//! ```
//!
//! # Progress Monitoring
//!
//! ```rust,no_run
//! use dupsweep_scan::SizeIndexer;
//!
//! let indexer = SizeIndexer::new();
//! let mut progress_rx = indexer.subscribe();
//!
//! tokio::spawn(async move {
//!     while let Ok(progress) = progress_rx.recv().await {
//!         println!("Seen {} files", progress.files_seen);
//!     }
//! });
//! ```

mod indexer;
mod progress;

pub use indexer::{IndexOutcome, SizeIndexer};
pub use progress::ScanProgress;

// Re-export core types for convenience
pub use dupsweep_core::{
    FileRecord, ScanConfig, ScanError, ScanPhase, ScanWarning, SizeIndex, WarningKind,
};
