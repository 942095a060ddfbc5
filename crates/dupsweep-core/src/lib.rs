//! Core types and traits for dupsweep.
//!
//! This crate provides the data structures shared by the scanning, analysis
//! and file operation crates: size buckets, duplicate groups, content
//! digests, per-scan statistics, configuration and error types.

mod config;
mod digest;
mod error;
mod group;
mod info;
mod record;
mod stats;

pub use config::{ScanConfig, ScanConfigBuilder, DEFAULT_CHUNK_SIZE};
pub use digest::{Digest, DigestParseError};
pub use error::{ReadError, ScanError, ScanWarning, WarningKind};
pub use group::{DuplicateGroup, DuplicateSet};
pub use info::{file_info, format_size, FileInfo};
pub use record::{FileRecord, SizeIndex};
pub use stats::{ScanPhase, ScanStats};
