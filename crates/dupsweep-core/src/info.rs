//! File metadata for presenting duplicates.

use std::path::Path;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

const SIZE_UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

/// Metadata shown next to a duplicate path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    /// Size in bytes.
    pub size: u64,
    /// Last modification time.
    pub modified: DateTime<Local>,
    /// Creation time, when the platform reports one.
    pub created: Option<DateTime<Local>>,
    /// Size formatted with [`format_size`].
    pub size_readable: String,
}

/// Read display metadata for a path.
///
/// Returns `None` if the file cannot be stat'ed.
pub fn file_info(path: &Path) -> Option<FileInfo> {
    let metadata = std::fs::metadata(path).ok()?;
    let modified = metadata.modified().ok()?;
    let size = metadata.len();

    Some(FileInfo {
        size,
        modified: DateTime::<Local>::from(modified),
        created: metadata.created().ok().map(DateTime::<Local>::from),
        size_readable: format_size(size),
    })
}

/// Format a byte count with binary units and two decimals.
///
/// `0` is rendered as `"0B"`; anything else as e.g. `"1.50 KB"`. Values of
/// a terabyte and more stay in GB.
pub fn format_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0B".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    format!("{value:.2} {}", SIZE_UNITS[unit])
}
