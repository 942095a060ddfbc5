//! Moving duplicates into a quarantine directory.

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

/// Default quarantine directory name, created under the scanned root.
pub const QUARANTINE_DIR_NAME: &str = "Deleted_Duplicates";

/// Names tried before giving up when destinations keep appearing.
const MAX_NAME_ATTEMPTS: usize = 100;

/// Errors from quarantining a single file.
#[derive(Debug, Error)]
pub enum QuarantineError {
    /// The quarantine directory could not be created.
    #[error("Failed to create quarantine directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The path has no file name to reuse.
    #[error("Path has no file name: {path}")]
    NoFileName { path: PathBuf },

    /// The path is not a regular file.
    #[error("Not a regular file: {path}")]
    NotAFile { path: PathBuf },

    /// The move itself failed.
    #[error("Failed to move {from} to {to}: {source}")]
    Move {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A file that could not be quarantined.
#[derive(Debug, Clone, Serialize)]
pub struct QuarantineFailure {
    /// Path that was not moved.
    pub path: PathBuf,
    /// Why it failed.
    pub message: String,
}

/// Outcome of a batch move.
#[derive(Debug, Clone, Default, Serialize)]
pub struct QuarantineSummary {
    /// `(original, destination)` pairs that were moved.
    pub moved: Vec<(PathBuf, PathBuf)>,
    /// Files that stayed in place.
    pub errors: Vec<QuarantineFailure>,
}

impl QuarantineSummary {
    /// Number of files moved.
    pub fn moved_count(&self) -> usize {
        self.moved.len()
    }

    /// Check if any file failed.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Record the result of moving one file.
    pub fn record(&mut self, path: PathBuf, result: Result<PathBuf, QuarantineError>) {
        match result {
            Ok(dest) => self.moved.push((path, dest)),
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "quarantine failed");
                self.errors.push(QuarantineFailure {
                    message: err.to_string(),
                    path,
                });
            }
        }
    }
}

/// Destination directory for removed duplicates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quarantine {
    dir: PathBuf,
}

impl Quarantine {
    /// Quarantine into a custom directory.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Quarantine into `<root>/Deleted_Duplicates`.
    pub fn for_root(root: &Path) -> Self {
        Self::new(root.join(QUARANTINE_DIR_NAME))
    }

    /// Get the quarantine directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Move one file into quarantine, returning where it landed.
    ///
    /// A name already taken in quarantine gets `_1`, `_2`, ... inserted
    /// before the extension.
    pub fn move_file(&self, path: &Path) -> Result<PathBuf, QuarantineError> {
        let file_name = path
            .file_name()
            .ok_or_else(|| QuarantineError::NoFileName {
                path: path.to_path_buf(),
            })?;

        if !path.is_file() {
            return Err(QuarantineError::NotAFile {
                path: path.to_path_buf(),
            });
        }

        fs::create_dir_all(&self.dir).map_err(|source| QuarantineError::CreateDir {
            path: self.dir.clone(),
            source,
        })?;

        let mut attempts = 0;
        loop {
            let dest = quarantine_path(&self.dir, file_name);
            match move_no_clobber(path, &dest) {
                Ok(()) => {
                    tracing::debug!(from = %path.display(), to = %dest.display(), "quarantined");
                    return Ok(dest);
                }
                // Someone took the name after it was picked.
                Err(e) if e.kind() == ErrorKind::AlreadyExists && attempts < MAX_NAME_ATTEMPTS => {
                    attempts += 1;
                }
                Err(source) => {
                    return Err(QuarantineError::Move {
                        from: path.to_path_buf(),
                        to: dest,
                        source,
                    });
                }
            }
        }
    }

    /// Move every path, collecting failures instead of stopping.
    pub fn move_batch(&self, paths: &[PathBuf]) -> QuarantineSummary {
        let mut summary = QuarantineSummary::default();

        for path in paths {
            summary.record(path.clone(), self.move_file(path));
        }

        summary
    }
}

/// Pick a free destination for `file_name` inside `dir`.
///
/// For "file.txt", tries "file.txt", "file_1.txt", "file_2.txt", etc. Any
/// existing entry, including a dangling symlink, makes a name taken.
pub fn quarantine_path(dir: &Path, file_name: &std::ffi::OsStr) -> PathBuf {
    let candidate = dir.join(file_name);
    if !is_taken(&candidate) {
        return candidate;
    }

    let name = Path::new(file_name);
    let stem = name.file_stem().unwrap_or(file_name);
    let extension = name.extension();

    let mut counter: u64 = 1;
    loop {
        let mut new_name = OsString::from(stem);
        new_name.push(format!("_{counter}"));
        if let Some(ext) = extension {
            new_name.push(".");
            new_name.push(ext);
        }

        let new_path = dir.join(&new_name);
        if !is_taken(&new_path) {
            return new_path;
        }
        counter += 1;
    }
}

fn is_taken(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

/// Move `from` to `to`, failing with `AlreadyExists` instead of replacing
/// whatever is at `to`.
///
/// Links then unlinks on the same filesystem; copies into a freshly created
/// file when linking is not possible.
fn move_no_clobber(from: &Path, to: &Path) -> io::Result<()> {
    match fs::hard_link(from, to) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::AlreadyExists => return Err(e),
        Err(e) => {
            tracing::debug!(from = %from.display(), error = %e, "link failed, copying");
            copy_new(from, to)?;
        }
    }

    if let Err(e) = fs::remove_file(from) {
        let _ = fs::remove_file(to);
        return Err(e);
    }
    Ok(())
}

/// Copy into a file that must not exist yet.
fn copy_new(from: &Path, to: &Path) -> io::Result<()> {
    let mut source = File::open(from)?;
    let mut dest = OpenOptions::new().write(true).create_new(true).open(to)?;

    let copied = io::copy(&mut source, &mut dest)
        .and_then(|_| dest.sync_all())
        .and_then(|()| fs::set_permissions(to, source.metadata()?.permissions()));
    if copied.is_err() {
        let _ = fs::remove_file(to);
    }
    copied
}
