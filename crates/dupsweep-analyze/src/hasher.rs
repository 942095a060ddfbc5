//! Streaming content hashing.

use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

use blake3::Hasher as Blake3;
use tokio_util::sync::CancellationToken;

use dupsweep_core::{Digest, ReadError, DEFAULT_CHUNK_SIZE};

/// Digest of one file plus the number of bytes read to compute it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileDigest {
    pub digest: Digest,
    pub bytes: u64,
}

/// BLAKE3 file hasher reading in fixed-size chunks.
///
/// Memory use is one chunk buffer per call, whatever the file size.
#[derive(Debug, Clone)]
pub struct Hasher {
    chunk_size: usize,
}

impl Hasher {
    /// Create a hasher with the default 8 KiB chunk.
    pub fn new() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Create a hasher with a custom chunk size (at least one byte).
    pub fn with_chunk_size(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
        }
    }

    /// Get the chunk size.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Compute the digest of a file.
    pub fn digest(&self, path: &Path) -> Result<Digest, ReadError> {
        self.hash_file(path, &CancellationToken::new())
            .map(|hashed| hashed.digest)
    }

    /// Compute the digest of a file, checking `cancel` between chunks.
    pub fn hash_file(
        &self,
        path: &Path,
        cancel: &CancellationToken,
    ) -> Result<FileDigest, ReadError> {
        let mut file = File::open(path).map_err(|source| ReadError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        let mut hasher = Blake3::new();
        let mut buffer = vec![0u8; self.chunk_size];
        let mut bytes = 0u64;

        loop {
            if cancel.is_cancelled() {
                return Err(ReadError::Cancelled {
                    path: path.to_path_buf(),
                });
            }

            let read = match file.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(source) => {
                    return Err(ReadError::Read {
                        path: path.to_path_buf(),
                        source,
                    })
                }
            };

            hasher.update(&buffer[..read]);
            bytes += read as u64;
        }

        Ok(FileDigest {
            digest: Digest::new(*hasher.finalize().as_bytes()),
            bytes,
        })
    }
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new()
    }
}
