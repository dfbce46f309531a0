//! Streaming content hashing.
//!
//! Files are read in fixed-size chunks so memory use does not depend on
//! file size. SHA-256 is the default digest; BLAKE3 is available as a
//! faster alternative with the same 32-byte output.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use strum::{Display, EnumString};
use thiserror::Error;

use tidyfile_core::ContentHash;

/// Default read chunk size.
pub const DEFAULT_CHUNK_SIZE: usize = 256 * 1024;
/// Smallest accepted chunk size.
pub const MIN_CHUNK_SIZE: usize = 64 * 1024;
/// Largest accepted chunk size.
pub const MAX_CHUNK_SIZE: usize = 1024 * 1024;

/// Digest algorithm used for content hashes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum HashAlgorithm {
    /// SHA-256.
    #[default]
    Sha256,
    /// BLAKE3.
    Blake3,
}

/// Errors from hashing a single file.
#[derive(Debug, Error)]
pub enum HashError {
    /// The file could not be opened or read.
    #[error("Failed to read {path}: {source}")]
    Access {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl HashError {
    fn access(path: &Path, source: io::Error) -> Self {
        Self::Access {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Path of the file that failed.
    pub fn path(&self) -> &Path {
        match self {
            Self::Access { path, .. } => path,
        }
    }
}

/// Incremental digest state for either algorithm.
enum StreamHasher {
    Sha256(Sha256),
    Blake3(Box<blake3::Hasher>),
}

impl StreamHasher {
    fn new(algorithm: HashAlgorithm) -> Self {
        match algorithm {
            HashAlgorithm::Sha256 => Self::Sha256(Sha256::new()),
            HashAlgorithm::Blake3 => Self::Blake3(Box::new(blake3::Hasher::new())),
        }
    }

    fn update(&mut self, data: &[u8]) {
        match self {
            Self::Sha256(h) => h.update(data),
            Self::Blake3(h) => {
                h.update(data);
            }
        }
    }

    fn finalize(self) -> ContentHash {
        match self {
            Self::Sha256(h) => ContentHash::new(h.finalize().into()),
            Self::Blake3(h) => ContentHash::new(*h.finalize().as_bytes()),
        }
    }
}

/// Chunked file hasher.
#[derive(Debug, Clone, Copy)]
pub struct ContentHasher {
    algorithm: HashAlgorithm,
    chunk_size: usize,
}

impl ContentHasher {
    /// SHA-256 hasher with the default chunk size.
    pub fn new() -> Self {
        Self::with_algorithm(HashAlgorithm::default())
    }

    /// Hasher for the given algorithm.
    pub fn with_algorithm(algorithm: HashAlgorithm) -> Self {
        Self {
            algorithm,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Set the read chunk size, clamped to 64 KiB..=1 MiB.
    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.clamp(MIN_CHUNK_SIZE, MAX_CHUNK_SIZE);
        self
    }

    /// Algorithm in use.
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Hash the full content of a file.
    pub fn hash(&self, path: &Path) -> Result<ContentHash, HashError> {
        let file = File::open(path).map_err(|e| HashError::access(path, e))?;
        self.hash_reader(file).map_err(|e| HashError::access(path, e))
    }

    /// Hash everything readable from `reader`.
    pub fn hash_reader<R: Read>(&self, mut reader: R) -> io::Result<ContentHash> {
        let mut hasher = StreamHasher::new(self.algorithm);
        let mut buffer = vec![0u8; self.chunk_size];

        loop {
            let bytes_read = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            hasher.update(&buffer[..bytes_read]);
        }

        Ok(hasher.finalize())
    }

    /// Hash the first `head` and last `tail` bytes plus the file length.
    ///
    /// Used to rule out same-size files cheaply before a full hash.
    pub fn partial_hash(
        &self,
        path: &Path,
        head: usize,
        tail: usize,
    ) -> Result<ContentHash, HashError> {
        let read = || -> io::Result<ContentHash> {
            let mut file = File::open(path)?;
            let file_size = file.metadata()?.len();
            let mut hasher = StreamHasher::new(self.algorithm);

            let head_size = (head as u64).min(file_size);
            let mut head_buf = vec![0u8; head_size as usize];
            file.read_exact(&mut head_buf)?;
            hasher.update(&head_buf);

            if file_size > head_size {
                let tail_size = (tail as u64).min(file_size - head_size);
                if tail_size > 0 {
                    file.seek(SeekFrom::End(-(tail_size as i64)))?;
                    let mut tail_buf = vec![0u8; tail_size as usize];
                    file.read_exact(&mut tail_buf)?;
                    hasher.update(&tail_buf);
                }
            }

            hasher.update(&file_size.to_le_bytes());
            Ok(hasher.finalize())
        };

        read().map_err(|e| HashError::access(path, e))
    }
}

impl Default for ContentHasher {
    fn default() -> Self {
        Self::new()
    }
}
