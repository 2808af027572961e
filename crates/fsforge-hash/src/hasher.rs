//! Hashing engine: adaptive I/O strategy and the parallel batch driver.

use std::fs::{self, File};
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use derive_builder::Builder;
use memmap2::Mmap;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use fsforge_core::{CancelToken, HashError};

use crate::algorithm::Algorithm;
use crate::result::HashResult;

/// Files larger than this are memory-mapped instead of read in chunks.
pub const MMAP_THRESHOLD: u64 = 4 * 1024 * 1024;

/// Default buffer size for the chunked read path.
pub const DEFAULT_CHUNK_SIZE: usize = 1_048_576;

/// Callback invoked once per completed file, from worker threads.
///
/// Invocations may be concurrent; callers needing serialization must
/// arrange it themselves.
pub type HashCallback = dyn Fn(&HashResult) + Send + Sync;

/// Configuration for batch hashing.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into))]
pub struct HashOptions {
    /// Digest algorithm.
    #[builder(default)]
    #[serde(default)]
    pub algorithm: Algorithm,

    /// Buffer size for the chunked read path.
    #[builder(default = "DEFAULT_CHUNK_SIZE")]
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Worker pool size (None = hardware concurrency).
    #[builder(default)]
    #[serde(default)]
    pub max_workers: Option<usize>,
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

impl HashOptions {
    /// Create a new options builder.
    pub fn builder() -> HashOptionsBuilder {
        HashOptionsBuilder::default()
    }
}

impl Default for HashOptions {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::Blake3,
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_workers: None,
        }
    }
}

/// Hash a single file.
///
/// Files above [`MMAP_THRESHOLD`] are memory-mapped and digested in one
/// pass; smaller files are consumed through `chunk_size`-byte buffered
/// reads. A zero-byte file yields the algorithm's empty-input digest.
pub fn hash_file(
    path: impl AsRef<Path>,
    algorithm: Algorithm,
    chunk_size: usize,
) -> Result<HashResult, HashError> {
    hash_file_inner(path.as_ref(), algorithm, chunk_size)
}

/// Hash many files in parallel.
///
/// The batch runs on a rayon pool sized by `max_workers` (hardware
/// concurrency when unset). `callback` fires on worker threads once per
/// completed file, in completion order. Any per-file failure aborts the
/// call with a [`HashError`] naming the offending path; partial results
/// are discarded.
pub fn hash_files(
    paths: &[PathBuf],
    options: &HashOptions,
    callback: Option<&HashCallback>,
    cancel: Option<&CancelToken>,
) -> Result<Vec<HashResult>, HashError> {
    let run = || -> Vec<Result<HashResult, HashError>> {
        paths
            .par_iter()
            .map(|path| {
                if cancel.is_some_and(CancelToken::is_cancelled) {
                    return Err(HashError::Interrupted);
                }
                let result = hash_file_inner(path, options.algorithm, options.chunk_size)?;
                if let Some(cb) = callback {
                    cb(&result);
                }
                Ok(result)
            })
            .collect()
    };

    let results = match options.max_workers {
        Some(workers) => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(workers)
                .build()
                .map_err(|e| HashError::Pool {
                    message: e.to_string(),
                })?;
            pool.install(run)
        }
        None => run(),
    };

    results.into_iter().collect()
}

/// Hash the first and last `size` bytes of a file.
///
/// Used by duplicate detection to cheaply separate same-sized files before
/// committing to a whole-file digest. Files of at most `2 * size` bytes
/// are hashed whole instead, so the two regions never overlap.
pub fn partial_hash(
    path: impl AsRef<Path>,
    algorithm: Algorithm,
    size: usize,
) -> Result<String, HashError> {
    let path = path.as_ref();
    let metadata = fs::metadata(path).map_err(|e| HashError::io(path, e))?;
    let file_size = metadata.len();

    if file_size <= (size as u64) * 2 {
        return hash_buffered(path, algorithm, size.max(1));
    }

    let mut file = File::open(path).map_err(|e| HashError::io(path, e))?;
    let mut head = vec![0u8; size];
    let mut tail = vec![0u8; size];

    file.read_exact(&mut head).map_err(|e| HashError::io(path, e))?;
    file.seek(SeekFrom::End(-(size as i64)))
        .map_err(|e| HashError::io(path, e))?;
    file.read_exact(&mut tail).map_err(|e| HashError::io(path, e))?;

    Ok(match algorithm {
        Algorithm::Sha256 => {
            let mut hasher = Sha256::new();
            hasher.update(&head);
            hasher.update(&tail);
            format!("{:x}", hasher.finalize())
        }
        Algorithm::Blake3 => {
            let mut hasher = blake3::Hasher::new();
            hasher.update(&head);
            hasher.update(&tail);
            hasher.finalize().to_hex().to_string()
        }
    })
}

fn hash_file_inner(
    path: &Path,
    algorithm: Algorithm,
    chunk_size: usize,
) -> Result<HashResult, HashError> {
    let metadata = fs::metadata(path).map_err(|e| HashError::io(path, e))?;
    let file_size = metadata.len();

    let hash_hex = if file_size > MMAP_THRESHOLD {
        let file = File::open(path).map_err(|e| HashError::io(path, e))?;
        let mmap = mmap_file(path, &file)?;
        hash_bytes(&mmap, algorithm)
    } else {
        hash_buffered(path, algorithm, chunk_size.max(1))?
    };

    Ok(HashResult {
        path: path.to_path_buf(),
        algorithm,
        hash_hex,
        file_size,
    })
}

/// Digest a byte slice in one pass.
fn hash_bytes(data: &[u8], algorithm: Algorithm) -> String {
    match algorithm {
        Algorithm::Sha256 => {
            let mut hasher = Sha256::new();
            hasher.update(data);
            format!("{:x}", hasher.finalize())
        }
        Algorithm::Blake3 => blake3::hash(data).to_hex().to_string(),
    }
}

/// Digest a file through a buffered reader.
fn hash_buffered(path: &Path, algorithm: Algorithm, chunk_size: usize) -> Result<String, HashError> {
    let file = File::open(path).map_err(|e| HashError::io(path, e))?;
    let mut reader = BufReader::with_capacity(chunk_size, file);
    let mut buf = vec![0u8; chunk_size];

    match algorithm {
        Algorithm::Sha256 => {
            let mut hasher = Sha256::new();
            loop {
                let n = reader.read(&mut buf).map_err(|e| HashError::io(path, e))?;
                if n == 0 {
                    break;
                }
                hasher.update(&buf[..n]);
            }
            Ok(format!("{:x}", hasher.finalize()))
        }
        Algorithm::Blake3 => {
            let mut hasher = blake3::Hasher::new();
            loop {
                let n = reader.read(&mut buf).map_err(|e| HashError::io(path, e))?;
                if n == 0 {
                    break;
                }
                hasher.update(&buf[..n]);
            }
            Ok(hasher.finalize().to_hex().to_string())
        }
    }
}

/// Memory-map a file for read-only hashing.
///
/// The mapping is only valid while the file is not truncated or mutated;
/// callers needing a stable snapshot must arrange that externally.
fn mmap_file(path: &Path, file: &File) -> Result<Mmap, HashError> {
    unsafe { Mmap::map(file) }.map_err(|e| HashError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_blake3_known_value() {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(b"hello world").unwrap();
        f.flush().unwrap();

        let result = hash_file(f.path(), Algorithm::Blake3, 1024).unwrap();
        assert_eq!(result.algorithm, Algorithm::Blake3);
        assert_eq!(
            result.hash_hex,
            "d74981efa70a0c880b8d8c1985d075dbcbf679b99a5f9914e5aaf96b831a9e24"
        );
        assert_eq!(result.file_size, 11);
    }

    #[test]
    fn test_sha256_known_value() {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(b"hello world").unwrap();
        f.flush().unwrap();

        let result = hash_file(f.path(), Algorithm::Sha256, 1024).unwrap();
        assert_eq!(
            result.hash_hex,
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn test_empty_file_digests() {
        let f = NamedTempFile::new().unwrap();

        let blake = hash_file(f.path(), Algorithm::Blake3, 1024).unwrap();
        assert_eq!(blake.file_size, 0);
        assert_eq!(
            blake.hash_hex,
            "af1349b9f5f9a1a6a0404dea36dcc9499bcb25c9adc112b7cc9a93cae41f3262"
        );

        let sha = hash_file(f.path(), Algorithm::Sha256, 1024).unwrap();
        assert_eq!(
            sha.hash_hex,
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_digest_is_lowercase_64_chars() {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(b"some bytes").unwrap();
        f.flush().unwrap();

        for algo in [Algorithm::Sha256, Algorithm::Blake3] {
            let result = hash_file(f.path(), algo, 1024).unwrap();
            assert_eq!(result.hash_hex.len(), 64);
            assert_eq!(result.hash_hex, result.hash_hex.to_lowercase());
        }
    }

    #[test]
    fn test_mmap_and_buffered_agree() {
        // Larger than MMAP_THRESHOLD forces the mapped path; hashing the
        // same content from a small chunk size must agree.
        let big = vec![0x5au8; (MMAP_THRESHOLD + 1) as usize];
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(&big).unwrap();
        f.flush().unwrap();

        let mapped = hash_file(f.path(), Algorithm::Blake3, 1024).unwrap();
        assert_eq!(mapped.hash_hex, blake3::hash(&big).to_hex().to_string());
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = hash_file("/no/such/file", Algorithm::Blake3, 1024).unwrap_err();
        match err {
            HashError::Io { path, .. } => assert_eq!(path, PathBuf::from("/no/such/file")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_partial_hash_small_file_falls_back_to_full() {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(b"tiny").unwrap();
        f.flush().unwrap();

        let partial = partial_hash(f.path(), Algorithm::Blake3, 4096).unwrap();
        let full = hash_file(f.path(), Algorithm::Blake3, 4096).unwrap();
        assert_eq!(partial, full.hash_hex);
    }

    #[test]
    fn test_partial_hash_distinguishes_large_files() {
        let mut a = NamedTempFile::new().unwrap();
        let mut b = NamedTempFile::new().unwrap();
        let mut data = vec![0u8; 16384];
        a.write_all(&data).unwrap();
        a.flush().unwrap();
        data[0] = 1; // differ in the head region
        b.write_all(&data).unwrap();
        b.flush().unwrap();

        let ha = partial_hash(a.path(), Algorithm::Blake3, 4096).unwrap();
        let hb = partial_hash(b.path(), Algorithm::Blake3, 4096).unwrap();
        assert_ne!(ha, hb);
    }

    #[test]
    fn test_partial_hash_ignores_middle() {
        let mut a = NamedTempFile::new().unwrap();
        let mut b = NamedTempFile::new().unwrap();
        let mut data = vec![0u8; 16384];
        a.write_all(&data).unwrap();
        a.flush().unwrap();
        data[8192] = 1; // differ only between head and tail
        b.write_all(&data).unwrap();
        b.flush().unwrap();

        let ha = partial_hash(a.path(), Algorithm::Blake3, 4096).unwrap();
        let hb = partial_hash(b.path(), Algorithm::Blake3, 4096).unwrap();
        assert_eq!(ha, hb);
    }
}
