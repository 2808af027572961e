//! Duplicate groups, progress stages, and pipeline configuration.

use std::fmt;
use std::path::PathBuf;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use fsforge_hash::Algorithm;

/// A group of files sharing identical content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateGroup {
    /// Digest shared by every file in the group.
    pub hash_hex: String,
    /// Size of each file in bytes.
    pub file_size: u64,
    /// Lexicographically sorted paths, always two or more.
    pub paths: Vec<PathBuf>,
    /// Storage reclaimable by keeping one copy: `file_size * (count - 1)`.
    pub wasted_bytes: u64,
}

impl DuplicateGroup {
    /// Build a group, deriving `wasted_bytes` from the path count.
    pub(crate) fn new(hash_hex: String, file_size: u64, paths: Vec<PathBuf>) -> Self {
        let wasted_bytes = file_size * (paths.len() as u64).saturating_sub(1);
        Self {
            hash_hex,
            file_size,
            paths,
            wasted_bytes,
        }
    }

    /// Number of files in the group.
    pub fn count(&self) -> usize {
        self.paths.len()
    }

    /// How many copies could be deleted while keeping one.
    pub fn deletable_count(&self) -> usize {
        self.paths.len().saturating_sub(1)
    }
}

/// Pipeline stage reported to the progress callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupStage {
    /// Enumerating candidate files and grouping by size.
    Collecting,
    /// Head+tail digests over size-matched groups.
    PartialHash,
    /// Whole-file digests over partial-hash survivors.
    FullHash,
}

impl fmt::Display for DedupStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Collecting => "collecting",
            Self::PartialHash => "partial_hash",
            Self::FullHash => "full_hash",
        };
        f.write_str(s)
    }
}

/// Progress callback: `(stage, processed, total)` where `total` is the
/// size of that stage's input. Invocations may come from worker threads.
pub type DedupProgress = dyn Fn(DedupStage, usize, usize) + Send + Sync;

/// Configuration for duplicate detection.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into))]
pub struct DedupOptions {
    /// Expand directory inputs recursively rather than one level deep.
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub recursive: bool,

    /// Files smaller than this are never considered.
    #[builder(default = "1")]
    #[serde(default = "default_min_size")]
    pub min_size: u64,

    /// Digest algorithm used for both the partial and the full stage.
    #[builder(default)]
    #[serde(default)]
    pub algorithm: Algorithm,

    /// Bytes hashed from each end of a file in the partial stage.
    #[builder(default = "4096")]
    #[serde(default = "default_partial_size")]
    pub partial_hash_size: usize,

    /// Worker pool size for the hashing stages (None = hardware
    /// concurrency).
    #[builder(default)]
    #[serde(default)]
    pub max_workers: Option<usize>,
}

fn default_true() -> bool {
    true
}

fn default_min_size() -> u64 {
    1
}

fn default_partial_size() -> usize {
    4096
}

impl DedupOptions {
    /// Create a new options builder.
    pub fn builder() -> DedupOptionsBuilder {
        DedupOptionsBuilder::default()
    }
}

impl Default for DedupOptions {
    fn default() -> Self {
        Self {
            recursive: true,
            min_size: 1,
            algorithm: Algorithm::Blake3,
            partial_hash_size: 4096,
            max_workers: None,
        }
    }
}
