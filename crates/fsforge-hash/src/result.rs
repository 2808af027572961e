//! Hash result type.

use std::hash::{Hash, Hasher};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::algorithm::Algorithm;

/// The outcome of hashing one file.
///
/// Equality and map-key identity are defined by `(algorithm, hash_hex)`
/// alone: two results compare equal when they describe the same content,
/// regardless of where that content lives or how large it was at hash time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HashResult {
    /// Absolute path of the hashed file.
    pub path: PathBuf,
    /// Algorithm that produced the digest.
    pub algorithm: Algorithm,
    /// Lowercase hex digest, 64 characters.
    pub hash_hex: String,
    /// File size in bytes at the moment of hashing.
    pub file_size: u64,
}

impl PartialEq for HashResult {
    fn eq(&self, other: &Self) -> bool {
        self.algorithm == other.algorithm && self.hash_hex == other.hash_hex
    }
}

impl Eq for HashResult {}

impl Hash for HashResult {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.algorithm.hash(state);
        self.hash_hex.hash(state);
    }
}
