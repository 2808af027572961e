//! Content hashing engine for fsforge.
//!
//! Single files hash through [`hash_file`]; batches hash in parallel on a
//! rayon pool through [`hash_files`]. Files above [`MMAP_THRESHOLD`] are
//! memory-mapped and digested in one pass, smaller files go through a
//! buffered reader.

mod algorithm;
mod hasher;
mod result;

pub use algorithm::Algorithm;
pub use hasher::{
    hash_file, hash_files, partial_hash, HashCallback, HashOptions, HashOptionsBuilder,
    DEFAULT_CHUNK_SIZE, MMAP_THRESHOLD,
};
pub use result::HashResult;

// Re-export core types for convenience
pub use fsforge_core::{CancelToken, HashError};
