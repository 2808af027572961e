//! Content-based duplicate detection for fsforge.
//!
//! [`find_duplicates`] runs a three-stage elimination pipeline so the
//! expensive whole-file digests only ever run on files that already agree
//! in size and in a cheap head+tail partial digest:
//!
//! 1. Collect candidate files and group by exact byte size
//! 2. Partial-hash surviving groups and regroup by `(size, digest)`
//! 3. Full-hash what remains; groups of two or more become results

mod group;
mod pipeline;

pub use group::{
    DedupOptions, DedupOptionsBuilder, DedupProgress, DedupStage, DuplicateGroup,
};
pub use pipeline::find_duplicates;

// Re-export the hashing types callers need alongside the pipeline
pub use fsforge_hash::Algorithm;

// Re-export core types for convenience
pub use fsforge_core::{CancelToken, HashError};
