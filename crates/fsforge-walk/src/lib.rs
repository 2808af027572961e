//! Parallel directory traversal for fsforge.
//!
//! This crate provides high-performance parallel walking using jwalk,
//! with a streaming surface ([`walk`]) that hands entries to the consumer
//! through a bounded channel and a collecting surface ([`walk_collect`])
//! that returns the whole list at once.

mod entry;
mod options;
mod visited;
mod walker;

pub use entry::{EntryKind, FileTypeFilter, WalkEntry};
pub use options::{WalkOptions, WalkOptionsBuilder};
pub use visited::VisitedDirs;
pub use walker::{walk, walk_collect, WalkIter};

// Re-export core types for convenience
pub use fsforge_core::{CancelToken, WalkError};
