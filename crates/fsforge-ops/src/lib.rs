//! Bulk file transfer for fsforge.
//!
//! [`copy_files`] copies files and whole directory trees into a destination
//! with chunked I/O and throttled progress callbacks; [`move_files`] renames
//! when source and destination share a volume and falls back to copy+delete
//! across volumes.

mod copy;
mod move_op;
mod progress;

pub use copy::{copy_files, CopyOptions, CopyOptionsBuilder};
pub use move_op::move_files;
pub use progress::{CopyProgress, ProgressCallback};

// Re-export core types for convenience
pub use fsforge_core::{CancelToken, CopyError};

/// Buffer size for chunked per-file copies.
pub const COPY_BUF_SIZE: usize = 256 * 1024;
