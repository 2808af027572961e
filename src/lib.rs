//! fsforge: a high-throughput filesystem toolkit.
//!
//! Five capabilities over a local tree, each living in its own crate and
//! re-exported here:
//!
//! - **Walking** ([`walk`], [`walk_collect`]): parallel recursive traversal
//!   with filtering, streaming through a bounded handoff.
//! - **Hashing** ([`hash_file`], [`hash_files`]): sha256/blake3 digests
//!   with adaptive memory-mapped or buffered I/O.
//! - **Transfer** ([`copy_files`], [`move_files`]): chunked bulk copy and
//!   move with recursive expansion and throttled progress.
//! - **Watching** ([`FileWatcher`]): debounced, coalesced change
//!   notification over the platform's native mechanism.
//! - **Deduplication** ([`find_duplicates`]): staged size, partial-hash,
//!   full-hash duplicate detection.
//!
//! All operations are synchronous and blocking; parallelism happens on
//! worker pools of OS threads behind each call. Long-running operations
//! accept a [`CancelToken`] polled between units of work.
//!
//! ```no_run
//! use fsforge::{walk_collect, FileTypeFilter, WalkOptions};
//!
//! let options = WalkOptions::builder()
//!     .file_type(FileTypeFilter::File)
//!     .glob_pattern(Some("*.rs".to_string()))
//!     .build()
//!     .unwrap();
//! for entry in walk_collect("/some/tree", &options).unwrap() {
//!     println!("{} ({} bytes)", entry.path.display(), entry.file_size);
//! }
//! ```

pub use fsforge_core::{CancelToken, CopyError, FsError, HashError, WalkError, WatchError};

pub use fsforge_walk::{
    walk, walk_collect, EntryKind, FileTypeFilter, WalkEntry, WalkIter, WalkOptions,
    WalkOptionsBuilder,
};

pub use fsforge_hash::{
    hash_file, hash_files, partial_hash, Algorithm, HashCallback, HashOptions,
    HashOptionsBuilder, HashResult, DEFAULT_CHUNK_SIZE, MMAP_THRESHOLD,
};

pub use fsforge_ops::{
    copy_files, move_files, CopyOptions, CopyOptionsBuilder, CopyProgress, ProgressCallback,
};

pub use fsforge_watch::{
    ChangeType, EventIter, FileChange, FileWatcher, WatchOptions, WatchOptionsBuilder,
};

pub use fsforge_dedup::{
    find_duplicates, DedupOptions, DedupOptionsBuilder, DedupProgress, DedupStage, DuplicateGroup,
};
