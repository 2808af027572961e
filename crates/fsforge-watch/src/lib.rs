//! Filesystem change notification for fsforge.
//!
//! [`FileWatcher`] wraps the platform's native mechanism (inotify,
//! FSEvents, ReadDirectoryChangesW) behind a debouncing, coalescing
//! surface that delivers batches of canonical [`FileChange`] events.

mod event;
mod watcher;

pub use event::{ChangeType, FileChange};
pub use watcher::{EventIter, FileWatcher, WatchOptions, WatchOptionsBuilder};

// Re-export core types for convenience
pub use fsforge_core::WatchError;
