//! Jwalk-based parallel traversal with a bounded streaming handoff.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver};
use globset::{Glob, GlobMatcher};
use jwalk::{Parallelism, WalkDir};
use tracing::warn;

use fsforge_core::{CancelToken, WalkError};

use crate::entry::{EntryKind, FileTypeFilter, WalkEntry};
use crate::options::WalkOptions;
use crate::visited::VisitedDirs;

/// Capacity of the bounded handoff between producers and the consumer.
/// Producers block when the consumer falls this far behind.
const WALK_CHANNEL_SIZE: usize = 1024;

type JwalkEntry = jwalk::DirEntry<((), ())>;

/// Walk a directory tree, yielding entries through a streaming iterator.
///
/// Traversal runs on a background pool; entries flow to the consumer over
/// a bounded channel. Dropping the iterator cancels the walk and unblocks
/// the producers.
///
/// Only root-level failures are fatal. Unreadable subdirectories and
/// entries that vanish mid-walk are logged and skipped.
pub fn walk(root: impl AsRef<Path>, options: &WalkOptions) -> Result<WalkIter, WalkError> {
    let root = prepare_root(root.as_ref())?;
    let filter = EntryFilter::from_options(options)?;
    let walkdir = build_walkdir(&root, options);

    let (sender, receiver) = bounded(WALK_CHANNEL_SIZE);
    let cancel = CancelToken::new();
    let producer_cancel = cancel.clone();

    thread::spawn(move || {
        for result in walkdir {
            if producer_cancel.is_cancelled() {
                break;
            }
            match result {
                Ok(entry) => {
                    if let Some(walk_entry) = filter.admit(&entry) {
                        if sender.send(walk_entry).is_err() {
                            // Consumer dropped the iterator
                            break;
                        }
                    }
                }
                Err(err) => {
                    warn!(error = %err, "walk error, skipping entry");
                }
            }
        }
    });

    Ok(WalkIter {
        receiver,
        cancel,
        done: false,
    })
}

/// Walk a directory tree and collect all matching entries into a list.
///
/// Faster than [`walk`] when the whole result set is wanted, because it
/// skips the per-entry channel handoff.
pub fn walk_collect(
    root: impl AsRef<Path>,
    options: &WalkOptions,
) -> Result<Vec<WalkEntry>, WalkError> {
    let root = prepare_root(root.as_ref())?;
    let filter = EntryFilter::from_options(options)?;
    let walkdir = build_walkdir(&root, options);

    let mut results = Vec::new();
    for result in walkdir {
        match result {
            Ok(entry) => {
                if let Some(walk_entry) = filter.admit(&entry) {
                    results.push(walk_entry);
                }
            }
            Err(err) => {
                warn!(error = %err, "walk error, skipping entry");
            }
        }
    }

    Ok(results)
}

/// Streaming iterator over walk entries.
pub struct WalkIter {
    receiver: Receiver<WalkEntry>,
    cancel: CancelToken,
    done: bool,
}

impl WalkIter {
    /// A handle that cancels this walk when triggered.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }
}

impl Iterator for WalkIter {
    type Item = WalkEntry;

    fn next(&mut self) -> Option<WalkEntry> {
        if self.done || self.cancel.is_cancelled() {
            return None;
        }
        match self.receiver.recv() {
            Ok(entry) => Some(entry),
            Err(_) => {
                // Producers finished and the channel drained
                self.done = true;
                None
            }
        }
    }
}

impl Drop for WalkIter {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Canonicalize the root and verify it is a walkable directory.
fn prepare_root(root: &Path) -> Result<PathBuf, WalkError> {
    let canonical = fs::canonicalize(root).map_err(|e| WalkError::root(root, e))?;
    if !canonical.is_dir() {
        return Err(WalkError::NotADirectory { path: canonical });
    }
    Ok(canonical)
}

/// Emission filter applied to every discovered entry, the root included.
struct EntryFilter {
    file_type: FileTypeFilter,
    glob: Option<GlobMatcher>,
}

impl EntryFilter {
    fn from_options(options: &WalkOptions) -> Result<Self, WalkError> {
        let glob = match options.glob_pattern.as_deref() {
            Some(pattern) => {
                let glob = Glob::new(pattern).map_err(|e| WalkError::InvalidGlob {
                    pattern: pattern.to_string(),
                    source: e,
                })?;
                Some(glob.compile_matcher())
            }
            None => None,
        };
        Ok(Self {
            file_type: options.file_type,
            glob,
        })
    }

    /// Convert a jwalk entry, returning `None` when the filters reject it.
    fn admit(&self, entry: &JwalkEntry) -> Option<WalkEntry> {
        let ft = entry.file_type();
        let kind = if ft.is_symlink() {
            EntryKind::Symlink
        } else if ft.is_dir() {
            EntryKind::Directory
        } else {
            EntryKind::File
        };

        if !self.file_type.admits(kind) {
            return None;
        }

        if let Some(ref matcher) = self.glob {
            let file_name = entry.file_name().to_string_lossy();
            if !matcher.is_match(file_name.as_ref()) {
                return None;
            }
        }

        let file_size = if kind == EntryKind::File {
            entry.metadata().map(|m| m.len()).unwrap_or(0)
        } else {
            0
        };

        Some(WalkEntry {
            path: entry.path(),
            kind,
            depth: entry.depth(),
            file_size,
        })
    }
}

/// Configure the jwalk traversal for the given options.
///
/// Hidden pruning and depth limiting happen here, inside the traversal,
/// so skipped subtrees are never read at all. Cycle prevention under
/// `follow_symlinks` prunes any directory whose canonical identity has
/// already been visited during this walk.
fn build_walkdir(root: &Path, options: &WalkOptions) -> WalkDir {
    let parallelism = match options.threads {
        0 => Parallelism::RayonDefaultPool {
            busy_timeout: Duration::from_millis(100),
        },
        n => Parallelism::RayonNewPool(n),
    };

    let mut walkdir = WalkDir::new(root)
        .parallelism(parallelism)
        .skip_hidden(options.skip_hidden)
        .follow_links(options.follow_symlinks)
        .sort(options.sort)
        .max_depth(options.max_depth.unwrap_or(usize::MAX));

    if options.follow_symlinks {
        // The root arrives canonicalized, so it seeds the set directly
        let visited = Arc::new(VisitedDirs::new());
        visited.track(root.to_path_buf());
        walkdir = walkdir.process_read_dir(move |_depth, _dir_path, _state, children| {
            for child in children.iter_mut().flatten() {
                if !child.file_type.is_dir() {
                    continue;
                }
                let path = child.path();
                match fs::canonicalize(&path) {
                    Ok(canonical) => {
                        if !visited.track(canonical) {
                            child.read_children_path = None;
                        }
                    }
                    Err(err) => {
                        warn!(path = %path.display(), error = %err, "cannot resolve directory, pruning");
                        child.read_children_path = None;
                    }
                }
            }
        });
    }

    walkdir
}
