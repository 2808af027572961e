//! Visited-directory tracking for symlink cycle prevention.

use std::path::{Path, PathBuf};

use dashmap::DashSet;

/// Tracks canonicalized directory identities seen during a single walk.
///
/// Only consulted when following symbolic links: a link chain that leads
/// back to an already-visited directory must not be descended into again.
/// The set is concurrent because directory reads happen on the traversal
/// pool's worker threads.
#[derive(Debug, Default)]
pub struct VisitedDirs {
    seen: DashSet<PathBuf>,
}

impl VisitedDirs {
    /// Create a new empty tracker.
    pub fn new() -> Self {
        Self {
            seen: DashSet::new(),
        }
    }

    /// Track a canonical directory path. Returns `true` if this is the
    /// first time seeing it.
    pub fn track(&self, canonical: PathBuf) -> bool {
        self.seen.insert(canonical)
    }

    /// Check whether a canonical path has been seen (without tracking).
    pub fn has_seen(&self, canonical: &Path) -> bool {
        self.seen.contains(canonical)
    }

    /// Number of unique directories tracked.
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// Whether no directories have been tracked.
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
