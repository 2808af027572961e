//! Walk configuration.

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::entry::FileTypeFilter;

/// Configuration for a single walk.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into))]
pub struct WalkOptions {
    /// Maximum depth to descend (None = unlimited). Direct children of the
    /// root are depth 1; `Some(0)` yields at most the root itself.
    #[builder(default)]
    #[serde(default)]
    pub max_depth: Option<usize>,

    /// Descend into symbolic links.
    #[builder(default = "false")]
    #[serde(default)]
    pub follow_symlinks: bool,

    /// Emit entries in lexicographic basename order within each directory.
    #[builder(default = "false")]
    #[serde(default)]
    pub sort: bool,

    /// Prune entries whose basename starts with `.`, including whole
    /// hidden subtrees. The root itself is exempt.
    #[builder(default = "false")]
    #[serde(default)]
    pub skip_hidden: bool,

    /// Which entry kinds to emit.
    #[builder(default)]
    #[serde(default)]
    pub file_type: FileTypeFilter,

    /// Glob matched against entry basenames; non-matching entries are not
    /// emitted (but directories are still descended into).
    #[builder(default)]
    #[serde(default)]
    pub glob_pattern: Option<String>,

    /// Number of traversal threads (0 = auto-detect).
    #[builder(default = "0")]
    #[serde(default)]
    pub threads: usize,
}

impl WalkOptions {
    /// Create a new options builder.
    pub fn builder() -> WalkOptionsBuilder {
        WalkOptionsBuilder::default()
    }
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            max_depth: None,
            follow_symlinks: false,
            sort: false,
            skip_hidden: false,
            file_type: FileTypeFilter::Any,
            glob_pattern: None,
            threads: 0,
        }
    }
}
