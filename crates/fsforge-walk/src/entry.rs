//! Walk entry types.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use fsforge_core::WalkError;

/// The kind of filesystem node an entry describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
    Symlink,
}

/// A single node discovered during a walk.
///
/// Paths are absolute and share the canonicalization applied to the walk
/// root. Direct children of the root have depth 1; the root itself is
/// depth 0. `file_size` is 0 for directories and symlinks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalkEntry {
    /// Absolute path of the node.
    pub path: PathBuf,
    /// What kind of node this is.
    pub kind: EntryKind,
    /// Depth below the walk root.
    pub depth: usize,
    /// Size in bytes for regular files, 0 otherwise.
    pub file_size: u64,
}

impl WalkEntry {
    /// Whether this entry is a regular file.
    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }

    /// Whether this entry is a directory.
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    /// Whether this entry is a symbolic link.
    pub fn is_symlink(&self) -> bool {
        self.kind == EntryKind::Symlink
    }

    /// The final component of the entry path.
    pub fn file_name(&self) -> Option<&str> {
        self.path.file_name().and_then(|n| n.to_str())
    }
}

impl AsRef<Path> for WalkEntry {
    fn as_ref(&self) -> &Path {
        &self.path
    }
}

/// Which entry kinds a walk emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileTypeFilter {
    /// Emit every kind of entry.
    #[default]
    Any,
    /// Emit only regular files.
    File,
    /// Emit only directories.
    Dir,
}

impl FileTypeFilter {
    /// Check whether an entry kind passes this filter.
    pub fn admits(&self, kind: EntryKind) -> bool {
        match self {
            Self::Any => true,
            Self::File => kind == EntryKind::File,
            Self::Dir => kind == EntryKind::Directory,
        }
    }
}

impl FromStr for FileTypeFilter {
    type Err = WalkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "any" => Ok(Self::Any),
            "file" => Ok(Self::File),
            "dir" => Ok(Self::Dir),
            other => Err(WalkError::InvalidFileType {
                value: other.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_kind_flags() {
        let entry = WalkEntry {
            path: PathBuf::from("/tmp/a.txt"),
            kind: EntryKind::File,
            depth: 1,
            file_size: 42,
        };
        assert!(entry.is_file());
        assert!(!entry.is_dir());
        assert!(!entry.is_symlink());
        assert_eq!(entry.file_name(), Some("a.txt"));
    }

    #[test]
    fn test_file_type_filter_parse() {
        assert_eq!("any".parse::<FileTypeFilter>().unwrap(), FileTypeFilter::Any);
        assert_eq!("file".parse::<FileTypeFilter>().unwrap(), FileTypeFilter::File);
        assert_eq!("dir".parse::<FileTypeFilter>().unwrap(), FileTypeFilter::Dir);
        assert!("link".parse::<FileTypeFilter>().is_err());
    }

    #[test]
    fn test_file_type_filter_admits() {
        assert!(FileTypeFilter::Any.admits(EntryKind::Symlink));
        assert!(FileTypeFilter::File.admits(EntryKind::File));
        assert!(!FileTypeFilter::File.admits(EntryKind::Directory));
        assert!(FileTypeFilter::Dir.admits(EntryKind::Directory));
        assert!(!FileTypeFilter::Dir.admits(EntryKind::Symlink));
    }
}
