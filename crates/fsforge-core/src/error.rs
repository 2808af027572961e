//! Error types for fsforge operations.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by directory traversal.
///
/// Only failures concerning the walk root are fatal; per-entry failures
/// encountered mid-walk are logged and skipped.
#[derive(Debug, Error)]
pub enum WalkError {
    /// Root path does not exist.
    #[error("root path not found: {path}")]
    RootNotFound { path: PathBuf },

    /// Root path exists but is not a directory.
    #[error("root path is not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// Root path could not be accessed.
    #[error("cannot access root {path}: {source}")]
    RootAccess {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The glob pattern failed to compile.
    #[error("invalid glob pattern {pattern:?}: {source}")]
    InvalidGlob {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    /// Unrecognized file type filter string.
    #[error("invalid file_type {value:?}, expected \"any\", \"file\", or \"dir\"")]
    InvalidFileType { value: String },

    /// The walk was cancelled before completing.
    #[error("walk interrupted")]
    Interrupted,
}

impl WalkError {
    /// Create a root access error, collapsing the common io kinds.
    pub fn root(path: impl Into<PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            io::ErrorKind::NotFound => Self::RootNotFound { path },
            _ => Self::RootAccess { path, source },
        }
    }
}

/// Errors raised by content hashing.
#[derive(Debug, Error)]
pub enum HashError {
    /// Failed to open or read a file.
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Unrecognized algorithm name.
    #[error("unknown algorithm {name:?}, expected \"sha256\" or \"blake3\"")]
    UnknownAlgorithm { name: String },

    /// Worker pool construction failed.
    #[error("failed to create thread pool: {message}")]
    Pool { message: String },

    /// The operation was cancelled before completing.
    #[error("hashing interrupted")]
    Interrupted,
}

impl HashError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors raised by copy and move operations.
///
/// An error on any individual file aborts the whole operation; destinations
/// that were fully written before the abort are reported through
/// [`CopyError::completed`] and are never rolled back.
#[derive(Debug, Error)]
pub enum CopyError {
    /// A source path does not exist.
    #[error("source does not exist: {path}")]
    SourceMissing { path: PathBuf },

    /// The destination exists and is not a directory.
    #[error("destination is not a directory: {path}")]
    DestinationNotADirectory { path: PathBuf },

    /// Enumerating a directory source failed.
    #[error("failed to enumerate {path}: {message}")]
    Enumeration { path: PathBuf, message: String },

    /// A destination file already exists and overwrite is disabled.
    #[error("destination already exists: {path} (overwrite disabled)")]
    DestinationExists {
        path: PathBuf,
        completed: Vec<PathBuf>,
    },

    /// A file failed to copy or move.
    #[error("operation failed at {path}: {source}")]
    Aborted {
        path: PathBuf,
        #[source]
        source: io::Error,
        completed: Vec<PathBuf>,
    },

    /// The operation was cancelled before completing.
    #[error("operation interrupted")]
    Interrupted { completed: Vec<PathBuf> },
}

impl CopyError {
    /// Destination paths that reached successful completion before the abort.
    pub fn completed(&self) -> &[PathBuf] {
        match self {
            Self::DestinationExists { completed, .. }
            | Self::Aborted { completed, .. }
            | Self::Interrupted { completed } => completed,
            _ => &[],
        }
    }
}

/// Errors raised by filesystem watching.
#[derive(Debug, Error)]
pub enum WatchError {
    /// The watched path does not exist.
    #[error("watch path does not exist: {path}")]
    PathNotFound { path: PathBuf },

    /// An ignore pattern failed to compile.
    #[error("invalid ignore pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    /// Installing the native watch failed.
    #[error("failed to install watch on {path}: {message}")]
    Install { path: PathBuf, message: String },

    /// The native event source reported a runtime error.
    #[error("watch backend error: {message}")]
    Backend { message: String },

    /// The watcher is not running.
    #[error("watcher is stopped")]
    Stopped,
}

/// Umbrella error covering every fsforge component.
#[derive(Debug, Error)]
pub enum FsError {
    #[error(transparent)]
    Walk(#[from] WalkError),

    #[error(transparent)]
    Hash(#[from] HashError),

    #[error(transparent)]
    Copy(#[from] CopyError),

    #[error(transparent)]
    Watch(#[from] WatchError),

    #[error(transparent)]
    Io(#[from] io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_walk_error_root_not_found() {
        let err = WalkError::root(
            "/missing",
            io::Error::new(io::ErrorKind::NotFound, "gone"),
        );
        assert!(matches!(err, WalkError::RootNotFound { .. }));
    }

    #[test]
    fn test_copy_error_completed_paths() {
        let err = CopyError::Aborted {
            path: PathBuf::from("/src/a"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
            completed: vec![PathBuf::from("/dst/b")],
        };
        assert_eq!(err.completed(), &[PathBuf::from("/dst/b")]);

        let err = CopyError::SourceMissing {
            path: PathBuf::from("/src/a"),
        };
        assert!(err.completed().is_empty());
    }

    #[test]
    fn test_io_error_kind_preserved() {
        use std::error::Error;

        let err = HashError::io(
            "/some/file",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        let source = err.source().unwrap();
        let io_err = source.downcast_ref::<io::Error>().unwrap();
        assert_eq!(io_err.kind(), io::ErrorKind::PermissionDenied);
    }

    #[test]
    fn test_umbrella_conversion() {
        let err: FsError = WalkError::Interrupted.into();
        assert!(matches!(err, FsError::Walk(_)));
    }
}
