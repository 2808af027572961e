//! Progress reporting for transfer operations.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Callback invoked with throttled progress snapshots.
///
/// Invocations may come from worker threads; callers needing serialization
/// must arrange it themselves.
pub type ProgressCallback = dyn Fn(&CopyProgress) + Send + Sync;

/// A snapshot of an ongoing copy or move operation.
///
/// `bytes_copied` is monotonically non-decreasing across snapshots of one
/// operation and `total_bytes`/`total_files` are fixed once enumeration
/// completes, so `bytes_copied <= total_bytes` and
/// `files_completed <= total_files` hold at every snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CopyProgress {
    /// Source currently being processed (empty after completion).
    pub src: PathBuf,
    /// Destination base path.
    pub dst: PathBuf,
    /// Bytes written so far across the whole operation.
    pub bytes_copied: u64,
    /// Total bytes the operation will write.
    pub total_bytes: u64,
    /// Files fully written so far.
    pub files_completed: usize,
    /// Total files the operation will write.
    pub total_files: usize,
    /// File currently being copied (empty after completion).
    pub current_file: PathBuf,
}

impl CopyProgress {
    /// Progress as a percentage (0.0 to 100.0).
    pub fn percentage(&self) -> f64 {
        if self.total_bytes > 0 {
            (self.bytes_copied as f64 / self.total_bytes as f64) * 100.0
        } else if self.total_files > 0 {
            (self.files_completed as f64 / self.total_files as f64) * 100.0
        } else {
            100.0
        }
    }
}

/// Internal tracker owning the canonical operation state.
///
/// Snapshots handed to the callback are consistent captures of this state;
/// the throttle guarantees at most one callback per interval plus the final
/// callback issued by [`ProgressTracker::finish`].
pub(crate) struct ProgressTracker<'a> {
    dst_base: PathBuf,
    total_bytes: u64,
    total_files: usize,
    bytes_copied: u64,
    files_completed: usize,
    current_src: PathBuf,
    current_file: PathBuf,
    callback: Option<&'a ProgressCallback>,
    interval: Duration,
    last_fire: Instant,
}

impl<'a> ProgressTracker<'a> {
    pub(crate) fn new(
        dst_base: &Path,
        total_files: usize,
        total_bytes: u64,
        callback: Option<&'a ProgressCallback>,
        interval_ms: u64,
    ) -> Self {
        Self {
            dst_base: dst_base.to_path_buf(),
            total_bytes,
            total_files,
            bytes_copied: 0,
            files_completed: 0,
            current_src: PathBuf::new(),
            current_file: PathBuf::new(),
            callback,
            interval: Duration::from_millis(interval_ms),
            last_fire: Instant::now(),
        }
    }

    /// Record which file is being copied next.
    pub(crate) fn begin_file(&mut self, origin: &Path, file: &Path) {
        self.current_src = origin.to_path_buf();
        self.current_file = file.to_path_buf();
    }

    /// Record a successfully written chunk, firing the callback if the
    /// throttle interval has elapsed.
    pub(crate) fn add_bytes(&mut self, n: u64) {
        self.bytes_copied += n;
        if let Some(cb) = self.callback {
            if self.last_fire.elapsed() >= self.interval {
                cb(&self.snapshot());
                self.last_fire = Instant::now();
            }
        }
    }

    /// Record a fully written file.
    pub(crate) fn complete_file(&mut self) {
        self.files_completed += 1;
    }

    /// Issue the final callback after the whole operation completed.
    pub(crate) fn finish(&mut self) {
        self.current_src = PathBuf::new();
        self.current_file = PathBuf::new();
        if let Some(cb) = self.callback {
            cb(&self.snapshot());
        }
    }

    fn snapshot(&self) -> CopyProgress {
        CopyProgress {
            src: self.current_src.clone(),
            dst: self.dst_base.clone(),
            bytes_copied: self.bytes_copied,
            total_bytes: self.total_bytes,
            files_completed: self.files_completed,
            total_files: self.total_files,
            current_file: self.current_file.clone(),
        }
    }
}
