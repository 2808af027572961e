//! Chunked copy with recursive expansion and progress reporting.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use tracing::warn;

use fsforge_core::{CancelToken, CopyError};
use fsforge_walk::{walk_collect, FileTypeFilter, WalkOptions};

use crate::progress::{ProgressCallback, ProgressTracker};
use crate::COPY_BUF_SIZE;

/// Options for copy and move operations.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into))]
pub struct CopyOptions {
    /// Replace existing destination files instead of aborting.
    #[builder(default = "false")]
    #[serde(default)]
    pub overwrite: bool,

    /// Apply source permissions and timestamps to the destination.
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub preserve_metadata: bool,

    /// Minimum milliseconds between progress callbacks.
    #[builder(default = "100")]
    #[serde(default = "default_interval")]
    pub callback_interval_ms: u64,
}

fn default_true() -> bool {
    true
}

fn default_interval() -> u64 {
    100
}

impl CopyOptions {
    /// Create a new options builder.
    pub fn builder() -> CopyOptionsBuilder {
        CopyOptionsBuilder::default()
    }
}

impl Default for CopyOptions {
    fn default() -> Self {
        Self {
            overwrite: false,
            preserve_metadata: true,
            callback_interval_ms: 100,
        }
    }
}

/// One pending file write, resolved during enumeration.
#[derive(Debug)]
pub(crate) struct CopyUnit {
    /// Source file to read.
    pub(crate) src: PathBuf,
    /// Destination file to write.
    pub(crate) dst: PathBuf,
    /// Size recorded at enumeration time.
    pub(crate) size: u64,
    /// Top-level source this unit was expanded from.
    pub(crate) origin: PathBuf,
}

/// Copy each source into `destination`.
///
/// Directory sources are expanded recursively, preserving their relative
/// structure under `destination`; enumeration completes before any I/O so
/// progress totals are fixed up front. An error on any file aborts the
/// whole operation; destinations already fully written are reported via
/// [`CopyError::completed`] and are not rolled back.
pub fn copy_files(
    sources: &[PathBuf],
    destination: impl AsRef<Path>,
    options: &CopyOptions,
    progress: Option<&ProgressCallback>,
    cancel: Option<&CancelToken>,
) -> Result<Vec<PathBuf>, CopyError> {
    let destination = destination.as_ref();
    prepare_destination(destination)?;

    let units = enumerate_sources(sources, destination)?;
    let total_bytes: u64 = units.iter().map(|u| u.size).sum();
    let mut tracker = ProgressTracker::new(
        destination,
        units.len(),
        total_bytes,
        progress,
        options.callback_interval_ms,
    );

    let mut completed: Vec<PathBuf> = Vec::with_capacity(units.len());

    for unit in &units {
        if cancel.is_some_and(CancelToken::is_cancelled) {
            return Err(CopyError::Interrupted { completed });
        }

        if unit.dst.exists() && !options.overwrite {
            return Err(CopyError::DestinationExists {
                path: unit.dst.clone(),
                completed,
            });
        }

        if let Some(parent) = unit.dst.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                return Err(CopyError::Aborted {
                    path: unit.dst.clone(),
                    source: e,
                    completed,
                });
            }
        }

        tracker.begin_file(&unit.origin, &unit.src);
        match copy_single_file(&unit.src, &unit.dst, &mut tracker, cancel) {
            Ok(()) => {}
            Err(CopyFailure::Io(e)) => {
                return Err(CopyError::Aborted {
                    path: unit.src.clone(),
                    source: e,
                    completed,
                });
            }
            Err(CopyFailure::Interrupted) => {
                return Err(CopyError::Interrupted { completed });
            }
        }

        if options.preserve_metadata {
            preserve_metadata(&unit.src, &unit.dst);
        }

        tracker.complete_file();
        completed.push(unit.dst.clone());
    }

    tracker.finish();
    Ok(completed)
}

/// Ensure the destination exists as a directory.
pub(crate) fn prepare_destination(destination: &Path) -> Result<(), CopyError> {
    if destination.exists() {
        if !destination.is_dir() {
            return Err(CopyError::DestinationNotADirectory {
                path: destination.to_path_buf(),
            });
        }
        return Ok(());
    }
    fs::create_dir_all(destination).map_err(|e| CopyError::Aborted {
        path: destination.to_path_buf(),
        source: e,
        completed: Vec::new(),
    })
}

/// Expand sources into concrete file-to-file units before any I/O.
///
/// Directory sources contribute every contained file; symlinks are not
/// followed for this accounting.
pub(crate) fn enumerate_sources(
    sources: &[PathBuf],
    destination: &Path,
) -> Result<Vec<CopyUnit>, CopyError> {
    let walk_opts = WalkOptions {
        file_type: FileTypeFilter::File,
        sort: true,
        ..WalkOptions::default()
    };

    let mut units = Vec::new();
    for src in sources {
        if !src.exists() {
            return Err(CopyError::SourceMissing { path: src.clone() });
        }

        if src.is_file() {
            let size = fs::metadata(src)
                .map_err(|e| CopyError::Enumeration {
                    path: src.clone(),
                    message: e.to_string(),
                })?
                .len();
            let file_name = src.file_name().unwrap_or(src.as_os_str());
            units.push(CopyUnit {
                src: src.clone(),
                dst: destination.join(file_name),
                size,
                origin: src.clone(),
            });
        } else if src.is_dir() {
            let canonical = fs::canonicalize(src).map_err(|e| CopyError::Enumeration {
                path: src.clone(),
                message: e.to_string(),
            })?;
            let dir_name = canonical
                .file_name()
                .unwrap_or(canonical.as_os_str())
                .to_os_string();
            let dst_dir = destination.join(&dir_name);

            let entries = walk_collect(&canonical, &walk_opts).map_err(|e| {
                CopyError::Enumeration {
                    path: src.clone(),
                    message: e.to_string(),
                }
            })?;

            for entry in entries {
                let rel = entry
                    .path
                    .strip_prefix(&canonical)
                    .map_err(|e| CopyError::Enumeration {
                        path: entry.path.clone(),
                        message: e.to_string(),
                    })?
                    .to_path_buf();
                units.push(CopyUnit {
                    src: entry.path,
                    dst: dst_dir.join(rel),
                    size: entry.file_size,
                    origin: src.clone(),
                });
            }
        }
    }

    Ok(units)
}

enum CopyFailure {
    Io(io::Error),
    Interrupted,
}

/// Copy one file in chunks, bumping the tracker after each written chunk.
fn copy_single_file(
    src: &Path,
    dst: &Path,
    tracker: &mut ProgressTracker<'_>,
    cancel: Option<&CancelToken>,
) -> Result<(), CopyFailure> {
    let src_file = File::open(src).map_err(CopyFailure::Io)?;
    let dst_file = File::create(dst).map_err(CopyFailure::Io)?;
    let mut reader = BufReader::with_capacity(COPY_BUF_SIZE, src_file);
    let mut writer = BufWriter::with_capacity(COPY_BUF_SIZE, dst_file);
    let mut buf = vec![0u8; COPY_BUF_SIZE];

    loop {
        if cancel.is_some_and(CancelToken::is_cancelled) {
            return Err(CopyFailure::Interrupted);
        }
        let n = reader.read(&mut buf).map_err(CopyFailure::Io)?;
        if n == 0 {
            break;
        }
        writer.write_all(&buf[..n]).map_err(CopyFailure::Io)?;
        tracker.add_bytes(n as u64);
    }

    writer.flush().map_err(CopyFailure::Io)?;
    Ok(())
}

/// Apply source permissions and timestamps to the destination.
///
/// Failures here are logged and never abort the operation.
pub(crate) fn preserve_metadata(src: &Path, dst: &Path) {
    let metadata = match fs::metadata(src) {
        Ok(m) => m,
        Err(err) => {
            warn!(path = %src.display(), error = %err, "cannot read source metadata");
            return;
        }
    };

    if let Err(err) = fs::set_permissions(dst, metadata.permissions()) {
        warn!(path = %dst.display(), error = %err, "failed to set permissions");
    }

    let mtime = filetime::FileTime::from_last_modification_time(&metadata);
    let atime = filetime::FileTime::from_last_access_time(&metadata);
    if let Err(err) = filetime::set_file_times(dst, atime, mtime) {
        warn!(path = %dst.display(), error = %err, "failed to set timestamps");
    }
}
