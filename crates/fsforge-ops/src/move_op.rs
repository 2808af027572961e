//! Move operation: rename fast path with cross-device copy fallback.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use fsforge_core::{CancelToken, CopyError};

use crate::copy::{copy_files, prepare_destination, CopyOptions};
use crate::progress::ProgressCallback;

/// Move each source into `destination`.
///
/// Each source is renamed when possible, which is instant on the same
/// volume and reports no intermediate progress. A rename failing with a
/// cross-device indication falls back to a full copy of that source
/// followed by deletion, and only the fallback path drives the progress
/// callback. Sources are processed in input order; the first failure
/// aborts, with already-moved destinations reported via
/// [`CopyError::completed`].
pub fn move_files(
    sources: &[PathBuf],
    destination: impl AsRef<Path>,
    options: &CopyOptions,
    progress: Option<&ProgressCallback>,
    cancel: Option<&CancelToken>,
) -> Result<Vec<PathBuf>, CopyError> {
    let destination = destination.as_ref();
    prepare_destination(destination)?;

    let mut completed: Vec<PathBuf> = Vec::with_capacity(sources.len());

    for src in sources {
        if cancel.is_some_and(CancelToken::is_cancelled) {
            return Err(CopyError::Interrupted { completed });
        }

        if !src.exists() {
            return Err(CopyError::SourceMissing { path: src.clone() });
        }

        let file_name = src.file_name().unwrap_or(src.as_os_str());
        let dst = destination.join(file_name);

        if dst.exists() && !options.overwrite {
            return Err(CopyError::DestinationExists {
                path: dst,
                completed,
            });
        }

        match fs::rename(src, &dst) {
            Ok(()) => {
                completed.push(dst);
            }
            Err(e) if is_cross_device(&e) => {
                debug!(src = %src.display(), "rename crossed devices, falling back to copy");
                match copy_files(std::slice::from_ref(src), destination, options, progress, cancel)
                {
                    Ok(copied) => {
                        if let Err(e) = remove_source(src) {
                            completed.extend(copied);
                            return Err(CopyError::Aborted {
                                path: src.clone(),
                                source: e,
                                completed,
                            });
                        }
                        completed.extend(copied);
                    }
                    Err(err) => {
                        return Err(with_prior_completed(err, completed));
                    }
                }
            }
            Err(e) => {
                return Err(CopyError::Aborted {
                    path: src.clone(),
                    source: e,
                    completed,
                });
            }
        }
    }

    Ok(completed)
}

/// Delete a fully copied source after a cross-device fallback.
fn remove_source(src: &Path) -> io::Result<()> {
    if src.is_dir() {
        fs::remove_dir_all(src)
    } else {
        fs::remove_file(src)
    }
}

/// Splice destinations completed by earlier sources into an error raised
/// by a later fallback copy.
fn with_prior_completed(err: CopyError, mut prior: Vec<PathBuf>) -> CopyError {
    match err {
        CopyError::DestinationExists { path, completed } => {
            prior.extend(completed);
            CopyError::DestinationExists {
                path,
                completed: prior,
            }
        }
        CopyError::Aborted {
            path,
            source,
            completed,
        } => {
            prior.extend(completed);
            CopyError::Aborted {
                path,
                source,
                completed: prior,
            }
        }
        CopyError::Interrupted { completed } => {
            prior.extend(completed);
            CopyError::Interrupted { completed: prior }
        }
        other => other,
    }
}

#[cfg(unix)]
fn is_cross_device(err: &io::Error) -> bool {
    err.raw_os_error() == Some(libc::EXDEV)
}

#[cfg(not(unix))]
fn is_cross_device(_err: &io::Error) -> bool {
    // Windows reports several codes for cross-volume renames; the copy
    // fallback handles all of them
    true
}
