//! The staged elimination pipeline.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;
use tracing::warn;

use fsforge_core::{CancelToken, HashError};
use fsforge_hash::{hash_file, partial_hash, DEFAULT_CHUNK_SIZE};
use fsforge_walk::{walk_collect, FileTypeFilter, WalkOptions};

use crate::group::{DedupOptions, DedupProgress, DedupStage, DuplicateGroup};

/// Find groups of files with identical content.
///
/// Inputs may be files or directories; directories are expanded through
/// the walker, honoring `recursive`. Unreadable inputs are logged and
/// skipped, but a digest failure in the hashing stages aborts the whole
/// call. The result is ordered by `wasted_bytes` descending, with
/// `file_size` descending and then `hash_hex` breaking ties; paths inside
/// each group are sorted.
pub fn find_duplicates(
    paths: &[PathBuf],
    options: &DedupOptions,
    progress: Option<&DedupProgress>,
    cancel: Option<&CancelToken>,
) -> Result<Vec<DuplicateGroup>, HashError> {
    let pool = match options.max_workers {
        Some(workers) => Some(
            rayon::ThreadPoolBuilder::new()
                .num_threads(workers)
                .build()
                .map_err(|e| HashError::Pool {
                    message: e.to_string(),
                })?,
        ),
        None => None,
    };

    // Stage 1: collect candidates and group by size
    check_cancel(cancel)?;
    report(progress, DedupStage::Collecting, 0, 0);

    let entries = collect_candidates(paths, options);
    let total = entries.len();
    report(progress, DedupStage::Collecting, total, total);

    let size_groups = group_by_size(entries);

    // Stage 2: partial digests over size-matched groups
    check_cancel(cancel)?;
    let stage_total: usize = size_groups.iter().map(|(_, files)| files.len()).sum();
    report(progress, DedupStage::PartialHash, 0, stage_total);

    let run_partial = || partial_stage(&size_groups, options, progress, cancel, stage_total);
    let partial_groups = match &pool {
        Some(p) => p.install(run_partial),
        None => run_partial(),
    }?;

    // Stage 3: whole-file digests over the survivors
    check_cancel(cancel)?;
    let stage_total: usize = partial_groups.iter().map(|(_, files)| files.len()).sum();
    report(progress, DedupStage::FullHash, 0, stage_total);

    let run_full = || full_stage(&partial_groups, options, progress, cancel, stage_total);
    let full_groups = match &pool {
        Some(p) => p.install(run_full),
        None => run_full(),
    }?;

    let mut groups: Vec<DuplicateGroup> = full_groups
        .into_iter()
        .map(|(hash_hex, file_size, mut paths)| {
            paths.sort();
            DuplicateGroup::new(hash_hex, file_size, paths)
        })
        .collect();

    groups.sort_by(|a, b| {
        b.wasted_bytes
            .cmp(&a.wasted_bytes)
            .then_with(|| b.file_size.cmp(&a.file_size))
            .then_with(|| a.hash_hex.cmp(&b.hash_hex))
    });

    Ok(groups)
}

/// Expand the inputs into `(path, size)` candidates.
///
/// Per-entry failures are logged and skipped so one unreadable input does
/// not sink the whole analysis.
fn collect_candidates(paths: &[PathBuf], options: &DedupOptions) -> Vec<(PathBuf, u64)> {
    let walk_opts = WalkOptions {
        file_type: FileTypeFilter::File,
        max_depth: if options.recursive { None } else { Some(1) },
        ..WalkOptions::default()
    };

    let mut entries = Vec::new();
    for path in paths {
        if path.is_file() {
            match fs::metadata(path) {
                Ok(metadata) => {
                    if metadata.len() >= options.min_size {
                        entries.push((path.clone(), metadata.len()));
                    }
                }
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "cannot stat input, skipping");
                }
            }
        } else if path.is_dir() {
            match walk_collect(path, &walk_opts) {
                Ok(walked) => {
                    for entry in walked {
                        if entry.file_size >= options.min_size {
                            entries.push((entry.path, entry.file_size));
                        }
                    }
                }
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "cannot enumerate input, skipping");
                }
            }
        } else {
            warn!(path = %path.display(), "input path does not exist, skipping");
        }
    }

    entries
}

/// Group candidates by exact size, dropping singletons: a file with a
/// unique size cannot have a content duplicate.
fn group_by_size(entries: Vec<(PathBuf, u64)>) -> Vec<(u64, Vec<PathBuf>)> {
    let mut groups: HashMap<u64, Vec<PathBuf>> = HashMap::new();
    for (path, size) in entries {
        groups.entry(size).or_default().push(path);
    }
    groups
        .into_iter()
        .filter(|(_, files)| files.len() > 1)
        .collect()
}

/// Partial-hash every file in the surviving size groups and regroup by
/// `(size, digest)`, dropping singleton subgroups.
fn partial_stage(
    size_groups: &[(u64, Vec<PathBuf>)],
    options: &DedupOptions,
    progress: Option<&DedupProgress>,
    cancel: Option<&CancelToken>,
    total: usize,
) -> Result<Vec<(u64, Vec<PathBuf>)>, HashError> {
    let processed = AtomicUsize::new(0);
    let mut surviving = Vec::new();

    for (size, files) in size_groups {
        check_cancel(cancel)?;

        let digests: Vec<(PathBuf, String)> = files
            .par_iter()
            .map(|path| {
                check_cancel(cancel)?;
                let digest = partial_hash(path, options.algorithm, options.partial_hash_size)?;
                let done = processed.fetch_add(1, Ordering::SeqCst) + 1;
                report(progress, DedupStage::PartialHash, done, total);
                Ok((path.clone(), digest))
            })
            .collect::<Result<_, HashError>>()?;

        let mut by_digest: HashMap<String, Vec<PathBuf>> = HashMap::new();
        for (path, digest) in digests {
            by_digest.entry(digest).or_default().push(path);
        }
        for (_, group) in by_digest {
            if group.len() > 1 {
                surviving.push((*size, group));
            }
        }
    }

    Ok(surviving)
}

/// Fully hash every remaining file and regroup by `(size, digest)`;
/// groups of two or more are the duplicates.
fn full_stage(
    partial_groups: &[(u64, Vec<PathBuf>)],
    options: &DedupOptions,
    progress: Option<&DedupProgress>,
    cancel: Option<&CancelToken>,
    total: usize,
) -> Result<Vec<(String, u64, Vec<PathBuf>)>, HashError> {
    let processed = AtomicUsize::new(0);
    let mut results = Vec::new();

    for (size, files) in partial_groups {
        check_cancel(cancel)?;

        let digests: Vec<(PathBuf, String)> = files
            .par_iter()
            .map(|path| {
                check_cancel(cancel)?;
                let result = hash_file(path, options.algorithm, DEFAULT_CHUNK_SIZE)?;
                let done = processed.fetch_add(1, Ordering::SeqCst) + 1;
                report(progress, DedupStage::FullHash, done, total);
                Ok((path.clone(), result.hash_hex))
            })
            .collect::<Result<_, HashError>>()?;

        let mut by_digest: HashMap<String, Vec<PathBuf>> = HashMap::new();
        for (path, digest) in digests {
            by_digest.entry(digest).or_default().push(path);
        }
        for (digest, group) in by_digest {
            if group.len() > 1 {
                results.push((digest, *size, group));
            }
        }
    }

    Ok(results)
}

fn report(progress: Option<&DedupProgress>, stage: DedupStage, processed: usize, total: usize) {
    if let Some(cb) = progress {
        cb(stage, processed, total);
    }
}

fn check_cancel(cancel: Option<&CancelToken>) -> Result<(), HashError> {
    if cancel.is_some_and(CancelToken::is_cancelled) {
        return Err(HashError::Interrupted);
    }
    Ok(())
}
