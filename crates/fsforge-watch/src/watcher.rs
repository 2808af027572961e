//! The debounced watcher lifecycle and delivery surfaces.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crossbeam_channel as channel;
use derive_builder::Builder;
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use tracing::debug;

// Notify types come through the debouncer's re-export to avoid version skew
use notify_debouncer_full::notify::event::{ModifyKind, RenameMode};
use notify_debouncer_full::notify::{self, EventKind, RecursiveMode, Watcher};
use notify_debouncer_full::{
    new_debouncer, DebounceEventResult, DebouncedEvent, Debouncer, FileIdMap,
};

use fsforge_core::WatchError;

use crate::event::{coalesce, ChangeType, FileChange};

/// Poll granularity used by the blocking batch iterator.
const ITER_POLL_MS: u64 = 1000;

/// Configuration for a watcher.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into))]
pub struct WatchOptions {
    /// Watch the whole subtree rather than just the top level.
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub recursive: bool,

    /// Quiet time per path before a batch is delivered.
    #[builder(default = "500")]
    #[serde(default = "default_debounce")]
    pub debounce_ms: u64,

    /// Globs matched against the absolute event path; matching events are
    /// dropped before debouncing. `**` spans directory separators.
    #[builder(default)]
    #[serde(default)]
    pub ignore_patterns: Vec<String>,
}

fn default_true() -> bool {
    true
}

fn default_debounce() -> u64 {
    500
}

impl WatchOptions {
    /// Create a new options builder.
    pub fn builder() -> WatchOptionsBuilder {
        WatchOptionsBuilder::default()
    }
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            recursive: true,
            debounce_ms: 500,
            ignore_patterns: Vec::new(),
        }
    }
}

/// Watch a directory tree for changes with debouncing.
///
/// Lifecycle: [`FileWatcher::start`], then either [`FileWatcher::poll_events`]
/// or the blocking [`FileWatcher::events`] iterator, then
/// [`FileWatcher::stop`]. Dropping the watcher stops it, so a scope exit
/// always tears the native watch down.
#[derive(Debug)]
pub struct FileWatcher {
    path: PathBuf,
    recursive: bool,
    debounce_ms: u64,
    ignore: Option<GlobSet>,
    receiver: Option<channel::Receiver<DebounceEventResult>>,
    debouncer: Option<Debouncer<notify::RecommendedWatcher, FileIdMap>>,
    running: Arc<AtomicBool>,
}

impl FileWatcher {
    /// Create a watcher for `path`. The path must exist; ignore patterns
    /// are compiled up front so invalid globs fail here.
    pub fn new(path: impl AsRef<Path>, options: &WatchOptions) -> Result<Self, WatchError> {
        let watch_path = path.as_ref().to_path_buf();
        if !watch_path.exists() {
            return Err(WatchError::PathNotFound { path: watch_path });
        }

        let ignore = build_ignore_set(&options.ignore_patterns)?;

        Ok(Self {
            path: watch_path,
            recursive: options.recursive,
            debounce_ms: options.debounce_ms,
            ignore,
            receiver: None,
            debouncer: None,
            running: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Install the native watch and begin buffering events. Idempotent.
    pub fn start(&mut self) -> Result<(), WatchError> {
        if self.running.load(Ordering::SeqCst) {
            return Ok(());
        }

        let (sender, receiver) = channel::unbounded();

        let mut debouncer = new_debouncer(
            Duration::from_millis(self.debounce_ms),
            None,
            move |result: DebounceEventResult| {
                let _ = sender.send(result);
            },
        )
        .map_err(|e| WatchError::Install {
            path: self.path.clone(),
            message: e.to_string(),
        })?;

        let mode = if self.recursive {
            RecursiveMode::Recursive
        } else {
            RecursiveMode::NonRecursive
        };

        debouncer
            .watcher()
            .watch(&self.path, mode)
            .map_err(|e| WatchError::Install {
                path: self.path.clone(),
                message: e.to_string(),
            })?;

        debouncer.cache().add_root(&self.path, mode);

        self.debouncer = Some(debouncer);
        self.receiver = Some(receiver);
        self.running.store(true, Ordering::SeqCst);
        debug!(path = %self.path.display(), "watch installed");

        Ok(())
    }

    /// Tear down the native watch and drop buffered events. Idempotent.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        self.debouncer.take();
        self.receiver.take();
    }

    /// Whether the watcher is currently delivering events.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// The path being watched.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Wait up to `timeout_ms` for the next debounced batch.
    ///
    /// Returns an empty batch on timeout. Backend runtime errors surface
    /// here as `Err` while the watcher keeps running; a disconnected event
    /// source transitions the watcher to the terminal stopped state.
    pub fn poll_events(&self, timeout_ms: u64) -> Result<Vec<FileChange>, WatchError> {
        if !self.running.load(Ordering::SeqCst) {
            return Err(WatchError::Stopped);
        }
        let receiver = self.receiver.as_ref().ok_or(WatchError::Stopped)?;

        match receiver.recv_timeout(Duration::from_millis(timeout_ms)) {
            Ok(Ok(events)) => Ok(self.translate_batch(&events)),
            Ok(Err(errors)) => {
                let message = errors
                    .iter()
                    .map(|e| e.to_string())
                    .collect::<Vec<_>>()
                    .join("; ");
                Err(WatchError::Backend { message })
            }
            Err(channel::RecvTimeoutError::Timeout) => Ok(Vec::new()),
            Err(channel::RecvTimeoutError::Disconnected) => {
                self.running.store(false, Ordering::SeqCst);
                Err(WatchError::Stopped)
            }
        }
    }

    /// Blocking iterator over batches, ending when the watcher stops.
    pub fn events(&self) -> EventIter<'_> {
        EventIter { watcher: self }
    }

    /// Translate a debounced batch into coalesced canonical events.
    fn translate_batch(&self, events: &[DebouncedEvent]) -> Vec<FileChange> {
        let now = unix_now();
        let mut raw = Vec::new();

        for event in events {
            for (path, change_type) in canonical_changes(event) {
                if let Some(ref ignore) = self.ignore {
                    if ignore.is_match(&path) {
                        continue;
                    }
                }
                raw.push(FileChange {
                    is_dir: path.is_dir(),
                    path,
                    change_type,
                    timestamp: now,
                });
            }
        }

        coalesce(raw)
    }
}

impl Drop for FileWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Blocking iterator over event batches.
pub struct EventIter<'a> {
    watcher: &'a FileWatcher,
}

impl Iterator for EventIter<'_> {
    type Item = Result<Vec<FileChange>, WatchError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if !self.watcher.is_running() {
                return None;
            }
            match self.watcher.poll_events(ITER_POLL_MS) {
                Ok(batch) if batch.is_empty() => continue,
                Ok(batch) => return Some(Ok(batch)),
                Err(WatchError::Stopped) => return None,
                Err(err) => return Some(Err(err)),
            }
        }
    }
}

/// Map a native event onto canonical `(path, change)` pairs.
///
/// Renames decompose into a delete of the old name and a create of the
/// new one; unclassified kinds are dropped.
fn canonical_changes(event: &DebouncedEvent) -> Vec<(PathBuf, ChangeType)> {
    match event.kind {
        EventKind::Create(_) => event
            .paths
            .iter()
            .map(|p| (p.clone(), ChangeType::Created))
            .collect(),
        EventKind::Remove(_) => event
            .paths
            .iter()
            .map(|p| (p.clone(), ChangeType::Deleted))
            .collect(),
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) if event.paths.len() == 2 => {
            vec![
                (event.paths[0].clone(), ChangeType::Deleted),
                (event.paths[1].clone(), ChangeType::Created),
            ]
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => event
            .paths
            .iter()
            .map(|p| (p.clone(), ChangeType::Deleted))
            .collect(),
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => event
            .paths
            .iter()
            .map(|p| (p.clone(), ChangeType::Created))
            .collect(),
        EventKind::Modify(_) => event
            .paths
            .iter()
            .map(|p| (p.clone(), ChangeType::Modified))
            .collect(),
        _ => Vec::new(),
    }
}

fn build_ignore_set(patterns: &[String]) -> Result<Option<GlobSet>, WatchError> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| WatchError::InvalidPattern {
            pattern: pattern.clone(),
            source: e,
        })?;
        builder.add(glob);
    }
    let set = builder.build().map_err(|e| WatchError::InvalidPattern {
        pattern: patterns.join(", "),
        source: e,
    })?;
    Ok(Some(set))
}

fn unix_now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}
