//! Canonical change events and per-batch coalescing.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Platform-independent classification of a raw filesystem event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    /// A node appeared (create or move-in).
    Created,
    /// A node's content or attributes changed.
    Modified,
    /// A node disappeared (delete or move-out).
    Deleted,
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Created => "created",
            Self::Modified => "modified",
            Self::Deleted => "deleted",
        };
        f.write_str(s)
    }
}

/// A single coalesced filesystem change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileChange {
    /// Absolute path the change applies to.
    pub path: PathBuf,
    /// Net effect of the raw events observed in the debounce window.
    pub change_type: ChangeType,
    /// Whether the path is a directory at delivery time.
    pub is_dir: bool,
    /// Unix timestamp (seconds, fractional) of delivery.
    pub timestamp: f64,
}

/// Collapse repeated events on the same path into one net event each,
/// preserving first-seen path order.
///
/// A create followed by a delete within the same window cancels out
/// entirely; a delete followed by a re-create collapses to a modify.
pub(crate) fn coalesce(raw: Vec<FileChange>) -> Vec<FileChange> {
    let mut slots: Vec<Option<FileChange>> = Vec::new();
    let mut index: HashMap<PathBuf, usize> = HashMap::new();

    for change in raw {
        match index.get(&change.path) {
            Some(&i) => {
                let merged = match &slots[i] {
                    Some(existing) => merge(existing.change_type, change.change_type),
                    // Path re-appeared after its earlier events cancelled out
                    None => Some(change.change_type),
                };
                slots[i] = merged.map(|change_type| FileChange {
                    change_type,
                    ..change
                });
            }
            None => {
                index.insert(change.path.clone(), slots.len());
                slots.push(Some(change));
            }
        }
    }

    slots.into_iter().flatten().collect()
}

/// Precedence rule for two events on the same path, oldest first.
fn merge(old: ChangeType, new: ChangeType) -> Option<ChangeType> {
    use ChangeType::*;
    match (old, new) {
        // The consumer never saw the file exist
        (Created, Deleted) => None,
        // An undelivered create absorbs subsequent writes
        (Created, _) => Some(Created),
        (Modified, Deleted) => Some(Deleted),
        (Modified, _) => Some(Modified),
        // Deleted then re-created reads as an in-place replacement
        (Deleted, Created) => Some(Modified),
        (Deleted, Modified) => Some(Modified),
        (Deleted, Deleted) => Some(Deleted),
    }
}
