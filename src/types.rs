//! Core data types used throughout the stagehand library
//!
//! The types in this module represent:
//! - **Backup artifacts**: [`Snapshot`], [`SnapshotKind`] - one exported
//!   `.sql` file and the naming convention that tags it
//! - **Navigation state**: [`PointerState`], [`Neighbors`] - the persisted
//!   rollback/roll-forward pointers and the older/newer pair computed
//!   relative to a reference snapshot
//! - **Operations**: [`ImportOutcome`] - result of the production-import
//!   workflow
//!
//! A snapshot is immutable once created: this crate only ever creates new
//! artifacts or reads existing ones, it never rewrites them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One exported database backup artifact
///
/// Identified by its file path; the file's modification time serves as the
/// creation timestamp and drives the ordering of the snapshot sequence.
///
/// # Examples
///
/// ```rust
/// # use stagehand::types::{Snapshot, SnapshotKind};
/// # use std::path::PathBuf;
/// # use chrono::Utc;
/// let snapshot = Snapshot {
///     path: PathBuf::from("/backups/manual-backup-2026-08-06-12-30.sql"),
///     modified: Utc::now(),
/// };
/// assert_eq!(snapshot.kind(), Some(SnapshotKind::Manual));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Full path of the `.sql` artifact
    pub path: PathBuf,
    /// File modification time, used as the creation timestamp
    pub modified: DateTime<Utc>,
}

/// How a backup artifact came to exist, decoded from its file name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SnapshotKind {
    /// Operator ran `stagehand backup`
    Manual,
    /// Pre-import safety backup created by the import workflow
    Automatic,
    /// Production snapshot fetched from the remote host
    Imported,
}

impl SnapshotKind {
    /// File-name prefix used when producing an artifact of this kind
    pub fn prefix(&self) -> &'static str {
        match self {
            SnapshotKind::Manual => "manual-backup-",
            SnapshotKind::Automatic => "automatic-backup-",
            SnapshotKind::Imported => "backup_",
        }
    }
}

impl Snapshot {
    /// File name portion of the artifact path
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    /// Decode the kind tag from the file name, if it follows the naming
    /// scheme. Stray `.sql` files in the backup directory are still valid
    /// snapshots; they just carry no tag.
    pub fn kind(&self) -> Option<SnapshotKind> {
        let name = self.file_name();
        if name.starts_with(SnapshotKind::Manual.prefix()) {
            Some(SnapshotKind::Manual)
        } else if name.starts_with(SnapshotKind::Automatic.prefix()) {
            Some(SnapshotKind::Automatic)
        } else if name.starts_with(SnapshotKind::Imported.prefix()) {
            Some(SnapshotKind::Imported)
        } else {
            None
        }
    }

    /// Check whether this snapshot refers to the given artifact path
    pub fn is(&self, path: &Path) -> bool {
        self.path == path
    }

    /// One-line human-readable form for listings
    pub fn display_format(&self) -> String {
        format!(
            "{} ({})",
            self.file_name(),
            self.modified.format("%Y-%m-%d %H:%M:%S")
        )
    }
}

/// The persisted pair of navigation pointers
///
/// Each pointer, when set, names one snapshot by artifact path. Referential
/// integrity is best-effort: a pointer may go stale if the operator deletes
/// the file it names, and every consumer treats the failed lookup as "not
/// found" rather than an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointerState {
    /// Snapshot to restore to move the environment to an older state
    pub rollback_point: Option<PathBuf>,
    /// Snapshot to restore to move the environment to a newer state
    pub rollforward_point: Option<PathBuf>,
}

/// The older/newer pair adjacent to a reference snapshot
///
/// Computed against the newest-first snapshot sequence: `older` is the next
/// artifact further back in time, `newer` the next one forward. Both are
/// `None` when the reference is not present in the sequence.
#[derive(Debug, Clone, Copy, Default)]
pub struct Neighbors<'a> {
    /// Next snapshot further back in time, if any
    pub older: Option<&'a Snapshot>,
    /// Next snapshot forward in time, if any
    pub newer: Option<&'a Snapshot>,
}

/// Result of a completed production-import workflow
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportOutcome {
    /// Local path of the downloaded production artifact
    pub fetched_artifact: PathBuf,
    /// Safety backup taken just before the import overwrote the environment
    pub pre_import_backup: Snapshot,
    /// Wall-clock time for the whole workflow in milliseconds
    pub duration_ms: u64,
}
