//! Snapshot store - the time-ordered view of the backup directory
//!
//! Every command reads the sequence fresh from disk; a CLI invocation is a
//! single-shot process, so there is nothing to cache between calls. The
//! sequence is totally ordered by modification time, ties broken by file
//! name, and the newest-first view is the exact reverse of the oldest-first
//! view so navigation can treat it as bidirectional.

use crate::error::Result;
use crate::types::Snapshot;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tracing::trace;
use walkdir::WalkDir;

/// Enumerates backup artifacts in the backup directory
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    backups_dir: PathBuf,
}

impl SnapshotStore {
    /// Create a store over the given backup directory
    pub fn new(backups_dir: impl Into<PathBuf>) -> Self {
        Self {
            backups_dir: backups_dir.into(),
        }
    }

    /// Directory this store scans
    pub fn dir(&self) -> &Path {
        &self.backups_dir
    }

    /// List all backup snapshots, newest first
    ///
    /// An absent or empty directory yields an empty sequence, not an error.
    pub fn list(&self) -> Result<Vec<Snapshot>> {
        if !self.backups_dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut snapshots = Vec::new();
        for entry in WalkDir::new(&self.backups_dir).min_depth(1).max_depth(1) {
            let entry = entry?;
            if !entry.file_type().is_file() || !is_backup_file(entry.path()) {
                continue;
            }
            let modified: DateTime<Utc> = entry.metadata()?.modified()?.into();
            snapshots.push(Snapshot {
                path: entry.path().to_path_buf(),
                modified,
            });
        }

        // Newest first; ties resolved by name so both views reverse cleanly.
        snapshots.sort_by(|a, b| {
            b.modified
                .cmp(&a.modified)
                .then_with(|| b.path.cmp(&a.path))
        });

        trace!(
            "Scanned {:?}: {} snapshot(s)",
            self.backups_dir,
            snapshots.len()
        );
        Ok(snapshots)
    }

    /// List all backup snapshots, oldest first
    ///
    /// Used for the numbered restore listing shown to the operator.
    pub fn list_oldest_first(&self) -> Result<Vec<Snapshot>> {
        let mut snapshots = self.list()?;
        snapshots.reverse();
        Ok(snapshots)
    }
}

fn is_backup_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "sql")
}
