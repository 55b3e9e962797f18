//! Local snapshot production
//!
//! Creating a backup means asking the external database exporter to write
//! a `.sql` artifact into the backup directory under the deterministic
//! naming scheme, then handing the resulting [`Snapshot`] identity to the
//! navigator. A failed export is surfaced immediately - no retry - so the
//! enclosing workflow aborts before any pointer moves.

use crate::config::Directories;
use crate::error::{Result, StagingError};
use crate::exec::{CommandRunner, CommandSpec};
use crate::types::{Snapshot, SnapshotKind};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tracing::info;
use uuid::Uuid;

/// Minute-level artifact name for a manual or automatic backup
///
/// Minute granularity is deliberate: a second backup within the same
/// minute overwrites the first instead of piling up near-identical dumps.
pub fn artifact_name(kind: SnapshotKind, at: DateTime<Utc>) -> String {
    format!("{}{}.sql", kind.prefix(), at.format("%Y-%m-%d-%H-%M"))
}

/// Second-level name plus a random suffix for a fetched production dump
///
/// Remote imports can happen in quick succession and the name travels
/// through a remote shell and a public download URL, so these get second
/// granularity and a 7-character random tail to dodge collisions.
pub fn import_artifact_name(at: DateTime<Utc>) -> String {
    let suffix: String = Uuid::new_v4().simple().to_string().chars().take(7).collect();
    format!(
        "{}{}_{}.sql",
        SnapshotKind::Imported.prefix(),
        at.format("%Y-%m-%d-%H-%M-%S"),
        suffix
    )
}

/// Spec for the external database export tool
pub fn export_command(destination: &Path) -> CommandSpec {
    CommandSpec::new("wp")
        .args(["db", "export"])
        .arg(destination.to_string_lossy())
}

/// Creates local backup snapshots via the external export tool
#[derive(Debug)]
pub struct SnapshotProducer {
    backups_dir: PathBuf,
}

impl SnapshotProducer {
    /// Producer writing into the configured backup directory
    pub fn new(dirs: &Directories) -> Self {
        Self {
            backups_dir: dirs.backups.clone(),
        }
    }

    /// Export the current local database as a new backup artifact
    pub fn create(&self, runner: &mut dyn CommandRunner, kind: SnapshotKind) -> Result<Snapshot> {
        self.create_at(runner, kind, Utc::now())
    }

    /// As [`SnapshotProducer::create`], with an explicit timestamp
    pub fn create_at(
        &self,
        runner: &mut dyn CommandRunner,
        kind: SnapshotKind,
        at: DateTime<Utc>,
    ) -> Result<Snapshot> {
        let path = self.backups_dir.join(artifact_name(kind, at));
        let output = runner.run(&export_command(&path))?;
        if !output.success {
            return Err(StagingError::export(format!(
                "database export to {:?} exited non-zero: {}",
                path,
                output.stderr.trim()
            )));
        }
        info!("Local database backed up to {:?}", path);
        Ok(Snapshot { path, modified: at })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::{CommandOutput, ScriptedRunner};
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 6, 12, 30, 59).unwrap()
    }

    fn dirs(base: &Path) -> Directories {
        Directories::new(base)
    }

    #[test]
    fn test_artifact_names_follow_the_scheme() {
        assert_eq!(
            artifact_name(SnapshotKind::Manual, at()),
            "manual-backup-2026-08-06-12-30.sql"
        );
        assert_eq!(
            artifact_name(SnapshotKind::Automatic, at()),
            "automatic-backup-2026-08-06-12-30.sql"
        );

        let imported = import_artifact_name(at());
        assert!(imported.starts_with("backup_2026-08-06-12-30-59_"));
        assert!(imported.ends_with(".sql"));
        // prefix + second-level timestamp + "_" + 7 random chars + ".sql"
        assert_eq!(imported.len(), "backup_2026-08-06-12-30-59_".len() + 7 + 4);
    }

    #[test]
    fn test_create_invokes_the_export_tool() {
        let runner = ScriptedRunner::new();
        let producer = SnapshotProducer::new(&dirs(Path::new("/srv/staging")));

        let snapshot = producer
            .create_at(&mut runner.clone(), SnapshotKind::Manual, at())
            .unwrap();
        assert_eq!(
            snapshot.path,
            Path::new("/srv/staging/backups/manual-backup-2026-08-06-12-30.sql")
        );

        let calls = runner.call_lines();
        assert_eq!(
            calls,
            vec!["wp db export /srv/staging/backups/manual-backup-2026-08-06-12-30.sql"]
        );
    }

    #[test]
    fn test_export_failure_is_typed_and_immediate() {
        let runner = ScriptedRunner::new();
        runner.push(CommandOutput::failed("mysqldump: connection refused"));
        let producer = SnapshotProducer::new(&dirs(Path::new("/srv/staging")));

        match producer.create_at(&mut runner.clone(), SnapshotKind::Automatic, at()) {
            Err(StagingError::Export(msg)) => assert!(msg.contains("connection refused")),
            other => panic!("expected export error, got {:?}", other),
        }
        assert_eq!(runner.calls().len(), 1);
    }
}
