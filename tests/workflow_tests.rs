//! End-to-end workflow tests
//!
//! Drives the public `Staging` API against real temp directories, with the
//! external tools replaced by a scripted runner. File modification times
//! are pinned with `filetime` so the snapshot ordering is deterministic.

use filetime::{set_file_mtime, FileTime};
use stagehand::{
    CommandOutput, CommandSpec, JsonOptionStore, OptionStore, ScriptedRunner, Staging,
    StagingError,
};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Seed a backup artifact with a pinned mtime
fn seed_backup(base: &Path, name: &str, mtime_secs: i64) -> PathBuf {
    let dir = base.join("backups");
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    fs::write(&path, "-- sql dump").unwrap();
    set_file_mtime(&path, FileTime::from_unix_time(mtime_secs, 0)).unwrap();
    path
}

/// Write settings/pointers into the options file before opening `Staging`
fn seed_options(base: &Path, entries: &[(&str, &str)]) {
    let mut store = JsonOptionStore::open(base.join("options.json")).unwrap();
    for (key, value) in entries {
        store.set(&format!("staging-{}", key), value).unwrap();
    }
}

fn open_options(base: &Path) -> JsonOptionStore {
    JsonOptionStore::open(base.join("options.json")).unwrap()
}

/// Runner whose export tool actually writes the dump file it was asked for
fn runner_with_export_effect() -> ScriptedRunner {
    let runner = ScriptedRunner::new();
    runner.set_effect(|spec: &CommandSpec| {
        if spec.program == "wp" && spec.args.first().map(String::as_str) == Some("db")
            && spec.args.get(1).map(String::as_str) == Some("export")
        {
            if let Some(target) = spec.args.get(2) {
                fs::write(target, "-- exported dump").unwrap();
            }
        }
    });
    runner
}

#[test]
fn test_backup_assigns_previous_newest_as_rollback_point() {
    let tmp = TempDir::new().unwrap();
    let previous = seed_backup(tmp.path(), "manual-backup-2026-08-01-09-00.sql", 1_000);
    seed_backup(tmp.path(), "manual-backup-2026-07-01-09-00.sql", 500);

    let runner = runner_with_export_effect();
    let mut staging = Staging::open(tmp.path(), Box::new(runner.clone())).unwrap();

    let snapshot = staging.backup().unwrap();
    assert!(snapshot.path.exists());

    let state = staging.pointer_state();
    assert_eq!(state.rollback_point, Some(previous));
    assert_eq!(state.rollforward_point, None);
}

#[test]
fn test_first_backup_leaves_pointers_unset() {
    let tmp = TempDir::new().unwrap();
    let runner = runner_with_export_effect();
    let mut staging = Staging::open(tmp.path(), Box::new(runner)).unwrap();

    staging.backup().unwrap();

    let state = staging.pointer_state();
    assert_eq!(state.rollback_point, None);
    assert_eq!(state.rollforward_point, None);
}

#[test]
fn test_rollback_imports_target_and_moves_pointers() {
    let tmp = TempDir::new().unwrap();
    let s1 = seed_backup(tmp.path(), "manual-backup-2026-08-01-09-00.sql", 1_000);
    let s2 = seed_backup(tmp.path(), "manual-backup-2026-08-02-09-00.sql", 2_000);
    let s3 = seed_backup(tmp.path(), "manual-backup-2026-08-03-09-00.sql", 3_000);

    seed_options(
        tmp.path(),
        &[
            ("local_domain", "staging.local"),
            ("rollback_point", s1.to_str().unwrap()),
            ("rollforward_point", s2.to_str().unwrap()),
        ],
    );

    let runner = ScriptedRunner::new();
    let mut staging = Staging::open(tmp.path(), Box::new(runner.clone())).unwrap();

    let imported = staging.rollback().unwrap();
    assert_eq!(imported, s1);

    let lines = runner.call_lines();
    assert_eq!(
        lines,
        vec![format!("wp db import {} --url=staging.local", s1.display())]
    );

    // Neighbors of the reference (s2): older is s1, newer is s3.
    let state = staging.pointer_state();
    assert_eq!(state.rollback_point, Some(s1));
    assert_eq!(state.rollforward_point, Some(s3));
}

#[test]
fn test_rollback_without_rollforward_point_writes_nothing() {
    let tmp = TempDir::new().unwrap();
    let s1 = seed_backup(tmp.path(), "manual-backup-2026-08-01-09-00.sql", 1_000);

    seed_options(
        tmp.path(),
        &[
            ("local_domain", "staging.local"),
            ("rollback_point", s1.to_str().unwrap()),
        ],
    );

    let runner = ScriptedRunner::new();
    let mut staging = Staging::open(tmp.path(), Box::new(runner.clone())).unwrap();

    assert!(matches!(
        staging.rollback(),
        Err(StagingError::NoRollbackPoint)
    ));
    assert!(runner.calls().is_empty());

    // Pointer state untouched.
    let options = open_options(tmp.path());
    assert_eq!(
        options.get("staging-rollback_point").as_deref(),
        s1.to_str()
    );
    assert_eq!(options.get("staging-rollforward_point"), None);
}

#[test]
fn test_rollback_with_dangling_pointer_does_not_import() {
    let tmp = TempDir::new().unwrap();
    let s2 = seed_backup(tmp.path(), "manual-backup-2026-08-02-09-00.sql", 2_000);
    let gone = tmp.path().join("backups/manual-backup-2026-07-15-09-00.sql");

    seed_options(
        tmp.path(),
        &[
            ("local_domain", "staging.local"),
            ("rollback_point", gone.to_str().unwrap()),
            ("rollforward_point", s2.to_str().unwrap()),
        ],
    );

    let runner = ScriptedRunner::new();
    let mut staging = Staging::open(tmp.path(), Box::new(runner.clone())).unwrap();

    assert!(matches!(
        staging.rollback(),
        Err(StagingError::SnapshotMissing(_))
    ));
    assert!(runner.calls().is_empty());
}

#[test]
fn test_rollforward_walks_older_and_clears_at_the_end() {
    let tmp = TempDir::new().unwrap();
    let s1 = seed_backup(tmp.path(), "manual-backup-2026-08-01-09-00.sql", 1_000);
    let s2 = seed_backup(tmp.path(), "manual-backup-2026-08-02-09-00.sql", 2_000);
    let s3 = seed_backup(tmp.path(), "manual-backup-2026-08-03-09-00.sql", 3_000);

    seed_options(
        tmp.path(),
        &[
            ("local_domain", "staging.local"),
            ("rollforward_point", s3.to_str().unwrap()),
        ],
    );

    let runner = ScriptedRunner::new();
    let mut staging = Staging::open(tmp.path(), Box::new(runner.clone())).unwrap();

    // Anchored at the newest: next roll-forward target is the older s2,
    // rollback untouched.
    assert_eq!(staging.rollforward().unwrap(), s3);
    let state = staging.pointer_state();
    assert_eq!(state.rollforward_point, Some(s2.clone()));
    assert_eq!(state.rollback_point, None);

    // Step again: anchored at s2, rollback picks up the newer s3.
    assert_eq!(staging.rollforward().unwrap(), s2);
    let state = staging.pointer_state();
    assert_eq!(state.rollforward_point, Some(s1.clone()));
    assert_eq!(state.rollback_point, Some(s3.clone()));

    // Last possible roll-forward clears the pointer.
    assert_eq!(staging.rollforward().unwrap(), s1);
    let state = staging.pointer_state();
    assert_eq!(state.rollforward_point, None);
    assert_eq!(state.rollback_point, Some(s2));

    assert!(matches!(
        staging.rollforward(),
        Err(StagingError::NoRollforwardPoint)
    ));
}

#[test]
fn test_restore_reanchors_both_pointers() {
    let tmp = TempDir::new().unwrap();
    let s1 = seed_backup(tmp.path(), "manual-backup-2026-08-01-09-00.sql", 1_000);
    let s2 = seed_backup(tmp.path(), "manual-backup-2026-08-02-09-00.sql", 2_000);
    let s3 = seed_backup(tmp.path(), "manual-backup-2026-08-03-09-00.sql", 3_000);

    let runner = ScriptedRunner::new();
    let mut staging = Staging::open(tmp.path(), Box::new(runner.clone())).unwrap();

    // Listing is oldest-first, so selection 2 is s2.
    let restored = staging.restore(2).unwrap();
    assert_eq!(restored.path, s2);

    let lines = runner.call_lines();
    assert_eq!(lines, vec![format!("wp db import {}", s2.display())]);

    let state = staging.pointer_state();
    assert_eq!(state.rollback_point, Some(s1));
    assert_eq!(state.rollforward_point, Some(s3));
}

#[test]
fn test_restore_of_oldest_clears_rollback() {
    let tmp = TempDir::new().unwrap();
    seed_backup(tmp.path(), "manual-backup-2026-08-01-09-00.sql", 1_000);
    let s2 = seed_backup(tmp.path(), "manual-backup-2026-08-02-09-00.sql", 2_000);

    seed_options(tmp.path(), &[("rollback_point", "/backups/stale.sql")]);

    let runner = ScriptedRunner::new();
    let mut staging = Staging::open(tmp.path(), Box::new(runner)).unwrap();

    staging.restore(1).unwrap();
    let state = staging.pointer_state();
    assert_eq!(state.rollback_point, None);
    assert_eq!(state.rollforward_point, Some(s2));
}

#[test]
fn test_restore_with_no_backups_writes_nothing() {
    let tmp = TempDir::new().unwrap();
    let runner = ScriptedRunner::new();
    let mut staging = Staging::open(tmp.path(), Box::new(runner.clone())).unwrap();

    assert!(matches!(
        staging.restore(1),
        Err(StagingError::NoBackupsFound)
    ));
    assert!(runner.calls().is_empty());
    assert_eq!(staging.pointer_state(), Default::default());
}

#[test]
fn test_restore_selection_out_of_range() {
    let tmp = TempDir::new().unwrap();
    seed_backup(tmp.path(), "manual-backup-2026-08-01-09-00.sql", 1_000);

    let runner = ScriptedRunner::new();
    let mut staging = Staging::open(tmp.path(), Box::new(runner.clone())).unwrap();

    assert!(matches!(
        staging.restore(0),
        Err(StagingError::InvalidSelection(_))
    ));
    assert!(matches!(
        staging.restore(5),
        Err(StagingError::InvalidSelection(_))
    ));
    assert!(runner.calls().is_empty());
}

fn seed_remote_settings(base: &Path) {
    seed_options(
        base,
        &[
            ("remote_domain", "https://www.example.com/"),
            ("local_domain", "http://staging.local"),
            ("ssh_host", "203.0.113.9"),
            ("ssh_port", "2222"),
            ("ssh_username", "master"),
            ("ssh_private_key_path", "/keys/id_ed25519"),
            ("remote_app_path", "/home/master/applications/app/public_html"),
        ],
    );
}

#[test]
fn test_import_production_runs_the_full_sequence() {
    let tmp = TempDir::new().unwrap();
    let previous = seed_backup(tmp.path(), "manual-backup-2026-08-01-09-00.sql", 1_000);
    seed_remote_settings(tmp.path());

    let runner = runner_with_export_effect();
    let mut staging = Staging::open(tmp.path(), Box::new(runner.clone())).unwrap();

    let outcome = staging.import_production().unwrap();
    assert_eq!(
        outcome.fetched_artifact,
        tmp.path().join("imports/production-backup.sql")
    );
    assert!(outcome.pre_import_backup.path.exists());

    let calls = runner.calls();
    assert_eq!(calls.len(), 6);
    assert_eq!(calls[0].program, "ssh"); // remote export
    assert_eq!(calls[1].program, "curl"); // download
    assert_eq!(calls[2].program, "ssh"); // remote cleanup
    assert_eq!(calls[3].args[..2], ["db".to_string(), "export".to_string()]); // safety backup
    assert_eq!(calls[4].args[..2], ["db".to_string(), "import".to_string()]);
    assert!(calls[4].args.contains(&"--url=www.example.com".to_string()));
    assert_eq!(calls[5].args[0], "search-replace");
    assert_eq!(
        calls[5].args[1..],
        [
            "www.example.com".to_string(),
            "staging.local".to_string(),
            "--all-tables".to_string()
        ]
    );

    // The safety backup fed transition #1: the previously newest backup
    // becomes the rollback point.
    let state = staging.pointer_state();
    assert_eq!(state.rollback_point, Some(previous));
}

#[test]
fn test_import_production_fails_fast() {
    let tmp = TempDir::new().unwrap();
    seed_remote_settings(tmp.path());

    let runner = ScriptedRunner::new();
    runner.push(CommandOutput::failed("ssh: connection timed out"));
    let mut staging = Staging::open(tmp.path(), Box::new(runner.clone())).unwrap();

    assert!(matches!(
        staging.import_production(),
        Err(StagingError::Export(_))
    ));
    // Remote export failed: nothing after it ran.
    assert_eq!(runner.calls().len(), 1);
    assert_eq!(staging.pointer_state(), Default::default());
}

#[test]
fn test_import_production_requires_remote_settings() {
    let tmp = TempDir::new().unwrap();
    seed_options(tmp.path(), &[("local_domain", "staging.local")]);

    let runner = ScriptedRunner::new();
    let mut staging = Staging::open(tmp.path(), Box::new(runner.clone())).unwrap();

    assert!(matches!(
        staging.import_production(),
        Err(StagingError::Configuration(_))
    ));
    assert!(runner.calls().is_empty());
}
