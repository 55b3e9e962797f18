//! Staging workflows built on the navigator
//!
//! [`Staging`] is the facade the CLI talks to. It owns the configured
//! directories, the snapshot store, the option store, and the command
//! runner, and sequences each command as: read the sequence fresh, plan the
//! transition, perform the external side effect, then - only after the side
//! effect succeeded - persist the pointer writes. Execution is
//! single-threaded and fail-fast; there is no compensation for steps that
//! already completed, the operator rolls back afterwards if the outcome is
//! unwanted.

use crate::config::{Directories, StagingConfig};
use crate::error::{Result, StagingError};
use crate::exec::{CommandRunner, CommandSpec};
use crate::navigator::{
    plan_backup_created, plan_restore, plan_rollback, plan_rollforward, NavigationStep,
};
use crate::options::JsonOptionStore;
use crate::producer::{import_artifact_name, SnapshotProducer};
use crate::remote::{delete_remote_artifact, download_artifact, export_remote_database};
use crate::store::SnapshotStore;
use crate::types::{ImportOutcome, PointerState, Snapshot, SnapshotKind};
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

/// File name the fetched production dump is stored under locally
const FETCHED_ARTIFACT: &str = "production-backup.sql";

/// The staging environment: directories, stores, and workflows
pub struct Staging {
    config: StagingConfig,
    dirs: Directories,
    store: SnapshotStore,
    producer: SnapshotProducer,
    options: JsonOptionStore,
    runner: Box<dyn CommandRunner>,
}

impl std::fmt::Debug for Staging {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Staging")
            .field("dirs", &self.dirs)
            .field("config", &self.config)
            .finish()
    }
}

impl Staging {
    /// Open the staging environment rooted at `base`
    ///
    /// Creates the import/backup directories on first use and reads the
    /// options file and settings once for this invocation.
    pub fn open(base: impl Into<PathBuf>, runner: Box<dyn CommandRunner>) -> Result<Self> {
        let base = base.into();
        let dirs = Directories::new(&base);
        dirs.ensure()?;

        let options = JsonOptionStore::open(base.join("options.json"))?;
        let config = StagingConfig::load(&options);
        let store = SnapshotStore::new(&dirs.backups);
        let producer = SnapshotProducer::new(&dirs);

        Ok(Self {
            config,
            dirs,
            store,
            producer,
            options,
            runner,
        })
    }

    /// Settings loaded for this invocation
    pub fn config(&self) -> &StagingConfig {
        &self.config
    }

    /// Current navigation pointers; reading never mutates them
    pub fn pointer_state(&self) -> PointerState {
        PointerState::load(&self.options)
    }

    /// All backups, oldest first, for the numbered restore listing
    pub fn list_backups(&self) -> Result<Vec<Snapshot>> {
        self.store.list_oldest_first()
    }

    /// Create a manual backup of the local database
    ///
    /// After a successful export the previously newest backup, when there
    /// is one, becomes the rollback point. The roll-forward pointer is
    /// never touched by a backup.
    pub fn backup(&mut self) -> Result<Snapshot> {
        let snapshot = self
            .producer
            .create(self.runner.as_mut(), SnapshotKind::Manual)?;

        let sequence = self.store.list()?;
        let plan = plan_backup_created(&sequence, &snapshot.path);
        plan.apply(&mut self.options)?;

        Ok(snapshot)
    }

    /// Plan a rollback without performing it
    ///
    /// Lets the CLI show the operator what would be imported and where the
    /// pointers would move before asking for confirmation.
    pub fn preview_rollback(&self) -> Result<NavigationStep> {
        let sequence = self.store.list()?;
        plan_rollback(&sequence, &self.pointer_state())
    }

    /// Plan a roll-forward without performing it
    pub fn preview_rollforward(&self) -> Result<NavigationStep> {
        let sequence = self.store.list()?;
        plan_rollforward(&sequence, &self.pointer_state())
    }

    /// Roll the environment back to the stored rollback point
    ///
    /// Returns the path of the imported backup. Fails with zero writes when
    /// no rollback is possible.
    pub fn rollback(&mut self) -> Result<PathBuf> {
        let step = self.preview_rollback()?;

        let local_domain = self.config.local_domain()?.to_string();
        self.import_database(&step.import_target, Some(&local_domain))?;
        info!("Database rolled backward successfully");

        step.plan.apply(&mut self.options)?;
        Ok(step.import_target)
    }

    /// Roll the environment forward to the stored roll-forward point
    pub fn rollforward(&mut self) -> Result<PathBuf> {
        let step = self.preview_rollforward()?;

        let local_domain = self.config.local_domain()?.to_string();
        self.import_database(&step.import_target, Some(&local_domain))?;
        info!("Database rolled forward successfully");

        step.plan.apply(&mut self.options)?;
        Ok(step.import_target)
    }

    /// Restore an explicitly chosen backup from the numbered listing
    ///
    /// `selection` is 1-based into the oldest-first listing shown by
    /// [`Staging::list_backups`].
    pub fn restore(&mut self, selection: usize) -> Result<Snapshot> {
        let backups = self.list_backups()?;
        if backups.is_empty() {
            return Err(StagingError::NoBackupsFound);
        }
        if selection == 0 || selection > backups.len() {
            return Err(StagingError::InvalidSelection(format!(
                "{} (choose 1-{})",
                selection,
                backups.len()
            )));
        }
        let chosen = backups[selection - 1].clone();

        self.import_database(&chosen.path, None)?;
        info!("Local database restored from {:?}", chosen.path);

        let sequence = self.store.list()?;
        let plan = plan_restore(&sequence, &chosen);
        plan.apply(&mut self.options)?;

        Ok(chosen)
    }

    /// Pull the production database into the local environment
    ///
    /// Sequence: remote export, download, remote cleanup, pre-import safety
    /// backup, import, domain search-replace, settings resave. The first
    /// failing step aborts everything after it.
    pub fn import_production(&mut self) -> Result<ImportOutcome> {
        // Validate every required setting before the first side effect.
        let remote = self.config.remote()?;
        let remote_domain = self.config.remote_domain()?.to_string();
        let local_domain = self.config.local_domain()?.to_string();

        let start = Instant::now();
        let artifact = import_artifact_name(Utc::now());

        info!("Initiating remote database export");
        export_remote_database(self.runner.as_mut(), &remote, &artifact)?;

        let fetched = self.dirs.imports.join(FETCHED_ARTIFACT);
        download_artifact(self.runner.as_mut(), &remote_domain, &artifact, &fetched)?;
        delete_remote_artifact(self.runner.as_mut(), &remote, &artifact)?;

        let pre_import_backup = self
            .producer
            .create(self.runner.as_mut(), SnapshotKind::Automatic)?;
        let sequence = self.store.list()?;
        plan_backup_created(&sequence, &pre_import_backup.path).apply(&mut self.options)?;

        // The production dump still references the remote domain, so the
        // import targets it until search-replace rewrites the references.
        self.import_database(&fetched, Some(&remote_domain))?;
        self.search_replace(&remote_domain, &local_domain)?;

        self.config.resave(&mut self.options)?;

        info!("Import process complete");
        Ok(ImportOutcome {
            fetched_artifact: fetched,
            pre_import_backup,
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }

    fn import_database(&mut self, file: &Path, url: Option<&str>) -> Result<()> {
        let mut spec = CommandSpec::new("wp")
            .args(["db", "import"])
            .arg(file.to_string_lossy());
        if let Some(url) = url {
            spec = spec.arg(format!("--url={}", url));
        }
        debug!("Importing database: {}", spec);

        let output = self.runner.run(&spec)?;
        if !output.success {
            return Err(StagingError::import(format!(
                "database import from {:?} exited non-zero: {}",
                file,
                output.stderr.trim()
            )));
        }
        Ok(())
    }

    fn search_replace(&mut self, from: &str, to: &str) -> Result<()> {
        let spec = CommandSpec::new("wp")
            .arg("search-replace")
            .arg(from)
            .arg(to)
            .arg("--all-tables");
        debug!("Rewriting domains: {}", spec);

        let output = self.runner.run(&spec)?;
        if !output.success {
            return Err(StagingError::import(format!(
                "search-replace of {} -> {} exited non-zero: {}",
                from,
                to,
                output.stderr.trim()
            )));
        }
        info!("Domains replaced");
        Ok(())
    }
}
