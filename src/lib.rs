//! # Stagehand - production databases, staged locally
//!
//! Stagehand pulls a production database snapshot from a remote host,
//! imports it into a local staging environment, rewrites domain
//! references, and keeps a linear history of `.sql` backups the operator
//! can navigate with rollback and roll-forward pointers.
//!
//! ## Overview
//!
//! The heart of the crate is the history navigation engine: a pure layer
//! that, given the time-ordered backup sequence and the persisted pointer
//! pair, computes which snapshot is one step older or newer than a
//! reference and how the pointers move when a backup is created, rolled
//! back to, rolled forward to, or restored directly.
//!
//! Everything around that engine is an external collaborator reached
//! through subprocesses: the database export/import tool, the
//! search-replace tool, ssh, and curl. The crate only builds their command
//! lines and interprets success or failure.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use stagehand::{Staging, SystemRunner};
//!
//! # fn main() -> stagehand::Result<()> {
//! let mut staging = Staging::open(".stagehand", Box::new(SystemRunner))?;
//!
//! // Create a manual backup; the previous newest backup becomes the
//! // rollback point.
//! let snapshot = staging.backup()?;
//! println!("Backed up to {}", snapshot.display_format());
//!
//! // Later: undo whatever happened since.
//! let imported = staging.rollback()?;
//! println!("Rolled back to {:?}", imported);
//! # Ok(())
//! # }
//! ```
//!
//! ## Key Concepts
//!
//! ### Snapshots
//!
//! A snapshot is one exported `.sql` artifact in the backup directory,
//! identified by path and ordered by file modification time. Snapshots are
//! immutable: the tool creates them and reads them, never rewrites them.
//!
//! ### Pointers
//!
//! Two persisted options, `rollback_point` and `rollforward_point`, each
//! either unset or naming one snapshot. There is no explicit cursor into
//! history; each operation anchors on whichever pointer its transition
//! rule names and recomputes both pointers from that reference's
//! neighbors.
//!
//! ### Workflows
//!
//! [`Staging`] sequences each CLI command: read the sequence fresh from
//! disk, plan the pointer transition, run the external side effect, and
//! persist the pointer writes only after the side effect succeeded.
//!
//! ## Error Handling
//!
//! All operations return `Result<T, StagingError>`. Every error is
//! recoverable at the command level: the CLI reports it and exits
//! non-zero, and pointer state is never left beyond what already-completed
//! steps wrote.
//!
//! ## Module Organization
//!
//! - [`navigator`]: neighbor computation and the pointer transitions
//! - [`store`]: time-ordered view of the backup directory
//! - [`options`]: persisted key/value store holding settings and pointers
//! - [`config`]: typed per-invocation configuration
//! - [`producer`]: local snapshot creation via the external export tool
//! - [`remote`]: remote export, artifact download, remote cleanup
//! - [`workflow`]: the `Staging` facade the CLI drives
//! - [`exec`]: structured subprocess invocation seam
//! - [`types`]: shared data types
//! - [`error`]: error types and handling

pub mod config;
pub mod error;
pub mod exec;
pub mod navigator;
pub mod options;
pub mod producer;
pub mod remote;
pub mod store;
pub mod types;
pub mod workflow;

// Re-export main types for convenience
pub use config::{Directories, RemoteConfig, StagingConfig};
pub use error::{Result, StagingError};
pub use exec::{CommandOutput, CommandRunner, CommandSpec, ScriptedRunner, SystemRunner};
pub use navigator::{neighbors, NavigationStep, PointerPlan, PointerWrite};
pub use options::{JsonOptionStore, MemoryOptionStore, OptionStore};
pub use producer::SnapshotProducer;
pub use store::SnapshotStore;
pub use types::*;
pub use workflow::Staging;
