//! Error types for the stagehand library
//!
//! Every failure a command can hit is represented here. All of them are
//! recoverable at the command level: the CLI reports the message and exits
//! non-zero, leaving pointer state exactly as the last completed write left
//! it. Nothing in this crate aborts the process from library code.

use std::path::PathBuf;
use thiserror::Error;

/// Type alias for Results in the stagehand library
pub type Result<T> = std::result::Result<T, StagingError>;

/// Main error type for all staging operations
#[derive(Debug, Error)]
pub enum StagingError {
    /// I/O errors during file operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Errors during JSON serialization/deserialization
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Walk directory error from walkdir crate
    #[error("Walk directory error")]
    WalkDir(#[from] walkdir::Error),

    /// A required setting is missing or unusable
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// External database export tool reported a non-zero exit status
    #[error("Export failed: {0}")]
    Export(String),

    /// External database import tool reported a non-zero exit status
    #[error("Import failed: {0}")]
    Import(String),

    /// Fetching an artifact from the remote host failed
    #[error("Transfer failed: {0}")]
    Transfer(String),

    /// Rollback requested but no rollback point is established
    #[error("No rollback point set")]
    NoRollbackPoint,

    /// Roll-forward requested but no roll-forward point is established
    #[error("No roll-forward point set")]
    NoRollforwardPoint,

    /// An operation needed at least one backup and the directory has none
    #[error("No .sql backups found in the backup directory")]
    NoBackupsFound,

    /// Restore selection is not a valid entry in the backup listing
    #[error("Invalid selection: {0}")]
    InvalidSelection(String),

    /// A pointer names a backup file that no longer exists on disk
    #[error("Backup file missing: {0:?}")]
    SnapshotMissing(PathBuf),
}

impl StagingError {
    /// Create a configuration error with a custom message
    pub fn configuration(msg: impl Into<String>) -> Self {
        StagingError::Configuration(msg.into())
    }

    /// Create an export error with a custom message
    pub fn export(msg: impl Into<String>) -> Self {
        StagingError::Export(msg.into())
    }

    /// Create an import error with a custom message
    pub fn import(msg: impl Into<String>) -> Self {
        StagingError::Import(msg.into())
    }

    /// Create a transfer error with a custom message
    pub fn transfer(msg: impl Into<String>) -> Self {
        StagingError::Transfer(msg.into())
    }

    /// Get a user-friendly error message with suggestions
    pub fn user_message(&self) -> String {
        match self {
            StagingError::NoRollbackPoint => {
                "No rollback point set. Run 'stagehand backup', 'stagehand rollforward', or \
                 'stagehand import' before attempting a rollback."
                    .to_string()
            }
            StagingError::NoRollforwardPoint => {
                "No roll-forward point set. Run 'stagehand rollback' before attempting a \
                 roll-forward."
                    .to_string()
            }
            StagingError::Configuration(key) => {
                format!(
                    "Missing or invalid setting: {}. Set it in the options file before \
                     running this command.",
                    key
                )
            }
            StagingError::SnapshotMissing(path) => {
                format!(
                    "Backup file {:?} is referenced by a saved pointer but no longer exists. \
                     Run 'stagehand restore' to re-anchor on an existing backup.",
                    path
                )
            }
            _ => self.to_string(),
        }
    }
}
