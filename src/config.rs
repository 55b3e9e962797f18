//! Typed configuration assembled once per invocation
//!
//! The persisted settings live in the option store as flat prefixed keys.
//! They are read exactly once per command into a [`StagingConfig`], and
//! every component takes the struct (or a field of it) explicitly - nothing
//! in the library reaches back into the store by string key mid-operation.
//!
//! `local_domain` is provisioned by the environment and treated as
//! read-only here; the tool re-persists it but never edits it.

use crate::error::{Result, StagingError};
use crate::options::{option_key, OptionStore};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Default SSH port when the setting is absent
const DEFAULT_SSH_PORT: u16 = 22;

/// Default remote database port when the setting is absent
const DEFAULT_DB_PORT: u16 = 3306;

/// Names (unprefixed) of the persisted connection settings
const SETTING_NAMES: &[&str] = &[
    "remote_domain",
    "local_domain",
    "ssh_host",
    "ssh_port",
    "ssh_username",
    "ssh_private_key_path",
    "remote_app_path",
    "remote_db_port",
];

/// All persisted settings for one invocation
///
/// Raw values are kept as read; the typed accessors validate on use so that
/// commands which never touch the remote host (e.g. `backup`) still run on
/// a partially configured store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StagingConfig {
    remote_domain: Option<String>,
    local_domain: Option<String>,
    ssh_host: Option<String>,
    ssh_port: Option<String>,
    ssh_username: Option<String>,
    ssh_private_key_path: Option<String>,
    remote_app_path: Option<String>,
    remote_db_port: Option<String>,
}

/// Validated SSH/remote-host settings for the import workflow
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// Hostname or IP of the production server
    pub host: String,
    /// SSH port
    pub port: u16,
    /// SSH user
    pub username: String,
    /// Path to the SSH private key
    pub private_key_path: PathBuf,
    /// File system path of the remote application root
    pub app_path: String,
    /// Database port on the remote host
    pub db_port: u16,
}

impl StagingConfig {
    /// Assemble the configuration from the option store
    pub fn load(store: &dyn OptionStore) -> Self {
        let read = |name: &str| store.get(&option_key(name));
        let config = Self {
            remote_domain: read("remote_domain").map(|d| normalize_domain(&d)),
            local_domain: read("local_domain").map(|d| normalize_domain(&d)),
            ssh_host: read("ssh_host"),
            ssh_port: read("ssh_port"),
            ssh_username: read("ssh_username"),
            ssh_private_key_path: read("ssh_private_key_path"),
            remote_app_path: read("remote_app_path"),
            remote_db_port: read("remote_db_port"),
        };
        debug!("Loaded configuration: {:?}", config);
        config
    }

    /// Production domain, required for import and search-replace
    pub fn remote_domain(&self) -> Result<&str> {
        self.remote_domain
            .as_deref()
            .ok_or_else(|| StagingError::configuration("remote_domain"))
    }

    /// Local environment domain, required wherever an import targets it
    pub fn local_domain(&self) -> Result<&str> {
        self.local_domain
            .as_deref()
            .ok_or_else(|| StagingError::configuration("local_domain"))
    }

    /// Validated remote-host bundle, required for the import workflow
    pub fn remote(&self) -> Result<RemoteConfig> {
        let require = |value: &Option<String>, name: &str| {
            value
                .clone()
                .ok_or_else(|| StagingError::configuration(name))
        };
        Ok(RemoteConfig {
            host: require(&self.ssh_host, "ssh_host")?,
            port: parse_port(self.ssh_port.as_deref(), "ssh_port", DEFAULT_SSH_PORT)?,
            username: require(&self.ssh_username, "ssh_username")?,
            private_key_path: PathBuf::from(require(
                &self.ssh_private_key_path,
                "ssh_private_key_path",
            )?),
            app_path: require(&self.remote_app_path, "remote_app_path")?,
            db_port: parse_port(self.remote_db_port.as_deref(), "remote_db_port", DEFAULT_DB_PORT)?,
        })
    }

    /// Write every known setting back through the store
    ///
    /// A production import replaces the environment wholesale; re-persisting
    /// the settings afterwards keeps the freshly imported environment usable
    /// for the next staging command.
    pub fn resave(&self, store: &mut dyn OptionStore) -> Result<()> {
        let values = [
            &self.remote_domain,
            &self.local_domain,
            &self.ssh_host,
            &self.ssh_port,
            &self.ssh_username,
            &self.ssh_private_key_path,
            &self.remote_app_path,
            &self.remote_db_port,
        ];
        for (name, value) in SETTING_NAMES.iter().zip(values) {
            if let Some(value) = value {
                store.set(&option_key(name), value)?;
            }
        }
        info!("Settings re-persisted");
        Ok(())
    }
}

fn parse_port(value: Option<&str>, name: &str, default: u16) -> Result<u16> {
    match value {
        None => Ok(default),
        Some(raw) => raw
            .parse()
            .map_err(|_| StagingError::configuration(format!("{} ({:?} is not a port)", name, raw))),
    }
}

/// Strip scheme and trailing slash so domains compare and substitute cleanly
fn normalize_domain(domain: &str) -> String {
    domain
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_end_matches('/')
        .to_string()
}

/// The two working directories of the staging layout
///
/// `imports` holds transient downloaded artifacts, `backups` the persistent
/// snapshot sequence.
#[derive(Debug, Clone)]
pub struct Directories {
    /// Transient downloads from the remote host
    pub imports: PathBuf,
    /// The persistent backup sequence
    pub backups: PathBuf,
}

impl Directories {
    /// Derive the layout under a base directory
    pub fn new(base: &Path) -> Self {
        Self {
            imports: base.join("imports"),
            backups: base.join("backups"),
        }
    }

    /// Create both directories if absent
    pub fn ensure(&self) -> Result<()> {
        for (label, dir) in [("import", &self.imports), ("backup", &self.backups)] {
            if !dir.is_dir() {
                fs::create_dir_all(dir)?;
                info!("Created {} directory: {}", label, dir.display());
            }
        }
        Ok(())
    }
}
