//! Persisted key/value options
//!
//! The staging workflow keeps a small set of flat key/value settings - the
//! remote connection details plus the two navigation pointers - in an
//! external store addressed by prefixed string keys. The store contract is
//! deliberately tiny: get, set, delete. A key that is absent and a key that
//! holds an empty value both read as "unset".
//!
//! The default backend is a single JSON file next to the backup
//! directories, written atomically (write to a temp file, then rename) so a
//! killed process never leaves a half-written options file behind.

use crate::error::Result;
use crate::types::PointerState;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Shared prefix for every option key this tool owns
pub const OPTION_PREFIX: &str = "staging-";

/// Key (unprefixed) of the rollback pointer
pub const ROLLBACK_POINT: &str = "rollback_point";

/// Key (unprefixed) of the roll-forward pointer
pub const ROLLFORWARD_POINT: &str = "rollforward_point";

/// Qualify an option name with the shared prefix
pub fn option_key(name: &str) -> String {
    format!("{}{}", OPTION_PREFIX, name)
}

/// Contract for the persisted key/value store
///
/// Reading never mutates state. `get` returns `None` both for a missing key
/// and for a key holding an empty value.
pub trait OptionStore {
    /// Read a value; absent and empty are both `None`
    fn get(&self, key: &str) -> Option<String>;
    /// Write a value, persisting it before returning
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    /// Remove a key if present, persisting the removal before returning
    fn delete(&mut self, key: &str) -> Result<()>;
}

impl PointerState {
    /// Read both navigation pointers from the store
    pub fn load(store: &dyn OptionStore) -> Self {
        PointerState {
            rollback_point: store.get(&option_key(ROLLBACK_POINT)).map(PathBuf::from),
            rollforward_point: store.get(&option_key(ROLLFORWARD_POINT)).map(PathBuf::from),
        }
    }
}

/// Option store backed by a single JSON file
///
/// The whole map is held in memory for the lifetime of one command and
/// rewritten on every mutation. Commands are single-shot processes, so
/// there is no cross-invocation cache to invalidate.
#[derive(Debug)]
pub struct JsonOptionStore {
    path: PathBuf,
    values: HashMap<String, String>,
}

impl JsonOptionStore {
    /// Open the store at `path`, reading the existing file if there is one
    ///
    /// A missing file is an empty store, not an error.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let values = match fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(e.into()),
        };
        trace!("Opened option store at {:?} ({} keys)", path, values.len());
        Ok(Self { path, values })
    }

    fn persist(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_vec_pretty(&self.values)?;
        atomic_write(&self.path, &content)
    }
}

impl OptionStore for JsonOptionStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values
            .get(key)
            .filter(|v| !v.is_empty())
            .cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        self.persist()?;
        debug!("Option set: {} = {}", key, value);
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<()> {
        if self.values.remove(key).is_some() {
            self.persist()?;
            debug!("Option deleted: {}", key);
        }
        Ok(())
    }
}

/// In-memory store for tests and dry runs
#[derive(Debug, Default)]
pub struct MemoryOptionStore {
    values: HashMap<String, String>,
}

impl MemoryOptionStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a key, bypassing the unset-normalization on writes
    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.values.insert(key.to_string(), value.to_string());
        self
    }
}

impl OptionStore for MemoryOptionStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values
            .get(key)
            .filter(|v| !v.is_empty())
            .cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<()> {
        self.values.remove(key);
        Ok(())
    }
}

/// Atomic file write (write to temp file then rename)
///
/// Either the entire file is written or the previous content survives; no
/// partial writes are ever visible to another process.
pub(crate) fn atomic_write(path: &Path, content: &[u8]) -> Result<()> {
    let temp_path = path.with_extension("tmp");

    // Write to temp file
    fs::write(&temp_path, content)?;

    // Atomic rename
    fs::rename(&temp_path, path)?;

    Ok(())
}
