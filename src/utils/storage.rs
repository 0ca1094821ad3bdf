//! Key-Value Substrate
//!
//! String get/set storage behind the credential store and the usage tracker.
//! - `MemoryStore`: DashMap-backed, process lifetime only
//! - `FileStore`: same map, flushed to a JSON file after every write so
//!   values survive restarts

use dashmap::DashMap;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use crate::models::errors::{AppError, AppResult, ErrorCode};

/// Persistent string storage
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> AppResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> AppResult<()>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    fn get(&self, key: &str) -> AppResult<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> AppResult<()> {
        (**self).set(key, value)
    }
}

/// In-memory store
#[derive(Clone, Default)]
pub struct MemoryStore {
    entries: Arc<DashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.entries.get(key).map(|v| v.value().clone()))
    }

    fn set(&self, key: &str, value: &str) -> AppResult<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// JSON-file-backed store
pub struct FileStore {
    path: PathBuf,
    entries: DashMap<String, String>,
    /// Serializes writes so two writers never interleave file contents
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Open (or create on first write) the store at `path`
    pub fn open(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = DashMap::new();

        if let Some(map) = read_file(&path)? {
            for (k, v) in map {
                entries.insert(k, v);
            }
            info!("💾 Loaded {} entries from {}", entries.len(), path.display());
        }

        Ok(Self {
            path,
            entries,
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_file(&self, snapshot: &BTreeMap<String, String>) -> AppResult<()> {
        let json = serde_json::to_string_pretty(snapshot)
            .map_err(|e| AppError::storage(format!("Serialize failed: {}", e)))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        // Write-then-rename so a crash never leaves a truncated file
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        debug!("💾 Flushed {} entries to {}", snapshot.len(), self.path.display());
        Ok(())
    }
}

/// Current file contents; `None` when the file does not exist yet
fn read_file(path: &Path) -> AppResult<Option<BTreeMap<String, String>>> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)?;
    if raw.trim().is_empty() {
        return Ok(Some(BTreeMap::new()));
    }
    serde_json::from_str(&raw).map(Some).map_err(|e| {
        AppError::with_source(
            ErrorCode::StorageError,
            format!("Corrupt data file {}", path.display()),
            e,
        )
    })
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.entries.get(key).map(|v| v.value().clone()))
    }

    /// Merges into the file as it is on disk, so keys written by another
    /// process survive. Memory only changes once the file is written.
    fn set(&self, key: &str, value: &str) -> AppResult<()> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| AppError::storage("Storage lock poisoned"))?;

        // BTreeMap keeps the file diff-friendly
        let mut snapshot = match read_file(&self.path)? {
            Some(on_disk) => on_disk,
            None => self
                .entries
                .iter()
                .map(|e| (e.key().clone(), e.value().clone()))
                .collect(),
        };
        snapshot.insert(key.to_string(), value.to_string());
        self.write_file(&snapshot)?;

        for (k, v) in snapshot {
            self.entries.insert(k, v);
        }
        Ok(())
    }
}
