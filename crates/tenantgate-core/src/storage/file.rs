use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::debug;

use super::{KeyValueStore, StorageError};

/// Storage file name inside the storage directory
const STORAGE_FILE: &str = "storage.json";

/// On-disk layout of the storage file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StorageDocument {
    #[serde(default)]
    entries: BTreeMap<String, String>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
}

/// Durable store backed by a single JSON file.
///
/// Every write rewrites the whole document through a uniquely named
/// temporary file and a rename, so a concurrent reader (in this or another
/// process) sees either the old or the new document.
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    /// Open (or lazily create) the store inside `dir`
    pub fn new(dir: impl AsRef<Path>) -> Result<Self, StorageError> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        Ok(Self {
            path: dir.join(STORAGE_FILE),
            lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// When the document was last written, if ever
    pub fn updated_at(&self) -> Result<Option<DateTime<Utc>>, StorageError> {
        let _guard = self.lock.lock().map_err(|_| StorageError::poisoned())?;
        Ok(self.read_document()?.updated_at)
    }

    fn read_document(&self) -> Result<StorageDocument, StorageError> {
        if !self.path.exists() {
            return Ok(StorageDocument::default());
        }
        let contents = std::fs::read_to_string(&self.path)?;
        if contents.trim().is_empty() {
            return Ok(StorageDocument::default());
        }
        Ok(serde_json::from_str(&contents)?)
    }

    fn write_document(&self, mut document: StorageDocument) -> Result<(), StorageError> {
        document.updated_at = Some(Utc::now());
        let contents = serde_json::to_string_pretty(&document)?;

        // Unique temp file per write so concurrent processes never share one
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(contents.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        debug!(path = ?self.path, entries = document.entries.len(), "Storage document written");
        Ok(())
    }

    fn update<F>(&self, apply: F) -> Result<(), StorageError>
    where
        F: FnOnce(&mut BTreeMap<String, String>) -> bool,
    {
        let _guard = self.lock.lock().map_err(|_| StorageError::poisoned())?;
        let mut document = self.read_document()?;
        if apply(&mut document.entries) {
            self.write_document(document)?;
        }
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let _guard = self.lock.lock().map_err(|_| StorageError::poisoned())?;
        Ok(self.read_document()?.entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
            true
        })
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        // Skip the rewrite when nothing changes
        self.update(|entries| entries.remove(key).is_some())
    }
}

// ============================================================================
// Tests
// ============================================================================
