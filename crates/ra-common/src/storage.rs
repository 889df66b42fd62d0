//! ---
//! ra_section: "01-core-functionality"
//! ra_subsection: "module"
//! ra_type: "source"
//! ra_scope: "code"
//! ra_description: "Shared primitives and utilities for the archive runtime."
//! ra_version: "v0.1.0"
//! ra_owner: "arsip-platform"
//! ---
//! String key/value stores standing in for browser session and local storage.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use thiserror::Error;
use tracing::{trace, warn};

/// Errors raised by a [`KeyValueStore`].
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("storage file {path} is not a valid key/value document: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Minimal string storage interface (`getItem` / `setItem` / `removeItem`).
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }
}

/// Process-local store; contents vanish with the value.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.write().insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries.write().remove(key);
        Ok(())
    }
}

/// Store backed by a single JSON object file.
///
/// Every operation re-reads the file so that separate processes (CLI
/// invocations) observe each other's writes. Writes go through a sibling
/// temporary file followed by a rename.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<BTreeMap<String, String>, StorageError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(BTreeMap::new())
            }
            Err(source) => {
                return Err(StorageError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&contents).map_err(|source| StorageError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    /// Current contents for a read-modify-write. A corrupt file is moved
    /// aside to `<name>.corrupt` and the write starts from an empty map;
    /// the flag tells the caller the file must be rewritten.
    fn map_for_update(&self) -> Result<(BTreeMap<String, String>, bool), StorageError> {
        match self.read_map() {
            Ok(map) => Ok((map, false)),
            Err(StorageError::Corrupt { path, source }) => {
                let backup = path.with_extension("json.corrupt");
                if let Err(err) = fs::rename(&path, &backup) {
                    warn!(path = %path.display(), error = %err, "could not keep a copy of corrupt storage file");
                }
                warn!(
                    path = %path.display(),
                    backup = %backup.display(),
                    error = %source,
                    "discarding corrupt storage file"
                );
                Ok((BTreeMap::new(), true))
            }
            Err(other) => Err(other),
        }
    }

    fn write_map(&self, map: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let io_err = |source| StorageError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(io_err)?;
            }
        }
        let body = serde_json::to_vec_pretty(map).map_err(|source| StorageError::Corrupt {
            path: self.path.clone(),
            source,
        })?;
        let tmp = self.path.with_extension("json.tmp");
        let mut file = fs::File::create(&tmp).map_err(io_err)?;
        file.write_all(&body).map_err(io_err)?;
        file.flush().map_err(io_err)?;
        drop(file);
        fs::rename(&tmp, &self.path).map_err(io_err)?;
        trace!(path = %self.path.display(), keys = map.len(), "storage file written");
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.read_map()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock();
        let (mut map, _) = self.map_for_update()?;
        map.insert(key.to_owned(), value.to_owned());
        self.write_map(&map)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock();
        let (mut map, discarded) = self.map_for_update()?;
        if map.remove(key).is_some() || discarded {
            self.write_map(&map)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn memory_store_set_get_remove() {
        let store = MemoryStore::new();
        store.set("a", "1").unwrap();
        assert_eq!(store.get("a").unwrap().as_deref(), Some("1"));
        store.remove("a").unwrap();
        assert!(store.get("a").unwrap().is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn file_store_is_visible_to_a_second_handle() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("local.json");
        let first = FileStore::new(&path);
        first.set("ruang-arsip.remember.userId", "3").unwrap();

        let second = FileStore::new(&path);
        assert_eq!(
            second.get("ruang-arsip.remember.userId").unwrap().as_deref(),
            Some("3")
        );
        second.remove("ruang-arsip.remember.userId").unwrap();
        assert!(first.get("ruang-arsip.remember.userId").unwrap().is_none());
    }

    #[test]
    fn missing_file_reads_as_empty() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().join("absent.json"));
        assert!(store.get("anything").unwrap().is_none());
        store.remove("anything").unwrap();
        assert!(!store.path().exists());
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("local.json");
        fs::write(&path, "{not json").unwrap();
        let store = FileStore::new(&path);
        assert!(matches!(
            store.get("key"),
            Err(StorageError::Corrupt { .. })
        ));
    }

    #[test]
    fn writes_recover_from_a_corrupt_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("local.json");
        fs::write(&path, "{not json").unwrap();
        let store = FileStore::new(&path);

        store.set("ruang-arsip.remember.userId", "2").unwrap();
        assert_eq!(
            store.get("ruang-arsip.remember.userId").unwrap().as_deref(),
            Some("2")
        );
        assert_eq!(
            fs::read_to_string(dir.path().join("local.json.corrupt")).unwrap(),
            "{not json"
        );

        fs::write(&path, "[1, 2").unwrap();
        store.remove("ruang-arsip.session.userId").unwrap();
        assert!(store.get("anything").unwrap().is_none());
    }
}
