use std::{
    collections::{BTreeMap, HashMap},
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use parking_lot::Mutex;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use super::StoreError;

/// String key-value storage.
///
/// Implementations must be safe to share between tasks; callers assume a
/// single writer per key space.
pub trait KeyValueBackend: Send + Sync {
    /// Returns the value stored under `key`, if any.
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Deletes `key`. Removing an absent key is not an error.
    fn remove_item(&self, key: &str) -> Result<(), StoreError>;
}

/// Backend keeping every key in one JSON object on disk.
///
/// Each write rewrites the whole document through a temporary file that is
/// renamed over the original, so readers never observe a partial write.
pub struct FileBackend {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileBackend {
    /// Backend stored at `path`. The file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Location of the storage document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<BTreeMap<String, String>, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(err) => return Err(err.into()),
        };
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&content).map_err(StoreError::Corrupt)
    }

    /// Document to update on write. An undecodable document is copied to
    /// `<path>.corrupt` and replaced by an empty one so writes keep working.
    fn read_map_for_write(&self) -> Result<BTreeMap<String, String>, StoreError> {
        match self.read_map() {
            Err(StoreError::Corrupt(err)) => {
                let backup = self.corrupt_backup_path();
                warn!(
                    path = %self.path.display(),
                    backup = %backup.display(),
                    error = %err,
                    "storage document is corrupt; starting a new one"
                );
                if let Err(err) = fs::copy(&self.path, &backup) {
                    warn!(error = %err, "failed to keep corrupt storage document");
                }
                Ok(BTreeMap::new())
            }
            other => other,
        }
    }

    fn corrupt_backup_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(".corrupt");
        PathBuf::from(name)
    }

    fn write_map(&self, map: &BTreeMap<String, String>) -> Result<(), StoreError> {
        let parent = self
            .path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(parent)?;

        let serialized = serde_json::to_vec_pretty(map).map_err(StoreError::Encode)?;
        let mut file = NamedTempFile::new_in(parent)?;
        file.write_all(&serialized)?;
        file.as_file().sync_all()?;
        file.persist(&self.path)
            .map_err(|err| StoreError::Io(err.error))?;
        debug!(path = %self.path.display(), keys = map.len(), "storage written");
        Ok(())
    }
}

impl KeyValueBackend for FileBackend {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        let _guard = self.lock.lock();
        Ok(self.read_map()?.remove(key))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let _guard = self.lock.lock();
        let mut map = self.read_map_for_write()?;
        map.insert(key.to_string(), value.to_string());
        self.write_map(&map)
    }

    fn remove_item(&self, key: &str) -> Result<(), StoreError> {
        let _guard = self.lock.lock();
        let mut map = self.read_map_for_write()?;
        if map.remove(key).is_some() {
            self.write_map(&map)?;
        }
        Ok(())
    }
}

/// Volatile backend, mainly for tests.
#[derive(Default)]
pub struct MemoryBackend {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryBackend {
    /// Empty in-memory backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend pre-populated with `items`.
    pub fn with_items<K, V>(items: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            items: Mutex::new(
                items
                    .into_iter()
                    .map(|(key, value)| (key.into(), value.into()))
                    .collect(),
            ),
        }
    }
}

impl KeyValueBackend for MemoryBackend {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.items.lock().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.items.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StoreError> {
        self.items.lock().remove(key);
        Ok(())
    }
}
