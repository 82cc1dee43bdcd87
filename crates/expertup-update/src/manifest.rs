//! Installation manifest and the key-value store that persists it

use crate::error::{Result, UpdateError};
use crate::releases::{Release, ReleaseAsset};
use chrono::{DateTime, Utc};
use fs4::fs_std::FileExt;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

/// State key under which the manifest is stored
pub const MANIFEST_KEY: &str = "install_manifest";

/// Record of the installed server build
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Installed asset name, also the file name in the install directory
    pub name: String,

    /// Release tag the asset came from
    pub version: String,

    /// Upload time of the asset
    pub asset_timestamp: DateTime<Utc>,

    /// Modification time of the release
    pub release_timestamp: DateTime<Utc>,
}

impl Manifest {
    /// Describe an asset installed from a release
    pub fn from_release(release: &Release, asset: &ReleaseAsset) -> Self {
        Self {
            name: asset.name.clone(),
            version: release.tag_name.clone(),
            asset_timestamp: asset.updated_at,
            release_timestamp: release.timestamp().unwrap_or(asset.updated_at),
        }
    }

    /// Read the manifest, treating unreadable or undecodable state as absent
    pub fn load(store: &dyn StateStore) -> Option<Self> {
        let value = match store.get(MANIFEST_KEY) {
            Ok(Some(value)) => value,
            Ok(None) => return None,
            Err(e) => {
                warn!("Could not read install manifest, treating as not installed: {}", e);
                return None;
            }
        };

        match serde_json::from_value(value) {
            Ok(manifest) => Some(manifest),
            Err(e) => {
                warn!("Stored install manifest is corrupt, ignoring it: {}", e);
                None
            }
        }
    }

    /// Replace the stored manifest
    pub fn save(&self, store: &dyn StateStore) -> Result<()> {
        let value = serde_json::to_value(self)
            .map_err(|e| UpdateError::state(format!("Failed to encode manifest: {}", e)))?;
        store.set(MANIFEST_KEY, value)
    }
}

/// Durable key-value state owned by the host
pub trait StateStore: Send + Sync {
    /// Read a value, `Ok(None)` when the key was never set
    fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Replace the value of a key
    fn set(&self, key: &str, value: Value) -> Result<()>;
}

/// In-memory state store
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    values: Mutex<HashMap<String, Value>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStateStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        let values = self
            .values
            .lock()
            .map_err(|_| UpdateError::state("state lock poisoned"))?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        let mut values = self
            .values
            .lock()
            .map_err(|_| UpdateError::state("state lock poisoned"))?;
        values.insert(key.to_string(), value);
        Ok(())
    }
}

/// State store persisted as a single JSON object file
pub struct FileStateStore {
    path: PathBuf,
}

impl FileStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Default location (~/.expertup/state.json)
    pub fn default_path() -> Result<PathBuf> {
        let home = expertup_core::get_home_dir().map_err(|e| UpdateError::state(e.to_string()))?;
        Ok(home.join(".expertup").join("state.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        self.path.with_extension("json.lock")
    }

    fn read_all(&self) -> Result<Map<String, Value>> {
        if !self.path.exists() {
            return Ok(Map::new());
        }

        let content = fs::read_to_string(&self.path).map_err(|e| UpdateError::io(&self.path, e))?;
        if content.trim().is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_str::<Value>(&content) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(UpdateError::state(format!(
                "{} does not contain a JSON object",
                self.path.display()
            ))),
            Err(e) => Err(UpdateError::state(format!(
                "Failed to parse {}: {}",
                self.path.display(),
                e
            ))),
        }
    }
}

impl StateStore for FileStateStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.read_all()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| UpdateError::io(parent, e))?;
        }

        let lock_path = self.lock_path();
        let lock_file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .map_err(|e| UpdateError::io(&lock_path, e))?;

        // Released when `lock_file` is dropped
        lock_file
            .lock_exclusive()
            .map_err(|e| UpdateError::io(&lock_path, e))?;

        let mut values = match self.read_all() {
            Ok(values) => values,
            Err(e) => {
                warn!("Discarding unreadable state file {}: {}", self.path.display(), e);
                Map::new()
            }
        };
        values.insert(key.to_string(), value);

        let content = serde_json::to_string_pretty(&Value::Object(values))
            .map_err(|e| UpdateError::state(format!("Failed to encode state: {}", e)))?;

        let temp_path = self.path.with_extension("json.tmp");
        {
            let mut temp_file = fs::File::create(&temp_path).map_err(|e| UpdateError::io(&temp_path, e))?;
            temp_file
                .write_all(content.as_bytes())
                .and_then(|_| temp_file.sync_all())
                .map_err(|e| UpdateError::io(&temp_path, e))?;
        }

        fs::rename(&temp_path, &self.path).map_err(|e| UpdateError::io(&self.path, e))?;
        debug!("Wrote {} to {}", key, self.path.display());

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn sample_manifest() -> Manifest {
        Manifest {
            name: "expert_linux_amd64".to_string(),
            version: "nightly".to_string(),
            asset_timestamp: Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap(),
            release_timestamp: Utc.with_ymd_and_hms(2025, 3, 1, 12, 5, 0).unwrap(),
        }
    }

    #[test]
    fn test_manifest_json_keys() {
        let value = serde_json::to_value(sample_manifest()).unwrap();
        let object = value.as_object().unwrap();
        let mut keys: Vec<&str> = object.keys().map(String::as_str).collect();
        keys.sort();
        assert_eq!(
            keys,
            vec!["asset_timestamp", "name", "release_timestamp", "version"]
        );
        assert_eq!(object["asset_timestamp"], "2025-03-01T12:00:00Z");
    }

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemoryStateStore::new();
        assert!(Manifest::load(&store).is_none());

        let manifest = sample_manifest();
        manifest.save(&store).unwrap();
        assert_eq!(Manifest::load(&store), Some(manifest));
    }

    #[test]
    fn test_corrupt_manifest_is_treated_as_absent() {
        let store = MemoryStateStore::new();
        store
            .set(MANIFEST_KEY, serde_json::json!({"name": 3}))
            .unwrap();
        assert!(Manifest::load(&store).is_none());
    }

    #[test]
    fn test_file_store_round_trip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("state.json");
        let store = FileStateStore::new(&path);

        assert!(store.get(MANIFEST_KEY).unwrap().is_none());

        let manifest = sample_manifest();
        manifest.save(&store).unwrap();
        store.set("other", serde_json::json!(true)).unwrap();

        let reopened = FileStateStore::new(&path);
        assert_eq!(Manifest::load(&reopened), Some(manifest));
        assert_eq!(reopened.get("other").unwrap(), Some(serde_json::json!(true)));
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_file_store_replaces_manifest_whole() {
        let temp = TempDir::new().unwrap();
        let store = FileStateStore::new(temp.path().join("state.json"));

        sample_manifest().save(&store).unwrap();
        let replacement = Manifest {
            name: "expert_darwin_arm64".to_string(),
            version: "0.1.0".to_string(),
            ..sample_manifest()
        };
        replacement.save(&store).unwrap();

        assert_eq!(Manifest::load(&store), Some(replacement));
    }

    #[test]
    fn test_file_store_rejects_non_object() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("state.json");
        fs::write(&path, "[1, 2]").unwrap();

        let store = FileStateStore::new(&path);
        assert!(matches!(store.get(MANIFEST_KEY), Err(UpdateError::State { .. })));
        assert!(Manifest::load(&store).is_none());

        // Writing recovers the file
        sample_manifest().save(&store).unwrap();
        assert!(Manifest::load(&store).is_some());
    }
}
