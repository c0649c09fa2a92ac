use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::traits::{KeyValueStore, StoreError, StoreResult};

/// File-backed store.
///
/// Each key lives in `<root>/<namespace>/<key>.json`. Writes go to a sibling
/// temp file which is then renamed over the target.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open (creating if needed) the namespace directory under `root`
    pub fn open(root: impl AsRef<Path>, namespace: &str) -> StoreResult<Self> {
        let dir = root.as_ref().join(namespace);
        fs::create_dir_all(&dir).map_err(|source| StoreError::Io {
            key: namespace.to_string(),
            source,
        })?;
        Ok(Self { dir })
    }

    /// Directory holding this namespace's files
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn key_path(&self, key: &str) -> PathBuf {
        let safe_key = key.replace([':', '/', '\\'], "_");
        self.dir.join(format!("{safe_key}.json"))
    }

    fn io_error(key: &str) -> impl FnOnce(std::io::Error) -> StoreError + '_ {
        move |source| StoreError::Io {
            key: key.to_string(),
            source,
        }
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> StoreResult<Option<Value>> {
        let path = self.key_path(key);
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path).map_err(Self::io_error(key))?;
        let value = serde_json::from_str(&content).map_err(|source| StoreError::Corrupt {
            key: key.to_string(),
            source,
        })?;
        debug!(key = %key, "loaded value from file");
        Ok(Some(value))
    }

    fn set(&self, key: &str, value: &Value) -> StoreResult<()> {
        let path = self.key_path(key);
        let tmp = path.with_extension("json.tmp");

        let json = serde_json::to_string_pretty(value).map_err(|source| StoreError::Corrupt {
            key: key.to_string(),
            source,
        })?;
        fs::write(&tmp, json).map_err(Self::io_error(key))?;
        fs::rename(&tmp, &path).map_err(Self::io_error(key))?;
        debug!(key = %key, "saved value to file");
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        let path = self.key_path(key);
        if path.exists() {
            fs::remove_file(&path).map_err(Self::io_error(key))?;
        }
        Ok(())
    }
}
