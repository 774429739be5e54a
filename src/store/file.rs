//! JSON file backed key/value store.
//!
//! The whole store is one JSON object. Every write replaces the file
//! atomically: the document is written to a temporary file in the same
//! directory and renamed over the target.

// ============================================================================
// Imports
// ============================================================================

use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tempfile::NamedTempFile;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::{Error, Result};

use super::KeyValueStore;

// ============================================================================
// FileStore
// ============================================================================

/// Store persisted to a single JSON file.
///
/// The file is read once on first access and cached. A missing file is an
/// empty store; a corrupt file is logged and treated as empty so the
/// coordinator can still start.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    cache: Mutex<Option<Map<String, Value>>>,
}

impl FileStore {
    /// Creates a store for the given file path. Nothing is read yet.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: Mutex::new(None),
        }
    }

    /// Returns the backing file path.
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_document(path: &Path) -> Result<Map<String, Value>> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "Store file missing, starting empty");
                return Ok(Map::new());
            }
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_slice::<Value>(&bytes) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(other) => {
                warn!(path = %path.display(), kind = ?other, "Store file is not an object, ignoring");
                Ok(Map::new())
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Store file is corrupt, ignoring");
                Ok(Map::new())
            }
        }
    }

    async fn write_document(path: PathBuf, document: Map<String, Value>) -> Result<()> {
        let json = serde_json::to_vec_pretty(&Value::Object(document))?;

        tokio::task::spawn_blocking(move || -> Result<()> {
            let dir = match path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
                _ => PathBuf::from("."),
            };
            std::fs::create_dir_all(&dir)?;

            let mut tmp = NamedTempFile::new_in(&dir)?;
            tmp.write_all(&json)?;
            tmp.as_file().sync_all()?;
            tmp.persist(&path).map_err(|e| Error::Io(e.error))?;
            Ok(())
        })
        .await
        .map_err(|e| Error::storage(format!("write task failed: {e}")))?
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let mut cache = self.cache.lock().await;
        if cache.is_none() {
            *cache = Some(Self::read_document(&self.path).await?);
        }
        Ok(cache.as_ref().and_then(|map| map.get(key).cloned()))
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        let mut cache = self.cache.lock().await;
        if cache.is_none() {
            *cache = Some(Self::read_document(&self.path).await?);
        }

        let document = cache.get_or_insert_with(Map::new);
        document.insert(key.to_string(), value);

        Self::write_document(self.path.clone(), document.clone()).await?;
        debug!(path = %self.path.display(), key, "Store written");
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let dir = tempdir().expect("tempdir");
        let store = FileStore::new(dir.path().join("state.json"));

        assert_eq!(store.get("active").await.expect("get"), None);
    }

    #[tokio::test]
    async fn test_values_survive_reopen() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("state.json");

        let store = FileStore::new(&path);
        store.set("active", json!(true)).await.expect("set");
        store
            .set("coords", json!({"lat": 1.5, "long": 2.5}))
            .await
            .expect("set");

        let reopened = FileStore::new(&path);
        assert_eq!(reopened.get("active").await.expect("get"), Some(json!(true)));
        assert_eq!(
            reopened.get("coords").await.expect("get"),
            Some(json!({"lat": 1.5, "long": 2.5}))
        );
    }

    #[tokio::test]
    async fn test_corrupt_file_is_empty() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("state.json");
        std::fs::write(&path, b"{not json").expect("write");

        let store = FileStore::new(&path);
        assert_eq!(store.get("active").await.expect("get"), None);

        store.set("active", json!(false)).await.expect("set");
        let raw = std::fs::read_to_string(&path).expect("read");
        assert!(raw.contains("\"active\": false"));
    }
}
