//! Asynchronous key-value storage backends.
//!
//! The persistence layer treats storage as an opaque async map from string
//! keys to JSON values. Two backends are provided:
//!
//! - [`MemoryStore`]: an in-process map, for tests and throwaway sessions.
//! - [`FileStore`]: one `<key>.json` file per key under a base directory,
//!   written atomically via a temp-rename so readers never see a
//!   partially-written value.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::error::StorageError;

/// An asynchronous store of JSON values addressed by string keys.
///
/// `set` overwrites any previous value. Implementations must be safe to
/// share with the background persistence writer.
#[async_trait]
pub trait KeyValueStore: Send + Sync + 'static {
    /// Read the value under `key`, or `None` if nothing is stored.
    async fn get(&self, key: &str) -> Result<Option<Value>, StorageError>;

    /// Store `value` under `key`, replacing what was there.
    async fn set(&self, key: &str, value: Value) -> Result<(), StorageError>;
}

// Lets callers keep a handle on the backend they pass to the store.
#[async_trait]
impl<S: KeyValueStore> KeyValueStore for Arc<S> {
    async fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StorageError> {
        (**self).set(key, value).await
    }
}

/// In-memory backend.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently stored.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StorageError> {
        self.entries.write().await.insert(key.to_owned(), value);
        Ok(())
    }
}

/// File-backed store.
///
/// The layout is flat:
/// ```text
/// <base_dir>/
///     <key>.json
///     <key>.json.tmp    -- only while a write is in flight
/// ```
#[derive(Debug, Clone)]
pub struct FileStore {
    base_dir: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `base_dir`. The directory is created
    /// lazily on the first write.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Path of the file holding `key`.
    ///
    /// # Errors
    ///
    /// [`StorageError::InvalidKey`] for empty keys, keys containing a path
    /// separator, and `.`/`..`.
    pub fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let invalid = key.is_empty()
            || key == "."
            || key == ".."
            || key.contains(['/', '\\'])
            || key.contains('\0');
        if invalid {
            return Err(StorageError::InvalidKey(key.to_owned()));
        }
        Ok(self.base_dir.join(format!("{key}.json")))
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        let path = self.path_for(key)?;
        let bytes = match tokio::fs::read(&path).await {
            Ok(b) => b,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        tokio::fs::create_dir_all(&self.base_dir).await?;

        let tmp_path = path.with_extension("json.tmp");
        let json = serde_json::to_vec_pretty(&value)?;
        tokio::fs::write(&tmp_path, &json).await?;
        tokio::fs::rename(&tmp_path, &path).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn memory_get_missing_returns_none() {
        let store = MemoryStore::new();
        assert_eq!(store.get("k").await.unwrap(), None);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn memory_set_overwrites() {
        let store = MemoryStore::new();
        store.set("k", json!([1])).await.unwrap();
        store.set("k", json!([2])).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(json!([2])));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn arc_store_shares_state() {
        let store = Arc::new(MemoryStore::new());
        let shared = Arc::clone(&store);
        shared.set("k", json!("v")).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(json!("v")));
    }

    #[test]
    fn path_for_maps_key_to_json_file() {
        let store = FileStore::new("/data/app");
        assert_eq!(
            store.path_for("todo-20200101").unwrap(),
            PathBuf::from("/data/app/todo-20200101.json")
        );
    }

    #[test]
    fn path_for_rejects_traversal() {
        let store = FileStore::new("/data/app");
        for key in ["", ".", "..", "../etc/passwd", "a/b", "a\\b"] {
            assert!(
                matches!(store.path_for(key), Err(StorageError::InvalidKey(_))),
                "key {key:?} should be rejected"
            );
        }
    }

    #[tokio::test]
    async fn file_get_missing_returns_none() {
        let tmp = TempDir::new().expect("failed to create temp dir");
        let store = FileStore::new(tmp.path());
        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn file_set_then_get_roundtrips() {
        let tmp = TempDir::new().expect("failed to create temp dir");
        let store = FileStore::new(tmp.path().join("nested"));
        let value = json!([{"id": 1, "value": "x", "checked": false, "removed": true}]);

        store.set("k", value.clone()).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(value));
    }

    #[tokio::test]
    async fn file_set_uses_atomic_temp_rename() {
        let tmp = TempDir::new().expect("failed to create temp dir");
        let store = FileStore::new(tmp.path());
        store.set("k", json!([])).await.unwrap();

        let final_path = store.path_for("k").unwrap();
        assert!(final_path.exists(), "final file should exist");
        assert!(
            !final_path.with_extension("json.tmp").exists(),
            "temp file should not exist after successful save"
        );
    }

    #[tokio::test]
    async fn file_corrupt_json_is_serialization_error() {
        let tmp = TempDir::new().expect("failed to create temp dir");
        let store = FileStore::new(tmp.path());
        std::fs::write(tmp.path().join("k.json"), b"not json!!!").expect("write corrupt file");

        let result = store.get("k").await;
        assert!(
            matches!(result, Err(StorageError::Serialization(_))),
            "expected Serialization error, got: {result:?}"
        );
    }
}
