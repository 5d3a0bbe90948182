//! Workspace-scoped key/value persistence.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::core::CoreError;

/// Key under which the checked-path list is stored.
pub const CHECKED_PATHS_KEY: &str = "context-file-export.checkedPaths";
/// Key under which the ignore-pattern mode flag is stored.
pub const USE_GITIGNORE_KEY: &str = "context-file-export.useGitignore";

/// The persistence collaborator. Keys are opaque and scoped to one workspace.
#[async_trait]
pub trait StateStore: Send + Sync {
    async fn get(&self, key: &str) -> Option<Value>;
    async fn set(&self, key: &str, value: Value) -> Result<(), CoreError>;
}

/// An in-memory store for tests and hosts that keep no state between runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn get(&self, key: &str) -> Option<Value> {
        self.values
            .lock()
            .ok()
            .and_then(|values| values.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), CoreError> {
        let mut values = self
            .values
            .lock()
            .map_err(|e| CoreError::Storage(e.to_string()))?;
        values.insert(key.to_string(), value);
        Ok(())
    }
}

/// Stores all keys of one workspace in a single JSON object on disk.
///
/// Every `set` rewrites the file through a temporary file in the same
/// directory, so a crash never leaves a half-written state file behind.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    values: Mutex<Map<String, Value>>,
}

impl JsonFileStore {
    /// Opens the store at `path`. A missing file starts empty; a corrupt
    /// file is logged and also starts empty.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, CoreError> {
        let path = path.into();
        let values = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => match serde_json::from_str::<Map<String, Value>>(&contents) {
                Ok(values) => {
                    tracing::info!("Loaded workspace state from {:?}", path);
                    values
                }
                Err(e) => {
                    tracing::warn!(
                        "Failed to parse workspace state at {:?}: {}. Starting empty.",
                        path,
                        e
                    );
                    Map::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Map::new(),
            Err(e) => return Err(CoreError::from_io(e, &path)),
        };

        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }
}

fn write_atomically(path: &Path, contents: &str) -> Result<(), CoreError> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir).map_err(|e| CoreError::from_io(e, dir))?;

    let mut temp = tempfile::NamedTempFile::new_in(dir).map_err(|e| CoreError::from_io(e, dir))?;
    temp.write_all(contents.as_bytes())
        .map_err(|e| CoreError::from_io(e, temp.path()))?;
    temp.persist(path)
        .map_err(|e| CoreError::from_io(e.error, path))?;
    Ok(())
}

#[async_trait]
impl StateStore for JsonFileStore {
    async fn get(&self, key: &str) -> Option<Value> {
        self.values
            .lock()
            .ok()
            .and_then(|values| values.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), CoreError> {
        let serialized = {
            let mut values = self
                .values
                .lock()
                .map_err(|e| CoreError::Storage(e.to_string()))?;
            values.insert(key.to_string(), value);
            serde_json::to_string_pretty(&*values)?
        };

        let path = self.path.clone();
        tokio::task::spawn_blocking(move || write_atomically(&path, &serialized)).await??;
        tracing::debug!("Saved workspace state to {:?}", self.path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_memory_store_get_and_set() {
        let store = MemoryStore::new();
        assert!(store.get(CHECKED_PATHS_KEY).await.is_none());

        store.set(CHECKED_PATHS_KEY, json!(["/w/a.txt"])).await.unwrap();
        assert_eq!(
            store.get(CHECKED_PATHS_KEY).await,
            Some(json!(["/w/a.txt"]))
        );
    }

    #[tokio::test]
    async fn test_json_file_store_persists_across_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("workspaces/state.json");

        let store = JsonFileStore::open(&path).await.unwrap();
        store.set(USE_GITIGNORE_KEY, json!(true)).await.unwrap();
        store.set(CHECKED_PATHS_KEY, json!(["/w/a.txt"])).await.unwrap();

        let reopened = JsonFileStore::open(&path).await.unwrap();
        assert_eq!(reopened.get(USE_GITIGNORE_KEY).await, Some(json!(true)));
        assert_eq!(
            reopened.get(CHECKED_PATHS_KEY).await,
            Some(json!(["/w/a.txt"]))
        );
    }

    #[tokio::test]
    async fn test_json_file_store_recovers_from_corrupt_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{ not json").unwrap();

        let store = JsonFileStore::open(&path).await.unwrap();
        assert!(store.get(CHECKED_PATHS_KEY).await.is_none());

        store.set(CHECKED_PATHS_KEY, json!([])).await.unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains(CHECKED_PATHS_KEY));
    }
}
