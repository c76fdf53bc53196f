//! Key/value persistence for the history record

use async_trait::async_trait;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Mutex;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt record: {0}")]
    Corrupt(String),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Persistence backend for named records
#[async_trait]
pub trait HistoryStorage: Send + Sync {
    /// Read a record; `Ok(None)` when it does not exist
    async fn read(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replace a record wholesale
    async fn write(&self, key: &str, contents: &str) -> Result<(), StorageError>;

    /// Delete a record; deleting a missing record succeeds
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// One JSON file per key inside a data directory
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

#[async_trait]
impl HistoryStorage for FileStorage {
    async fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, key: &str, contents: &str) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(&self.dir).await?;

        // Write to a sibling file first so readers never see a torn record
        let path = self.path_for(key);
        let tmp = self.dir.join(format!("{key}.json.tmp"));
        tokio::fs::write(&tmp, contents).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Process-local storage, used by tests and ephemeral sessions
#[derive(Debug, Default)]
pub struct MemoryStorage {
    records: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn records(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, StorageError> {
        self.records
            .lock()
            .map_err(|_| StorageError::Unavailable("memory storage lock poisoned".to_string()))
    }
}

#[async_trait]
impl HistoryStorage for MemoryStorage {
    async fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.records()?.get(key).cloned())
    }

    async fn write(&self, key: &str, contents: &str) -> Result<(), StorageError> {
        self.records()?.insert(key.to_string(), contents.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.records()?.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_file_storage_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("nested"));

        assert!(storage.read("k").await.unwrap().is_none());
        storage.write("k", "{\"a\":1}").await.unwrap();
        assert_eq!(storage.read("k").await.unwrap().as_deref(), Some("{\"a\":1}"));
        assert_eq!(storage.path_for("k"), dir.path().join("nested").join("k.json"));
        assert!(!dir.path().join("nested").join("k.json.tmp").exists());

        storage.write("k", "[]").await.unwrap();
        assert_eq!(storage.read("k").await.unwrap().as_deref(), Some("[]"));

        storage.remove("k").await.unwrap();
        storage.remove("k").await.unwrap();
        assert!(storage.read("k").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_memory_storage_lifecycle() {
        let storage = MemoryStorage::new();
        assert!(storage.read("k").await.unwrap().is_none());
        storage.write("k", "v").await.unwrap();
        assert_eq!(storage.read("k").await.unwrap().as_deref(), Some("v"));
        storage.remove("k").await.unwrap();
        assert!(storage.read("k").await.unwrap().is_none());
    }
}
