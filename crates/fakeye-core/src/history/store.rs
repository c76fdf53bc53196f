//! Best-effort persisted history store

use super::{
    decode, encode, enforce_invariants, FileStorage, HistoryConfig, HistoryEntry, HistorySnapshot,
    HistoryStorage, MemoryStorage,
};
use std::path::PathBuf;
use tokio::sync::Mutex;

/// Loads, saves and clears the persisted history record.
///
/// Persistence failures are logged and swallowed: callers always get a usable
/// list back, and history never blocks a check.
pub struct HistoryStore {
    storage: Box<dyn HistoryStorage>,
    config: HistoryConfig,
    /// Revision of the last snapshot handed to storage
    written: Mutex<u64>,
}

impl HistoryStore {
    pub fn new(storage: Box<dyn HistoryStorage>, config: HistoryConfig) -> Self {
        Self {
            storage,
            config,
            written: Mutex::new(0),
        }
    }

    /// Store backed by a JSON file in `dir`
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self::new(Box::new(FileStorage::new(dir)), HistoryConfig::default())
    }

    /// Store that lives only as long as the process
    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryStorage::new()), HistoryConfig::default())
    }

    pub fn capacity(&self) -> usize {
        self.config.capacity
    }

    /// Read persisted entries; empty when absent or unreadable
    pub async fn load(&self) -> Vec<HistoryEntry> {
        let raw = match self.storage.read(&self.config.key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!("Failed to read history: {}", e);
                return Vec::new();
            }
        };

        match decode(&raw) {
            Ok(entries) => enforce_invariants(entries, self.config.capacity),
            Err(e) => {
                tracing::warn!("Discarding unreadable history: {}", e);
                Vec::new()
            }
        }
    }

    /// Persist up to `capacity` entries
    pub async fn save(&self, entries: &[HistoryEntry]) {
        let bounded = &entries[..entries.len().min(self.config.capacity)];

        let raw = match encode(bounded) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("Failed to serialize history: {}", e);
                return;
            }
        };

        if let Err(e) = self.storage.write(&self.config.key, &raw).await {
            tracing::warn!("Failed to persist history: {}", e);
        }
    }

    /// Persist a session snapshot. Snapshots older than the last one written
    /// are dropped, so overlapping writers cannot roll the record back.
    pub async fn persist(&self, snapshot: HistorySnapshot) {
        let mut written = self.written.lock().await;
        if snapshot.revision <= *written {
            tracing::debug!(
                "Skipping history revision {} (already wrote {})",
                snapshot.revision,
                *written
            );
            return;
        }

        if snapshot.entries.is_empty() {
            self.clear().await;
        } else {
            self.save(&snapshot.entries).await;
            tracing::debug!("Persisted {} history entries", snapshot.entries.len());
        }
        *written = snapshot.revision;
    }

    /// Remove persisted history
    pub async fn clear(&self) {
        if let Err(e) = self.storage.remove(&self.config.key).await {
            tracing::warn!("Failed to clear history: {}", e);
        }
    }
}

impl std::fmt::Debug for HistoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryStore")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
