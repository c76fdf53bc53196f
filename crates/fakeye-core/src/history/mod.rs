//! Bounded, deduplicated history of past checks

pub mod storage;
pub mod store;

pub use storage::{FileStorage, HistoryStorage, MemoryStorage, StorageError};
pub use store::HistoryStore;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

/// Storage key of the persisted history record
pub const HISTORY_KEY: &str = "fakeye_history_v1";

/// Format version written into the persisted record
pub const HISTORY_FORMAT_VERSION: u32 = 1;

/// Default number of entries kept
pub const DEFAULT_CAPACITY: usize = 30;

/// One past check
///
/// The raw payload is kept as received so replays are normalized with the
/// current rules. Aliases accept the `{q, raw, ts}` shape written by the
/// browser client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    #[serde(alias = "q")]
    pub query: String,
    #[serde(alias = "raw", default)]
    pub raw_response: Value,
    #[serde(alias = "ts", deserialize_with = "timestamp::deserialize")]
    pub timestamp: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn new(query: &str, raw_response: Value) -> Self {
        Self::at(query, raw_response, Utc::now())
    }

    pub fn at(query: &str, raw_response: Value, timestamp: DateTime<Utc>) -> Self {
        Self {
            query: query.to_string(),
            raw_response,
            timestamp,
        }
    }
}

/// History configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Storage key of the persisted record
    pub key: String,
    /// Maximum number of entries kept
    pub capacity: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            key: HISTORY_KEY.to_string(),
            capacity: DEFAULT_CAPACITY,
        }
    }
}

/// History list as of one in-memory revision, handed to the store for
/// writing once the session lock is released
#[derive(Debug, Clone, PartialEq)]
pub struct HistorySnapshot {
    pub revision: u64,
    pub entries: Vec<HistoryEntry>,
}

/// Prepend an entry for `query`, dropping any older entry with the same query
/// and truncating to `capacity`. The input is left untouched.
pub fn record_entry(
    entries: &[HistoryEntry],
    entry: HistoryEntry,
    capacity: usize,
) -> Vec<HistoryEntry> {
    let mut next = Vec::with_capacity(entries.len() + 1);
    let query = entry.query.clone();
    next.push(entry);
    next.extend(entries.iter().filter(|e| e.query != query).cloned());
    next.truncate(capacity);
    next
}

/// Drop later duplicates of a query and truncate to `capacity`
pub fn enforce_invariants(entries: Vec<HistoryEntry>, capacity: usize) -> Vec<HistoryEntry> {
    let mut seen = HashSet::new();
    let mut kept: Vec<HistoryEntry> = entries
        .into_iter()
        .filter(|entry| seen.insert(entry.query.clone()))
        .collect();
    kept.truncate(capacity);
    kept
}

#[derive(Serialize)]
struct PersistedHistoryRef<'a> {
    version: u32,
    entries: &'a [HistoryEntry],
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PersistedHistory {
    Versioned { version: u32, entries: Vec<Value> },
    Bare(Vec<Value>),
}

/// Serialize entries into the persisted record
pub fn encode(entries: &[HistoryEntry]) -> Result<String, serde_json::Error> {
    serde_json::to_string(&PersistedHistoryRef {
        version: HISTORY_FORMAT_VERSION,
        entries,
    })
}

/// Parse a persisted record. Unreadable entries are skipped; an unreadable
/// record or an unknown version is an error for the caller to swallow.
pub fn decode(raw: &str) -> Result<Vec<HistoryEntry>, StorageError> {
    let persisted: PersistedHistory =
        serde_json::from_str(raw).map_err(|e| StorageError::Corrupt(e.to_string()))?;

    let values = match persisted {
        PersistedHistory::Versioned { version, entries } if version == HISTORY_FORMAT_VERSION => {
            entries
        }
        PersistedHistory::Versioned { version, .. } => {
            return Err(StorageError::Corrupt(format!(
                "unsupported history version {version}"
            )));
        }
        PersistedHistory::Bare(entries) => entries,
    };

    let total = values.len();
    let entries: Vec<HistoryEntry> = values
        .into_iter()
        .filter_map(|value| serde_json::from_value(value).ok())
        .collect();
    if entries.len() < total {
        tracing::warn!(
            "Skipped {} unreadable history entries",
            total - entries.len()
        );
    }

    Ok(entries)
}

mod timestamp {
    use chrono::{DateTime, Utc};
    use serde::de::{self, Deserializer};
    use serde::Deserialize;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Text(DateTime<Utc>),
        Millis(i64),
    }

    /// RFC 3339 text, or epoch milliseconds as the browser client stored them
    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Repr::deserialize(deserializer)? {
            Repr::Text(timestamp) => Ok(timestamp),
            Repr::Millis(ms) => DateTime::<Utc>::from_timestamp_millis(ms)
                .ok_or_else(|| de::Error::custom(format!("timestamp {ms} out of range"))),
        }
    }
}
