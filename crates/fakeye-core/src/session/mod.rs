//! Checking session state machine
//!
//! `Idle -> Checking -> Settled | Failed`, with `Settled`/`Failed` returning to
//! `Checking` on the next submission. Each submission takes a new generation
//! number; a settlement is only applied when its ticket carries the current
//! generation, so the last submitted request wins regardless of which
//! response arrives last.
//!
//! History changes are made in memory and exposed as snapshots; writing them
//! out is left to the caller, outside any lock on the session.

pub mod handle;

pub use handle::SessionHandle;

use crate::backend::CheckError;
use crate::history::{record_entry, HistoryEntry, HistorySnapshot};
use crate::{CheckResult, Normalizer};
use serde_json::Value;

/// What the session is currently displaying
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Idle,
    Checking { query: String },
    Settled(CheckResult),
    Failed { query: String, message: String },
}

impl SessionState {
    pub fn is_checking(&self) -> bool {
        matches!(self, SessionState::Checking { .. })
    }

    pub fn result(&self) -> Option<&CheckResult> {
        match self {
            SessionState::Settled(result) => Some(result),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            SessionState::Failed { message, .. } => Some(message),
            _ => None,
        }
    }
}

/// Identity of one issued request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTicket {
    generation: u64,
    query: String,
}

impl RequestTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn query(&self) -> &str {
        &self.query
    }
}

/// Whether a settlement was applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    Current,
    Stale,
}

/// One user's checking session
#[derive(Debug)]
pub struct Session {
    normalizer: Normalizer,
    history: Vec<HistoryEntry>,
    capacity: usize,
    history_revision: u64,
    unsaved: bool,
    state: SessionState,
    generation: u64,
}

impl Session {
    /// Create a session over already loaded history
    pub fn new(normalizer: Normalizer, history: Vec<HistoryEntry>, capacity: usize) -> Self {
        Self {
            normalizer,
            history,
            capacity,
            history_revision: 0,
            unsaved: false,
            state: SessionState::Idle,
            generation: 0,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    /// Query of the most recent history entry
    pub fn latest_query(&self) -> Option<&str> {
        self.history.first().map(|entry| entry.query.as_str())
    }

    /// Start a check. Blank input is ignored and returns `None`; anything
    /// else is sent and recorded exactly as given.
    pub fn submit(&mut self, query: &str) -> Option<RequestTicket> {
        if query.trim().is_empty() {
            tracing::debug!("Ignoring blank submission");
            return None;
        }

        self.generation += 1;
        self.state = SessionState::Checking {
            query: query.to_string(),
        };

        Some(RequestTicket {
            generation: self.generation,
            query: query.to_string(),
        })
    }

    /// Apply the outcome of a request, unless a newer one has been issued
    pub fn settle(
        &mut self,
        ticket: &RequestTicket,
        outcome: Result<Value, CheckError>,
    ) -> Settlement {
        if ticket.generation != self.generation {
            tracing::debug!(
                "Discarding stale response for '{}' (generation {}, current {})",
                ticket.query,
                ticket.generation,
                self.generation
            );
            return Settlement::Stale;
        }

        let outcome = outcome.and_then(|raw| {
            if raw.is_object() {
                Ok(raw)
            } else {
                Err(CheckError::Malformed("expected a JSON object".to_string()))
            }
        });

        match outcome {
            Ok(raw) => {
                let result = self.normalizer.normalize(&ticket.query, &raw);
                tracing::info!(
                    "Check settled: {} ({}%) with {} evidence items",
                    result.verdict.label,
                    result.verdict.confidence,
                    result.evidence.len()
                );
                self.history = record_entry(
                    &self.history,
                    HistoryEntry::new(&ticket.query, raw),
                    self.capacity,
                );
                self.mark_unsaved();
                tracing::debug!(
                    "Recorded history entry for '{}' ({} total)",
                    ticket.query,
                    self.history.len()
                );
                self.state = SessionState::Settled(result);
            }
            Err(e) => {
                tracing::warn!("Check failed for '{}': {}", ticket.query, e);
                self.state = SessionState::Failed {
                    query: ticket.query.clone(),
                    message: e.user_message(),
                };
            }
        }

        Settlement::Current
    }

    /// Display a past entry without a network call, renormalizing its raw
    /// payload with the current rules. Any request still in flight becomes
    /// stale.
    pub fn replay(&mut self, index: usize) -> Option<&CheckResult> {
        let entry = self.history.get(index)?;
        let result = self.normalizer.normalize(&entry.query, &entry.raw_response);

        self.generation += 1;
        self.state = SessionState::Settled(result);
        self.state.result()
    }

    /// Empty the history; the displayed state is left alone
    pub fn clear_history(&mut self) {
        self.history.clear();
        self.mark_unsaved();
    }

    /// History changed since the last call, as a snapshot to persist
    pub fn take_unsaved(&mut self) -> Option<HistorySnapshot> {
        if !std::mem::take(&mut self.unsaved) {
            return None;
        }

        Some(HistorySnapshot {
            revision: self.history_revision,
            entries: self.history.clone(),
        })
    }

    fn mark_unsaved(&mut self) {
        self.history_revision += 1;
        self.unsaved = true;
    }
}
