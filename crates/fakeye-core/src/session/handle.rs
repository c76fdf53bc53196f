//! Shared, async-friendly access to a session

use super::{Session, SessionState, Settlement};
use crate::backend::VerificationBackend;
use crate::history::{HistoryEntry, HistoryStore};
use crate::{CheckResult, Normalizer};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Cloneable handle that runs checks against a backend.
///
/// The session lock is held only to issue a ticket and to settle it, never
/// across the backend call or a history write, so concurrent checks can
/// overlap and the generation rule decides which one is shown.
#[derive(Clone)]
pub struct SessionHandle {
    session: Arc<Mutex<Session>>,
    backend: Arc<dyn VerificationBackend>,
    store: Arc<HistoryStore>,
}

impl SessionHandle {
    pub fn new(
        session: Session,
        store: HistoryStore,
        backend: Arc<dyn VerificationBackend>,
    ) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
            backend,
            store: Arc::new(store),
        }
    }

    /// Create a session over the history persisted in `store`
    pub async fn open(
        normalizer: Normalizer,
        store: HistoryStore,
        backend: Arc<dyn VerificationBackend>,
    ) -> Self {
        let history = store.load().await;
        tracing::debug!("Loaded {} history entries", history.len());
        let session = Session::new(normalizer, history, store.capacity());
        Self::new(session, store, backend)
    }

    /// Check a claim. Returns `None` when the input was blank.
    pub async fn check(&self, query: &str) -> Option<Settlement> {
        let ticket = self.session.lock().await.submit(query)?;
        tracing::info!("Checking claim: {}", ticket.query());

        let outcome = self.backend.verify(ticket.query()).await;

        let (settlement, unsaved) = {
            let mut session = self.session.lock().await;
            let settlement = session.settle(&ticket, outcome);
            (settlement, session.take_unsaved())
        };

        if let Some(snapshot) = unsaved {
            self.store.persist(snapshot).await;
        }
        Some(settlement)
    }

    /// Re-check the most recent history entry, if any
    pub async fn check_latest(&self) -> Option<Settlement> {
        let query = self.session.lock().await.latest_query()?.to_string();
        self.check(&query).await
    }

    pub async fn replay(&self, index: usize) -> Option<CheckResult> {
        self.session.lock().await.replay(index).cloned()
    }

    pub async fn clear_history(&self) {
        let unsaved = {
            let mut session = self.session.lock().await;
            session.clear_history();
            session.take_unsaved()
        };

        if let Some(snapshot) = unsaved {
            self.store.persist(snapshot).await;
        }
    }

    /// Current display state
    pub async fn snapshot(&self) -> SessionState {
        self.session.lock().await.state().clone()
    }

    pub async fn history(&self) -> Vec<HistoryEntry> {
        self.session.lock().await.history().to_vec()
    }
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::CheckError;
    use crate::history::{HistoryConfig, HistoryStorage, StorageError};
    use crate::VerdictLabel;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::time::Duration;

    /// Backend that answers each claim after a fixed delay
    struct DelayedBackend {
        replies: HashMap<&'static str, (u64, Result<Value, CheckError>)>,
    }

    #[async_trait]
    impl VerificationBackend for DelayedBackend {
        async fn verify(&self, claim: &str) -> Result<Value, CheckError> {
            let (delay_ms, reply) = self
                .replies
                .get(claim)
                .cloned()
                .unwrap_or((0, Err(CheckError::Network(String::new()))));
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            reply
        }
    }

    /// Storage whose writes take a long time to land
    struct SlowStorage {
        delay: Duration,
        writes: Arc<std::sync::Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl HistoryStorage for SlowStorage {
        async fn read(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Ok(None)
        }

        async fn write(&self, _key: &str, contents: &str) -> Result<(), StorageError> {
            tokio::time::sleep(self.delay).await;
            self.writes.lock().unwrap().push(contents.to_string());
            Ok(())
        }

        async fn remove(&self, _key: &str) -> Result<(), StorageError> {
            tokio::time::sleep(self.delay).await;
            Ok(())
        }
    }

    type Replies = Vec<(&'static str, u64, Result<Value, CheckError>)>;

    fn backend(replies: Replies) -> Arc<DelayedBackend> {
        Arc::new(DelayedBackend {
            replies: replies
                .into_iter()
                .map(|(claim, delay, reply)| (claim, (delay, reply)))
                .collect(),
        })
    }

    fn handle(replies: Replies) -> SessionHandle {
        let capacity = HistoryConfig::default().capacity;
        let session = Session::new(Normalizer::new(), Vec::new(), capacity);
        SessionHandle::new(session, HistoryStore::in_memory(), backend(replies))
    }

    #[tokio::test(start_paused = true)]
    async fn slow_earlier_response_is_discarded() {
        let handle = handle(vec![
            ("claim A", 50, Ok(json!({"verdict": "likely_real"}))),
            ("claim B", 5, Ok(json!({"verdict": "suspicious"}))),
        ]);

        let (a, b) = tokio::join!(handle.check("claim A"), handle.check("claim B"));
        assert_eq!(a, Some(Settlement::Stale));
        assert_eq!(b, Some(Settlement::Current));

        let state = handle.snapshot().await;
        let result = state.result().unwrap();
        assert_eq!(result.query, "claim B");
        assert_eq!(result.verdict.label, VerdictLabel::False);

        let history = handle.history().await;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].query, "claim B");
    }

    #[tokio::test(start_paused = true)]
    async fn in_order_responses_show_the_later_claim() {
        let handle = handle(vec![
            ("claim A", 5, Ok(json!({"verdict": "likely_real"}))),
            ("claim B", 50, Ok(json!({"verdict": "suspicious"}))),
        ]);

        let (a, b) = tokio::join!(handle.check("claim A"), handle.check("claim B"));
        assert_eq!(a, Some(Settlement::Stale));
        assert_eq!(b, Some(Settlement::Current));
        assert_eq!(handle.snapshot().await.result().unwrap().query, "claim B");
    }

    #[tokio::test(start_paused = true)]
    async fn stale_failure_is_ignored() {
        let handle = handle(vec![
            ("claim A", 50, Err(CheckError::Network("connection reset".into()))),
            ("claim B", 5, Ok(json!({"verdict_raw_label": "True", "verdict_percent": 88}))),
        ]);

        tokio::join!(handle.check("claim A"), handle.check("claim B"));

        let state = handle.snapshot().await;
        assert!(state.error().is_none());
        assert_eq!(state.result().unwrap().verdict.confidence, 88);
    }

    #[tokio::test]
    async fn blank_check_never_reaches_backend() {
        let handle = handle(vec![]);
        assert_eq!(handle.check("  ").await, None);
        assert_eq!(handle.snapshot().await, SessionState::Idle);
    }

    #[tokio::test]
    async fn check_latest_reissues_newest_query() {
        let handle = handle(vec![
            ("older", 0, Ok(json!({"verdict": "suspicious"}))),
            ("newer", 0, Ok(json!({"verdict": "likely_real"}))),
        ]);
        assert_eq!(handle.check_latest().await, None);

        handle.check("older").await;
        handle.check("newer").await;
        assert_eq!(handle.check_latest().await, Some(Settlement::Current));

        assert_eq!(handle.snapshot().await.result().unwrap().query, "newer");
        assert_eq!(handle.history().await.len(), 2);
    }

    #[tokio::test]
    async fn replay_and_clear() {
        let handle = handle(vec![("claim", 0, Ok(json!({"verdict": "likely_real"})))]);
        handle.check("claim").await;

        let replayed = handle.replay(0).await.unwrap();
        assert_eq!(replayed.verdict.label, VerdictLabel::True);

        handle.clear_history().await;
        assert!(handle.history().await.is_empty());
        assert!(handle.snapshot().await.result().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_history_write_does_not_hold_the_session() {
        let writes = Arc::new(std::sync::Mutex::new(Vec::new()));
        let storage = SlowStorage {
            delay: Duration::from_millis(300),
            writes: writes.clone(),
        };
        let store = HistoryStore::new(Box::new(storage), HistoryConfig::default());
        let backend = backend(vec![("claim", 0, Ok(json!({"verdict": "likely_real"})))]);
        let handle = SessionHandle::open(Normalizer::new(), store, backend).await;

        let task = tokio::spawn({
            let handle = handle.clone();
            async move { handle.check("claim").await }
        });
        tokio::time::sleep(Duration::from_millis(10)).await;

        let started = tokio::time::Instant::now();
        let state = handle.snapshot().await;
        assert!(started.elapsed() < Duration::from_millis(100));
        assert_eq!(state.result().unwrap().query, "claim");
        assert!(writes.lock().unwrap().is_empty());

        assert_eq!(task.await.unwrap(), Some(Settlement::Current));
        let writes = writes.lock().unwrap();
        assert_eq!(writes.len(), 1);
        assert!(writes[0].contains("\"claim\""));
    }

    #[tokio::test]
    async fn history_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let replies = || vec![("persisted claim", 0, Ok(json!({"verdict": "suspicious"})))];
        {
            let store = HistoryStore::in_dir(dir.path());
            let handle = SessionHandle::open(Normalizer::new(), store, backend(replies())).await;
            handle.check("persisted claim").await;
        }

        let store = HistoryStore::in_dir(dir.path());
        let handle = SessionHandle::open(Normalizer::new(), store, backend(replies())).await;
        let history = handle.history().await;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].query, "persisted claim");
        assert_eq!(handle.snapshot().await, SessionState::Idle);

        handle.clear_history().await;
        let store = HistoryStore::in_dir(dir.path());
        assert!(store.load().await.is_empty());
    }
}
