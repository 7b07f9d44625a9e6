//! The chat turn state machine.
//!
//! A turn runs `Idle -> Submitting -> AwaitingRemote -> Settled -> Idle` and is
//! committed against the session store in two phases:
//!
//! 1. the user message is appended synchronously (creating the session on the
//!    first message of a fresh conversation) and persisted;
//! 2. the answer, or an error placeholder, is appended once the remote call
//!    resolves -- to the session captured in phase 1, whatever is current by
//!    then. If that session was deleted meanwhile, the reply is dropped.
//!
//! One turn is in flight at a time; the loading flag rejects overlapping
//! submissions instead of queueing them.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use albayan_types::answer::{AnswerRequest, HistoryTurn};
use albayan_types::chat::{ChatSession, Message};
use albayan_types::error::{StoreError, TurnError};
use tracing::{debug, info};

use crate::llm::box_provider::BoxAnswerProvider;
use crate::llm::history::{DEFAULT_HISTORY_WINDOW, history_window};
use crate::session::store::SessionStore;
use crate::storage::kv_store::KvStore;
use crate::storage::persistence::SessionPersistence;

/// Text of the placeholder appended when the remote call fails.
pub const ERROR_REPLY_TEXT: &str =
    "عذراً، حدث خطأ أثناء الاتصال بالخدمة. يرجى المحاولة مرة أخرى لاحقاً.";

/// Tunables for each turn.
#[derive(Debug, Clone)]
pub struct TurnSettings {
    /// Maximum number of prior messages sent with a question.
    pub history_window: usize,
}

impl Default for TurnSettings {
    fn default() -> Self {
        Self {
            history_window: DEFAULT_HISTORY_WINDOW,
        }
    }
}

/// How a turn settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The model answered; the message was appended.
    Answered(Message),
    /// The remote call failed; an error placeholder was appended.
    Failed(Message),
    /// The originating session was deleted before the reply arrived.
    Discarded,
}

/// Result of one submitted turn.
#[derive(Debug, Clone)]
pub struct TurnReport {
    /// Session the turn was committed to.
    pub session_id: String,
    pub user_message: Message,
    pub outcome: TurnOutcome,
}

/// Holds the loading flag for the lifetime of one turn.
struct LoadingGuard<'a>(&'a AtomicBool);

impl<'a> LoadingGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Orchestrates user turns against the session store, the answer provider,
/// and persistence.
///
/// All methods take `&self` so the controller can be shared (`Arc`) between
/// the input loop and an in-flight turn. The store lock is never held across
/// an `.await`.
pub struct ChatController<K: KvStore> {
    state: Mutex<SessionStore>,
    persistence: SessionPersistence<K>,
    provider: BoxAnswerProvider,
    settings: TurnSettings,
    loading: AtomicBool,
    /// Serializes persistence writes; each write snapshots under this lock.
    write_lock: tokio::sync::Mutex<()>,
}

impl<K: KvStore> ChatController<K> {
    /// Load persisted history once and build a controller over it.
    pub async fn open(
        persistence: SessionPersistence<K>,
        provider: BoxAnswerProvider,
        settings: TurnSettings,
    ) -> Self {
        let sessions = persistence.load().await;
        info!(
            sessions = sessions.len(),
            provider = provider.name(),
            "Chat history loaded"
        );

        Self {
            state: Mutex::new(SessionStore::from_sessions(sessions)),
            persistence,
            provider,
            settings,
            loading: AtomicBool::new(false),
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    fn state(&self) -> MutexGuard<'_, SessionStore> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Write the current session list. Snapshot is taken under the write
    /// lock so the last write always reflects the latest state.
    async fn flush(&self) {
        let _write = self.write_lock.lock().await;
        let snapshot = self.state().sessions().to_vec();
        self.persistence.save(&snapshot).await;
    }

    // --- Turn ---

    /// Run one full turn for `text`.
    ///
    /// Rejected with [`TurnError::EmptyInput`] for blank text and
    /// [`TurnError::Busy`] while another turn is in flight; neither touches
    /// state. Remote failures never surface as errors: they settle as
    /// [`TurnOutcome::Failed`].
    #[tracing::instrument(name = "chat_turn", skip(self, text), fields(provider = self.provider.name()))]
    pub async fn submit(&self, text: &str) -> Result<TurnReport, TurnError> {
        if text.trim().is_empty() {
            return Err(TurnError::EmptyInput);
        }
        let _loading = LoadingGuard::acquire(&self.loading).ok_or(TurnError::Busy)?;

        // Phase 1: the user's message is committed before the remote call.
        let user_message = Message::user(text);
        let (session_id, history) = {
            let mut state = self.state();
            let session_id = match state.current_session_id().map(str::to_owned) {
                Some(id) => match state.append_message(&id, user_message.clone()) {
                    Ok(()) => id,
                    Err(_) => state.create_session(user_message.clone()),
                },
                None => state.create_session(user_message.clone()),
            };

            let mut history = history_window(
                state.get_messages(Some(&session_id)),
                self.settings.history_window,
            );
            if history.is_empty() {
                history.push(HistoryTurn::from(&user_message));
            }
            (session_id, history)
        };
        self.flush().await;
        debug!(session_id = %session_id, history = history.len(), "User message committed");

        let request = AnswerRequest {
            prompt: text.to_string(),
            history,
        };
        let reply = match self.provider.ask(&request).await {
            Ok(answer) => {
                info!(
                    session_id = %session_id,
                    sources = answer.sources.len(),
                    "Answer received"
                );
                Message::model(answer.text, answer.sources)
            }
            // Failures are already shown to the user as the placeholder.
            Err(e) if e.is_configuration() => {
                info!(session_id = %session_id, error = %e, "Answer provider is not configured");
                Message::model_error(ERROR_REPLY_TEXT)
            }
            Err(e) => {
                info!(session_id = %session_id, error = %e, "Remote answer call failed");
                Message::model_error(ERROR_REPLY_TEXT)
            }
        };

        // Phase 2: settle against the captured session.
        let appended = self.state().append_message(&session_id, reply.clone());
        let outcome = match appended {
            Ok(()) => {
                self.flush().await;
                if reply.is_error {
                    TurnOutcome::Failed(reply)
                } else {
                    TurnOutcome::Answered(reply)
                }
            }
            Err(_) => {
                debug!(session_id = %session_id, "Session deleted while awaiting answer, reply dropped");
                TurnOutcome::Discarded
            }
        };

        Ok(TurnReport {
            session_id,
            user_message,
            outcome,
        })
    }

    // --- Navigation intents ---

    /// Start a fresh conversation; the next submission creates a session.
    pub fn new_chat(&self) {
        self.state().clear_selection();
    }

    /// Make an existing session current.
    pub fn select_session(&self, session_id: &str) -> Result<(), StoreError> {
        self.state().select_session(session_id)
    }

    /// Delete a session and persist the change. Callers confirm with the
    /// user first.
    pub async fn delete_session(&self, session_id: &str) -> Result<ChatSession, StoreError> {
        let removed = self.state().delete_session(session_id)?;
        self.flush().await;
        info!(session_id = %session_id, "Session deleted");
        Ok(removed)
    }

    // --- Reads ---

    /// Whether a turn is in flight.
    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Acquire)
    }

    /// Snapshot of all sessions, newest first.
    pub fn sessions(&self) -> Vec<ChatSession> {
        self.state().sessions().to_vec()
    }

    pub fn session(&self, session_id: &str) -> Option<ChatSession> {
        self.state().session(session_id).cloned()
    }

    pub fn current_session_id(&self) -> Option<String> {
        self.state().current_session_id().map(str::to_owned)
    }

    /// Messages of the current session, empty when none is selected.
    pub fn current_messages(&self) -> Vec<Message> {
        let state = self.state();
        state.get_messages(state.current_session_id()).to_vec()
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn persistence(&self) -> &SessionPersistence<K> {
        &self.persistence
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use albayan_types::answer::{Answer, AnswerError};
    use albayan_types::chat::{MessageRole, Source};
    use tokio::sync::Notify;

    use crate::llm::provider::AnswerProvider;
    use crate::storage::memory::MemoryKvStore;

    const KEY: &str = "albayan_sessions";

    // --- Mock providers ---

    #[derive(Clone)]
    enum MockResult {
        Success(Answer),
        Config,
        Remote,
    }

    struct MockProvider {
        result: MockResult,
        requests: Arc<Mutex<Vec<AnswerRequest>>>,
    }

    impl MockProvider {
        fn ok(text: &str, sources: Vec<Source>) -> Self {
            Self {
                result: MockResult::Success(Answer {
                    text: text.to_string(),
                    sources,
                }),
                requests: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn failing(result: MockResult) -> Self {
            Self {
                result,
                requests: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    impl AnswerProvider for MockProvider {
        fn name(&self) -> &str {
            "mock"
        }

        async fn ask(&self, request: &AnswerRequest) -> Result<Answer, AnswerError> {
            self.requests.lock().unwrap().push(request.clone());
            match self.result.clone() {
                MockResult::Success(answer) => Ok(answer),
                MockResult::Config => Err(AnswerError::Configuration("no key".to_string())),
                MockResult::Remote => Err(AnswerError::Provider {
                    message: "HTTP 500".to_string(),
                }),
            }
        }
    }

    /// Blocks inside `ask` until released, to hold a turn in flight.
    struct GatedProvider {
        started: Arc<Notify>,
        release: Arc<Notify>,
    }

    impl AnswerProvider for GatedProvider {
        fn name(&self) -> &str {
            "gated"
        }

        async fn ask(&self, _request: &AnswerRequest) -> Result<Answer, AnswerError> {
            self.started.notify_one();
            self.release.notified().await;
            Ok(Answer {
                text: "late answer".to_string(),
                sources: Vec::new(),
            })
        }
    }

    async fn controller_with<P: AnswerProvider + 'static>(
        provider: P,
        kv: MemoryKvStore,
    ) -> ChatController<MemoryKvStore> {
        ChatController::open(
            SessionPersistence::new(kv, KEY),
            BoxAnswerProvider::new(provider),
            TurnSettings::default(),
        )
        .await
    }

    fn gated() -> (GatedProvider, Arc<Notify>, Arc<Notify>) {
        let started = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        (
            GatedProvider {
                started: started.clone(),
                release: release.clone(),
            },
            started,
            release,
        )
    }

    fn seeded_store(titles: &[&str]) -> (MemoryKvStore, Vec<String>) {
        let mut store = SessionStore::new();
        let ids: Vec<String> = titles
            .iter()
            .map(|t| store.create_session(Message::user(*t)))
            .collect();
        let raw = serde_json::to_string(store.sessions()).unwrap();
        (MemoryKvStore::with_entry(KEY, &raw), ids)
    }

    // --- Tests ---

    #[tokio::test]
    async fn test_first_message_creates_session_and_answers() {
        let controller = controller_with(MockProvider::ok("جواب", vec![]), MemoryKvStore::new()).await;

        let report = controller.submit("ما حكم الصلاة؟").await.unwrap();

        let session = controller.session(&report.session_id).unwrap();
        assert_eq!(session.title, "ما حكم الصلاة؟");
        assert_eq!(session.messages.len(), 2);
        assert_eq!(session.messages[0].role, MessageRole::User);
        assert_eq!(session.messages[1].role, MessageRole::Model);
        assert!(!session.messages[1].is_error);
        assert_eq!(controller.current_session_id(), Some(report.session_id.clone()));
        assert!(matches!(report.outcome, TurnOutcome::Answered(_)));
        assert!(!controller.is_loading());
    }

    #[tokio::test]
    async fn test_answer_carries_sources_in_order() {
        let sources = vec![
            Source {
                title: "إسلام ويب".into(),
                uri: "https://islamweb.net/a".into(),
            },
            Source {
                title: "الدرر السنية".into(),
                uri: "https://dorar.net/b".into(),
            },
        ];
        let controller = controller_with(MockProvider::ok("x", sources.clone()), MemoryKvStore::new()).await;

        let report = controller.submit("سؤال").await.unwrap();
        match report.outcome {
            TurnOutcome::Answered(msg) => assert_eq!(msg.sources(), sources.as_slice()),
            other => panic!("expected answer, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_follow_up_appends_to_current_session() {
        let controller = controller_with(MockProvider::ok("a", vec![]), MemoryKvStore::new()).await;

        let first = controller.submit("one").await.unwrap();
        let second = controller.submit("two").await.unwrap();

        assert_eq!(first.session_id, second.session_id);
        assert_eq!(controller.sessions().len(), 1);
        assert_eq!(controller.current_messages().len(), 4);
    }

    #[tokio::test]
    async fn test_remote_failure_appends_error_placeholder() {
        let controller = controller_with(MockProvider::failing(MockResult::Remote), MemoryKvStore::new()).await;

        let report = controller.submit("سؤال").await.unwrap();

        let messages = controller.current_messages();
        assert_eq!(messages.len(), 2);
        assert!(messages[1].is_error);
        assert_eq!(messages[1].role, MessageRole::Model);
        assert_eq!(messages[1].text, ERROR_REPLY_TEXT);
        assert!(matches!(report.outcome, TurnOutcome::Failed(_)));
        assert!(!controller.is_loading());
    }

    #[tokio::test]
    async fn test_configuration_failure_appends_error_placeholder() {
        let controller = controller_with(MockProvider::failing(MockResult::Config), MemoryKvStore::new()).await;

        let report = controller.submit("سؤال").await.unwrap();
        match report.outcome {
            TurnOutcome::Failed(msg) => {
                assert!(msg.is_error);
                assert_eq!(msg.text, ERROR_REPLY_TEXT);
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_input_rejected_without_mutation() {
        let controller = controller_with(MockProvider::ok("a", vec![]), MemoryKvStore::new()).await;

        assert_eq!(controller.submit("   ").await.unwrap_err(), TurnError::EmptyInput);
        assert!(controller.sessions().is_empty());
    }

    #[tokio::test]
    async fn test_history_excludes_errors_and_is_bounded() {
        let provider = MockProvider::failing(MockResult::Remote);
        let requests = provider.requests.clone();
        let controller = controller_with(provider, MemoryKvStore::new()).await;

        for i in 0..15 {
            controller.submit(&format!("q{i}")).await.unwrap();
        }

        let requests = requests.lock().unwrap();
        assert_eq!(requests.len(), 15);
        for request in requests.iter() {
            assert!(request.history.len() <= DEFAULT_HISTORY_WINDOW);
            assert!(request.history.iter().all(|t| t.text != ERROR_REPLY_TEXT));
            let last = request.history.last().unwrap();
            assert_eq!(last.text, request.prompt);
        }
        // 15 user messages, errors filtered: the window is full on the last turn.
        assert_eq!(requests.last().unwrap().history.len(), 15);
    }

    #[tokio::test]
    async fn test_history_window_caps_long_sessions() {
        let provider = MockProvider::ok("a", vec![]);
        let requests = provider.requests.clone();
        let controller = controller_with(provider, MemoryKvStore::new()).await;

        for i in 0..12 {
            controller.submit(&format!("q{i}")).await.unwrap();
        }

        let requests = requests.lock().unwrap();
        let last = requests.last().unwrap();
        assert_eq!(last.history.len(), DEFAULT_HISTORY_WINDOW);
        assert_eq!(last.history.last().unwrap().text, "q11");
    }

    #[tokio::test]
    async fn test_overlapping_submission_rejected() {
        let (provider, started, release) = gated();
        let controller = Arc::new(controller_with(provider, MemoryKvStore::new()).await);

        let in_flight = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.submit("first").await })
        };
        started.notified().await;
        assert!(controller.is_loading());

        assert_eq!(controller.submit("second").await.unwrap_err(), TurnError::Busy);
        assert_eq!(controller.current_messages().len(), 1);

        release.notify_one();
        in_flight.await.unwrap().unwrap();

        let messages = controller.current_messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].text, "first");
        assert!(!controller.is_loading());
    }

    #[tokio::test]
    async fn test_reply_lands_in_originating_session_after_switch() {
        let (kv, ids) = seeded_store(&["a", "b"]);
        let (provider, started, release) = gated();
        let controller = Arc::new(controller_with(provider, kv).await);
        let (a, b) = (ids[0].clone(), ids[1].clone());

        controller.select_session(&a).unwrap();
        let in_flight = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.submit("follow-up").await })
        };
        started.notified().await;

        controller.select_session(&b).unwrap();
        release.notify_one();
        let report = in_flight.await.unwrap().unwrap();

        assert_eq!(report.session_id, a);
        let session_a = controller.session(&a).unwrap();
        assert_eq!(session_a.messages.len(), 3);
        assert_eq!(session_a.messages[2].role, MessageRole::Model);
        assert_eq!(controller.session(&b).unwrap().messages.len(), 1);
        assert_eq!(controller.current_session_id(), Some(b));
    }

    #[tokio::test]
    async fn test_reply_after_new_chat_still_lands() {
        let (provider, started, release) = gated();
        let controller = Arc::new(controller_with(provider, MemoryKvStore::new()).await);

        let in_flight = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.submit("q").await })
        };
        started.notified().await;
        controller.new_chat();
        release.notify_one();
        let report = in_flight.await.unwrap().unwrap();

        assert_eq!(controller.session(&report.session_id).unwrap().messages.len(), 2);
        assert!(controller.current_messages().is_empty());
    }

    #[tokio::test]
    async fn test_reply_for_deleted_session_is_discarded() {
        let (provider, started, release) = gated();
        let controller = Arc::new(controller_with(provider, MemoryKvStore::new()).await);

        let in_flight = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.submit("q").await })
        };
        started.notified().await;

        let session_id = controller.current_session_id().unwrap();
        controller.delete_session(&session_id).await.unwrap();
        release.notify_one();
        let report = in_flight.await.unwrap().unwrap();

        assert_eq!(report.outcome, TurnOutcome::Discarded);
        assert!(controller.sessions().is_empty());
        assert!(controller.persistence().load().await.is_empty());
        assert!(!controller.is_loading());
    }

    #[tokio::test]
    async fn test_delete_current_clears_reference() {
        let (kv, ids) = seeded_store(&["a", "b"]);
        let controller = controller_with(MockProvider::ok("x", vec![]), kv).await;

        controller.select_session(&ids[0]).unwrap();
        controller.delete_session(&ids[1]).await.unwrap();
        assert_eq!(controller.current_session_id(), Some(ids[0].clone()));

        controller.delete_session(&ids[0]).await.unwrap();
        assert_eq!(controller.current_session_id(), None);
    }

    #[tokio::test]
    async fn test_every_mutation_is_persisted() {
        let (kv, ids) = seeded_store(&["a"]);
        let controller = controller_with(MockProvider::ok("x", vec![]), kv).await;

        controller.submit("new").await.unwrap();
        assert_eq!(controller.persistence().load().await, controller.sessions());

        controller.select_session(&ids[0]).unwrap();
        controller.submit("more").await.unwrap();
        assert_eq!(controller.persistence().load().await, controller.sessions());

        controller.delete_session(&ids[0]).await.unwrap();
        assert_eq!(controller.persistence().load().await, controller.sessions());
    }

    #[tokio::test]
    async fn test_open_restores_without_selection() {
        let (kv, _) = seeded_store(&["a", "b", "c"]);
        let controller = controller_with(MockProvider::ok("x", vec![]), kv).await;

        assert_eq!(controller.sessions().len(), 3);
        assert_eq!(controller.current_session_id(), None);
        assert!(controller.current_messages().is_empty());
    }

    #[tokio::test]
    async fn test_open_with_malformed_history_starts_empty() {
        let kv = MemoryKvStore::with_entry(KEY, "[{\"broken\"");
        let controller = controller_with(MockProvider::ok("x", vec![]), kv).await;
        assert!(controller.sessions().is_empty());
    }

    #[tokio::test]
    async fn test_empty_history_window_sends_only_the_new_question() {
        let provider = MockProvider::ok("a", vec![]);
        let requests = provider.requests.clone();
        let controller = ChatController::open(
            SessionPersistence::new(MemoryKvStore::new(), KEY),
            BoxAnswerProvider::new(provider),
            TurnSettings { history_window: 0 },
        )
        .await;

        controller.submit("first").await.unwrap();
        controller.submit("second").await.unwrap();

        let requests = requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        for (request, text) in requests.iter().zip(["first", "second"]) {
            assert_eq!(request.history.len(), 1);
            assert_eq!(request.history[0].role, MessageRole::User);
            assert_eq!(request.history[0].text, text);
            assert_eq!(request.prompt, text);
        }
    }

    /// Collects formatted log output for assertions.
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_failed_turn_stays_below_default_log_level() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_writer(move || writer.clone())
            .finish();
        let _default = tracing::subscriber::set_default(subscriber);

        for result in [MockResult::Remote, MockResult::Config] {
            let controller = controller_with(MockProvider::failing(result), MemoryKvStore::new()).await;
            let report = controller.submit("سؤال").await.unwrap();
            assert!(matches!(report.outcome, TurnOutcome::Failed(_)));
        }

        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(output.is_empty(), "unexpected log output: {output}");
    }
}
