//! In-memory session store.
//!
//! Holds the authoritative list of chat sessions (newest first) and the
//! nullable current-session reference. Every public operation leaves the
//! state fully updated before returning; persisting it is the caller's job.

use albayan_types::chat::{ChatSession, Message};
use albayan_types::error::StoreError;
use tracing::debug;

/// The session list plus which session is currently selected.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    sessions: Vec<ChatSession>,
    current: Option<String>,
}

impl SessionStore {
    /// An empty store with nothing selected.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a previously persisted list. Nothing is selected: a restored
    /// store starts on a fresh conversation.
    pub fn from_sessions(sessions: Vec<ChatSession>) -> Self {
        Self {
            sessions,
            current: None,
        }
    }

    /// Create a session seeded with `first_message`, put it at the front, and
    /// make it current. Returns the new session's id.
    pub fn create_session(&mut self, first_message: Message) -> String {
        let session = ChatSession::from_first_message(first_message);
        let id = session.id.clone();
        debug!(session_id = %id, title = %session.title, "Session created");
        self.sessions.insert(0, session);
        self.current = Some(id.clone());
        id
    }

    /// Append `message` to the end of a session's log.
    pub fn append_message(&mut self, session_id: &str, message: Message) -> Result<(), StoreError> {
        let session = self
            .sessions
            .iter_mut()
            .find(|s| s.id == session_id)
            .ok_or_else(|| StoreError::NotFound(session_id.to_string()))?;
        session.messages.push(message);
        Ok(())
    }

    /// Make an existing session current.
    pub fn select_session(&mut self, session_id: &str) -> Result<(), StoreError> {
        if !self.contains(session_id) {
            return Err(StoreError::NotFound(session_id.to_string()));
        }
        self.current = Some(session_id.to_string());
        Ok(())
    }

    /// Deselect; the next submission starts a new session.
    pub fn clear_selection(&mut self) {
        self.current = None;
    }

    /// Remove a session with all its messages. Clears the selection if it
    /// was the current one.
    pub fn delete_session(&mut self, session_id: &str) -> Result<ChatSession, StoreError> {
        let index = self
            .sessions
            .iter()
            .position(|s| s.id == session_id)
            .ok_or_else(|| StoreError::NotFound(session_id.to_string()))?;
        let removed = self.sessions.remove(index);
        if self.current.as_deref() == Some(session_id) {
            self.current = None;
        }
        debug!(session_id = %session_id, "Session deleted");
        Ok(removed)
    }

    /// Messages of `session_id`, or an empty slice when nothing (or an
    /// unknown id) is given.
    pub fn get_messages(&self, session_id: Option<&str>) -> &[Message] {
        session_id
            .and_then(|id| self.session(id))
            .map(|s| s.messages.as_slice())
            .unwrap_or_default()
    }

    /// All sessions, newest first.
    pub fn sessions(&self) -> &[ChatSession] {
        &self.sessions
    }

    pub fn session(&self, session_id: &str) -> Option<&ChatSession> {
        self.sessions.iter().find(|s| s.id == session_id)
    }

    pub fn contains(&self, session_id: &str) -> bool {
        self.session(session_id).is_some()
    }

    pub fn current_session_id(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn current_session(&self) -> Option<&ChatSession> {
        self.current.as_deref().and_then(|id| self.session(id))
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use albayan_types::chat::MessageRole;

    #[test]
    fn test_create_session_prepends_and_selects() {
        let mut store = SessionStore::new();
        let first = store.create_session(Message::user("first"));
        let second = store.create_session(Message::user("second"));

        assert_eq!(store.len(), 2);
        assert_eq!(store.sessions()[0].id, second);
        assert_eq!(store.sessions()[1].id, first);
        assert_eq!(store.current_session_id(), Some(second.as_str()));
    }

    #[test]
    fn test_create_session_seeds_message_and_title() {
        let mut store = SessionStore::new();
        let msg = Message::user("ما حكم الصلاة؟");
        let id = store.create_session(msg.clone());

        let session = store.session(&id).unwrap();
        assert_eq!(session.title, "ما حكم الصلاة؟");
        assert_eq!(session.messages, vec![msg]);
    }

    #[test]
    fn test_create_session_truncates_long_title() {
        let mut store = SessionStore::new();
        let id = store.create_session(Message::user("x".repeat(45)));
        assert_eq!(store.session(&id).unwrap().title, format!("{}...", "x".repeat(30)));
    }

    #[test]
    fn test_append_preserves_order_without_dedup() {
        let mut store = SessionStore::new();
        let id = store.create_session(Message::user("q"));
        let appended = vec![
            Message::model("a", vec![]),
            Message::user("same"),
            Message::user("same"),
            Message::model_error("err"),
        ];
        for msg in &appended {
            store.append_message(&id, msg.clone()).unwrap();
        }

        let log = store.get_messages(Some(&id));
        assert_eq!(log.len(), 5);
        assert_eq!(&log[1..], appended.as_slice());
    }

    #[test]
    fn test_append_to_missing_session_is_not_found() {
        let mut store = SessionStore::new();
        let err = store.append_message("gone", Message::user("x")).unwrap_err();
        assert_eq!(err, StoreError::NotFound("gone".to_string()));
    }

    #[test]
    fn test_select_and_clear_do_not_touch_messages() {
        let mut store = SessionStore::new();
        let a = store.create_session(Message::user("a"));
        let b = store.create_session(Message::user("b"));
        let before = store.sessions().to_vec();

        store.select_session(&a).unwrap();
        assert_eq!(store.current_session_id(), Some(a.as_str()));
        store.clear_selection();
        assert_eq!(store.current_session_id(), None);
        store.select_session(&b).unwrap();

        assert_eq!(store.sessions(), before.as_slice());
    }

    #[test]
    fn test_select_unknown_keeps_selection() {
        let mut store = SessionStore::new();
        let a = store.create_session(Message::user("a"));
        assert!(store.select_session("missing").is_err());
        assert_eq!(store.current_session_id(), Some(a.as_str()));
    }

    #[test]
    fn test_delete_current_clears_selection() {
        let mut store = SessionStore::new();
        let a = store.create_session(Message::user("a"));
        let removed = store.delete_session(&a).unwrap();

        assert_eq!(removed.id, a);
        assert!(store.is_empty());
        assert_eq!(store.current_session_id(), None);
    }

    #[test]
    fn test_delete_other_keeps_selection() {
        let mut store = SessionStore::new();
        let a = store.create_session(Message::user("a"));
        let b = store.create_session(Message::user("b"));

        store.delete_session(&a).unwrap();
        assert_eq!(store.current_session_id(), Some(b.as_str()));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_delete_missing_is_not_found() {
        let mut store = SessionStore::new();
        assert!(matches!(store.delete_session("x"), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_get_messages_without_selection_is_empty() {
        let mut store = SessionStore::new();
        store.create_session(Message::user("a"));
        assert!(store.get_messages(None).is_empty());
        assert!(store.get_messages(Some("unknown")).is_empty());
    }

    #[test]
    fn test_from_sessions_starts_unselected() {
        let mut original = SessionStore::new();
        original.create_session(Message::user("a"));
        let restored = SessionStore::from_sessions(original.sessions().to_vec());

        assert_eq!(restored.len(), 1);
        assert!(restored.current_session().is_none());
        assert_eq!(restored.sessions()[0].messages[0].role, MessageRole::User);
    }

    #[test]
    fn test_mutations_survive_serialization_roundtrip() {
        let mut store = SessionStore::new();
        let a = store.create_session(Message::user("a"));
        store.append_message(&a, Message::model("answer", vec![])).unwrap();
        let b = store.create_session(Message::user("b"));
        store.append_message(&b, Message::model_error("err")).unwrap();
        store.delete_session(&a).unwrap();

        let json = serde_json::to_string(store.sessions()).unwrap();
        let restored: Vec<ChatSession> = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, store.sessions());
    }
}
