//! Whole-list persistence of chat sessions over a [`KvStore`].
//!
//! The entire session list lives under a single key as one JSON array and is
//! overwritten on every save (last writer wins). Reads fail soft: anything
//! unreadable is logged and treated as "no history".

use albayan_types::chat::ChatSession;
use tracing::{debug, warn};

use super::kv_store::KvStore;

/// Loads and saves the serialized session list.
pub struct SessionPersistence<K: KvStore> {
    store: K,
    key: String,
}

impl<K: KvStore> SessionPersistence<K> {
    pub fn new(store: K, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    /// The storage key the list is kept under.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Access the underlying store.
    pub fn store(&self) -> &K {
        &self.store
    }

    /// Read the stored session list.
    ///
    /// Never fails: a missing key, a backend error, or malformed JSON all
    /// yield an empty list.
    pub async fn load(&self) -> Vec<ChatSession> {
        let raw = match self.store.get(&self.key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!(key = %self.key, "No stored sessions");
                return Vec::new();
            }
            Err(e) => {
                warn!(key = %self.key, error = %e, "Failed to read stored sessions, starting empty");
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<ChatSession>>(&raw) {
            Ok(sessions) => {
                debug!(key = %self.key, count = sessions.len(), "Loaded sessions");
                sessions
            }
            Err(e) => {
                warn!(key = %self.key, error = %e, "Stored sessions are malformed, starting empty");
                Vec::new()
            }
        }
    }

    /// Overwrite the stored list with `sessions`. Best effort: failures are logged.
    pub async fn save(&self, sessions: &[ChatSession]) {
        let raw = match serde_json::to_string(sessions) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key = %self.key, error = %e, "Failed to serialize sessions");
                return;
            }
        };

        if let Err(e) = self.store.set(&self.key, &raw).await {
            warn!(key = %self.key, error = %e, "Failed to save sessions");
        }
    }
}
