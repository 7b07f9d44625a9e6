//! Chat session, message, and source citation types for Al-Bayan.
//!
//! These types are also the on-disk format: the whole session list is
//! serialized as one JSON array with camelCase field names.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

/// Maximum number of characters kept from the first message when deriving a title.
pub const TITLE_MAX_CHARS: usize = 30;

/// Appended to a title that was cut at [`TITLE_MAX_CHARS`].
pub const TITLE_TRUNCATION_MARKER: &str = "...";

/// Author of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Model,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::User => write!(f, "user"),
            MessageRole::Model => write!(f, "model"),
        }
    }
}

impl FromStr for MessageRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(MessageRole::User),
            "model" => Ok(MessageRole::Model),
            other => Err(format!("invalid message role: '{other}'")),
        }
    }
}

/// A web citation returned alongside a model answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub title: String,
    pub uri: String,
}

/// A single message within a chat session.
///
/// Messages are immutable once appended to a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub role: MessageRole,
    pub text: String,
    /// Citations (model messages only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<Source>>,
    /// Set on the placeholder appended when the remote call failed.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
    /// Epoch milliseconds.
    pub timestamp: i64,
}

impl Message {
    /// A user message stamped with a fresh id and the current time.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            role: MessageRole::User,
            text: text.into(),
            sources: None,
            is_error: false,
            timestamp: now_millis(),
        }
    }

    /// A model answer carrying the citations returned by the provider.
    pub fn model(text: impl Into<String>, sources: Vec<Source>) -> Self {
        Self {
            id: new_id(),
            role: MessageRole::Model,
            text: text.into(),
            sources: Some(sources),
            is_error: false,
            timestamp: now_millis(),
        }
    }

    /// The in-band placeholder recorded when a remote call fails.
    pub fn model_error(text: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            role: MessageRole::Model,
            text: text.into(),
            sources: None,
            is_error: true,
            timestamp: now_millis(),
        }
    }

    /// Citations of this message, empty when none were attached.
    pub fn sources(&self) -> &[Source] {
        self.sources.as_deref().unwrap_or_default()
    }
}

/// A conversation. Sessions are created lazily from their first user message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSession {
    pub id: String,
    pub title: String,
    pub messages: Vec<Message>,
    /// Epoch milliseconds.
    pub created_at: i64,
}

impl ChatSession {
    /// Start a session seeded with its first message.
    pub fn from_first_message(first_message: Message) -> Self {
        Self {
            id: new_id(),
            title: derive_title(&first_message.text),
            messages: vec![first_message],
            created_at: now_millis(),
        }
    }
}

/// Title for a session whose first message is `text`.
///
/// Counts characters rather than bytes so Arabic text is never split inside
/// a code point.
pub fn derive_title(text: &str) -> String {
    if text.chars().count() > TITLE_MAX_CHARS {
        let mut title: String = text.chars().take(TITLE_MAX_CHARS).collect();
        title.push_str(TITLE_TRUNCATION_MARKER);
        title
    } else {
        text.to_string()
    }
}

/// A fresh opaque identifier (UUID v7, time-sortable).
pub fn new_id() -> String {
    Uuid::now_v7().to_string()
}

/// Current time in epoch milliseconds.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}
