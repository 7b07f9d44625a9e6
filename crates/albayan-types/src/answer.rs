//! Request/response types for the remote answer service.
//!
//! These shapes are provider-neutral; the infra crate maps them onto the
//! concrete wire format of a given provider.

use serde::{Deserialize, Serialize};

use crate::chat::{Message, MessageRole, Source};

/// Placeholder title for a citation the provider returned without one.
pub const SOURCE_TITLE_PLACEHOLDER: &str = "مصدر ويب";

/// Placeholder link for a citation the provider returned without a URI.
pub const SOURCE_URI_PLACEHOLDER: &str = "#";

/// One prior turn of the conversation as sent to the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryTurn {
    pub role: MessageRole,
    pub text: String,
}

impl From<&Message> for HistoryTurn {
    fn from(message: &Message) -> Self {
        Self {
            role: message.role,
            text: message.text.clone(),
        }
    }
}

/// A question plus the conversation context it is asked in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerRequest {
    pub prompt: String,
    pub history: Vec<HistoryTurn>,
}

/// A normalized answer: text plus zero or more citations, in provider order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub text: String,
    pub sources: Vec<Source>,
}

/// Errors from the remote answer service.
#[derive(Debug, thiserror::Error)]
pub enum AnswerError {
    /// Required credentials or settings are missing. Raised before any I/O.
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("provider error: {message}")]
    Provider { message: String },

    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("rate limited")]
    RateLimited,

    #[error("deserialization error: {0}")]
    Deserialization(String),
}

impl AnswerError {
    /// Whether this is a local configuration problem rather than a remote failure.
    pub fn is_configuration(&self) -> bool {
        matches!(self, AnswerError::Configuration(_))
    }
}
