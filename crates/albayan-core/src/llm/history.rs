//! Conversation context sent with each question.
//!
//! Error placeholders never reach the provider, and the window is bounded to
//! keep token cost in check.

use albayan_types::answer::HistoryTurn;
use albayan_types::chat::Message;

/// Default number of prior messages sent with a question.
pub const DEFAULT_HISTORY_WINDOW: usize = 20;

/// The last `limit` non-error messages of `messages`, oldest first.
///
/// Filtering happens before the cut, so the result is the most recent
/// usable context and its final entry is the latest non-error message.
pub fn history_window(messages: &[Message], limit: usize) -> Vec<HistoryTurn> {
    let usable: Vec<&Message> = messages.iter().filter(|m| !m.is_error).collect();
    let skip = usable.len().saturating_sub(limit);
    usable.into_iter().skip(skip).map(HistoryTurn::from).collect()
}
