//! AnswerProvider trait definition.
//!
//! The core abstraction every remote answer backend implements. Uses RPITIT
//! for `ask`; [`super::box_provider::BoxAnswerProvider`] adds dynamic dispatch.

use albayan_types::answer::{Answer, AnswerError, AnswerRequest};

/// Trait for remote answer backends (Gemini, test doubles, ...).
///
/// One call is one attempt: implementations must not retry internally.
/// Implementations live in albayan-infra (e.g., `GeminiProvider`).
pub trait AnswerProvider: Send + Sync {
    /// Human-readable provider name (e.g., "gemini").
    fn name(&self) -> &str;

    /// Ask a question in the context of `request.history`.
    fn ask(
        &self,
        request: &AnswerRequest,
    ) -> impl std::future::Future<Output = Result<Answer, AnswerError>> + Send;
}
