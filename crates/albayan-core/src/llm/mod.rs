//! Remote answer client abstractions.
//!
//! - `AnswerProvider`: RPITIT trait for concrete provider implementations
//! - `BoxAnswerProvider`: object-safe wrapper for dynamic dispatch
//! - `history_window`: bounded, error-free context for each question

pub mod box_provider;
pub mod history;
pub mod provider;
