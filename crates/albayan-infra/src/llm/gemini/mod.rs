//! Google Gemini answer provider.
//!
//! Talks to the native `generateContent` REST endpoint so web search
//! grounding and its citation metadata are available.

pub mod client;
pub mod types;

pub use client::GeminiProvider;
