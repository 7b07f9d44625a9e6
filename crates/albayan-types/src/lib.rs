//! Shared domain types for Al-Bayan.
//!
//! Chat sessions and messages, the provider-neutral answer request/response,
//! configuration, and the error types shared across crates.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod answer;
pub mod chat;
pub mod config;
pub mod error;
