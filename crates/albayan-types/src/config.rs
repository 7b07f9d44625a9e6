//! Global configuration types for Al-Bayan.
//!
//! `GlobalConfig` represents the optional `config.toml` in the data directory.

use serde::{Deserialize, Serialize};

/// Top-level configuration. Loaded from `~/.albayan/config.toml`; every field
/// has a default so a partial (or missing) file is fine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// Model identifier on the provider.
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f64,

    /// Maximum number of prior messages sent with each question.
    #[serde(default = "default_history_window")]
    pub history_window: usize,

    /// Let the provider ground answers in web search results.
    #[serde(default = "default_search_grounding")]
    pub search_grounding: bool,

    /// Provider API root.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// HTTP timeout for one remote call.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Key under which the session list is persisted.
    #[serde(default = "default_storage_key")]
    pub storage_key: String,
}

fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_temperature() -> f64 {
    0.3
}

fn default_history_window() -> usize {
    20
}

fn default_search_grounding() -> bool {
    true
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_request_timeout_secs() -> u64 {
    120
}

fn default_storage_key() -> String {
    "albayan_sessions".to_string()
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            temperature: default_temperature(),
            history_window: default_history_window(),
            search_grounding: default_search_grounding(),
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            storage_key: default_storage_key(),
        }
    }
}
