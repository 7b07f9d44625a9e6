//! Infrastructure layer for Al-Bayan.
//!
//! Implements the ports defined in `albayan-core`: a SQLite-backed key-value
//! store for persisted history and the Gemini answer provider. Also loads
//! configuration, resolves the data directory, and reads the API key.

pub mod config;
pub mod filesystem;
pub mod llm;
pub mod secret;
pub mod sqlite;
