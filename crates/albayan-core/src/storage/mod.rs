//! Persistence abstractions.
//!
//! - [`kv_store::KvStore`]: the string-keyed substrate (SQLite in albayan-infra)
//! - [`memory::MemoryKvStore`]: in-process substrate
//! - [`persistence::SessionPersistence`]: whole-list load/save of chat sessions

pub mod kv_store;
pub mod memory;
pub mod persistence;
