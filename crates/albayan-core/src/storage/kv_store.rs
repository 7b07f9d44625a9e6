//! Key-value store trait.
//!
//! The persistence substrate: a flat string-keyed store of string values.
//! Implementations live in albayan-infra (SQLite) and in [`super::memory`].

use albayan_types::error::RepositoryError;

/// Trait for string-keyed persistent storage.
///
/// Uses RPITIT (native async fn in traits, Rust 2024 edition).
pub trait KvStore: Send + Sync {
    /// Get a value by key. Returns None if the key does not exist.
    fn get(
        &self,
        key: &str,
    ) -> impl std::future::Future<Output = Result<Option<String>, RepositoryError>> + Send;

    /// Set the value for a key, replacing any previous value.
    fn set(
        &self,
        key: &str,
        value: &str,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}
