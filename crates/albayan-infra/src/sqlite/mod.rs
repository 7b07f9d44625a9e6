//! SQLite storage layer.
//!
//! A key-value table backed by SQLite with WAL mode and split read/write
//! connection pools.

pub mod kv;
pub mod pool;
