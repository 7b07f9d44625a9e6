use thiserror::Error;

/// Errors from session store operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("session '{0}' not found")]
    NotFound(String),
}

/// Reasons a submission is rejected before any state changes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TurnError {
    #[error("a request is already in progress")]
    Busy,

    #[error("message is empty")]
    EmptyInput,
}

/// Errors from key-value storage backends (used by trait definitions in albayan-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_display() {
        let err = StoreError::NotFound("abc".to_string());
        assert_eq!(err.to_string(), "session 'abc' not found");
    }

    #[test]
    fn test_repository_error_display() {
        let err = RepositoryError::Query("disk full".to_string());
        assert_eq!(err.to_string(), "query error: disk full");
    }
}
