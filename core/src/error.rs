use thiserror::Error;

/// Errors surfaced by the catalog, the paginator and the query log store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    /// The catalog or log store could not be reached, or the call timed out.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// The caller passed a filter or window that violates a precondition.
    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    /// A stored log record could not be decoded.
    #[error("corrupt log record: {0}")]
    Corrupt(String),
}

impl From<sqlx::Error> for SearchError {
    fn from(e: sqlx::Error) -> Self {
        SearchError::StoreUnavailable(e.to_string())
    }
}

impl From<sled::Error> for SearchError {
    fn from(e: sled::Error) -> Self {
        SearchError::StoreUnavailable(e.to_string())
    }
}

/// A failed append to the query log. Never fatal to the search that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("query log append failed: {reason}")]
pub struct LogFailure {
    pub reason: String,
}

impl From<SearchError> for LogFailure {
    fn from(e: SearchError) -> Self {
        LogFailure { reason: e.to_string() }
    }
}

pub type Result<T, E = SearchError> = std::result::Result<T, E>;
