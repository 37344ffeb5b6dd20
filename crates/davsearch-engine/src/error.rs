//! Search error types.

use davsearch_backend::StoreError;
use davsearch_core::CoreError;
use thiserror::Error;

/// Result type for search operations.
pub type SearchResult<T> = Result<T, SearchError>;

/// Errors returned by [`SearchEngine::search`](crate::SearchEngine::search).
///
/// A principal without containers is not an error; it yields an empty page.
#[derive(Debug, Error)]
pub enum SearchError {
    /// The query was rejected before any store was called.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// The container lister or object store failed.
    #[error("store unavailable: {0}")]
    StoreUnavailable(#[source] StoreError),
}

impl SearchError {
    /// Creates an invalid query error.
    pub fn invalid_query(message: impl Into<String>) -> Self {
        Self::InvalidQuery(message.into())
    }

    /// Returns true if repeating the call later may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::InvalidQuery(_) => false,
            Self::StoreUnavailable(e) => e.is_retryable(),
        }
    }
}

impl From<StoreError> for SearchError {
    fn from(error: StoreError) -> Self {
        Self::StoreUnavailable(error)
    }
}

impl From<CoreError> for SearchError {
    fn from(error: CoreError) -> Self {
        match error {
            CoreError::InvalidQuery(message) => Self::InvalidQuery(message),
            other => Self::InvalidQuery(other.to_string()),
        }
    }
}
