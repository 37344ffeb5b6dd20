//! Provider error types.

use davsearch_engine::SearchError;
use thiserror::Error;

/// Result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Errors returned by a [`SearchProvider`](crate::SearchProvider).
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The user id does not map to a principal.
    #[error("invalid user id: {0}")]
    InvalidUser(String),

    /// The search engine failed; no partial result is produced.
    #[error("search failed: {0}")]
    Search(#[from] SearchError),

    /// A provider collaborator was configured with unusable values.
    #[error("configuration error: {message}")]
    Config { message: String },
}

impl ProviderError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Returns true if repeating the call later may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Search(e) if e.is_retryable())
    }
}
