//! CLI error types.

use std::io;

use davsearch_backend::StoreError;
use davsearch_engine::SearchError;
use davsearch_providers::ProviderError;
use thiserror::Error;

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

/// Errors that can occur in the CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The calendar tree could not be opened.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// A search failed.
    #[error("search error: {0}")]
    Search(#[from] ProviderError),

    /// Output could not be serialized.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl CliError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

impl From<SearchError> for CliError {
    fn from(err: SearchError) -> Self {
        Self::Search(ProviderError::Search(err))
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
