//! Core error types.

use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors raised while building or validating core values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Principal identifier does not have the documented shape.
    #[error("invalid principal: {0}")]
    InvalidPrincipal(String),

    /// Search query was rejected before reaching any store.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// Calendar data could not be parsed.
    #[error("failed to parse calendar data: {0}")]
    Parse(String),

    /// Collation name is not one of the supported RFC 4790 collations.
    #[error("unknown collation: {0}")]
    UnknownCollation(String),
}

impl CoreError {
    /// Creates an invalid query error.
    pub fn invalid_query(message: impl Into<String>) -> Self {
        Self::InvalidQuery(message.into())
    }

    /// Creates a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }
}
