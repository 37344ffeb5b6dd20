//! SearchProvider trait definition.
//!
//! A provider answers unified-search requests for one kind of content.
//! Each request is independent: the cursor returned in a
//! [`SearchResult`] is all the state a client needs to fetch the next page.

use davsearch_backend::BoxFuture;

use crate::error::ProviderResult;
use crate::types::{ProviderQuery, SearchResult, User};

/// A source of unified-search results.
///
/// # Implementation Notes
///
/// - Implementations must be `Send + Sync`; one instance serves concurrent
///   requests.
/// - A disabled feature yields an empty complete result, not an error.
/// - Failures are reported as errors, never as a partial result.
pub trait SearchProvider: Send + Sync {
    /// Stable identifier, e.g. "dav-calendar".
    fn id(&self) -> &str;

    /// Display name, e.g. "Events".
    fn name(&self) -> &str;

    /// Position among providers; lower comes first.
    fn order(&self) -> i32 {
        10
    }

    /// Runs `query` for `user`.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`](crate::ProviderError) if the user id is
    /// unusable or the search engine fails.
    fn search<'a>(
        &'a self,
        user: &'a User,
        query: &'a ProviderQuery,
    ) -> BoxFuture<'a, ProviderResult<SearchResult>>;
}
