//! Principal-scoped calendar object search
//!
//! [`SearchEngine`] resolves a principal's calendars and subscriptions,
//! loads the objects of the requested component types, keeps those whose
//! searchable properties or parameters contain the term and returns one
//! deterministic page of [`SearchHit`]s.
//!
//! ```no_run
//! # async fn run() -> Result<(), davsearch_engine::SearchError> {
//! use std::sync::Arc;
//! use davsearch_backend::MemoryStore;
//! use davsearch_core::{ComponentType, Principal, SearchQuery};
//! use davsearch_engine::{EngineConfig, SearchEngine};
//!
//! let store = Arc::new(MemoryStore::new());
//! let engine = SearchEngine::new(store.clone(), store, EngineConfig::default());
//! let query = SearchQuery::builder("team")
//!     .component_type(ComponentType::Event)
//!     .properties(["SUMMARY", "LOCATION"])
//!     .limit(10)
//!     .build();
//! let page = engine.search(&Principal::for_user("alice")?, &query).await?;
//! println!("{} hits, next offset {}", page.len(), page.next_offset);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod matcher;

pub use config::{DEFAULT_MAX_LIMIT, EngineConfig};
pub use engine::{PrincipalSearch, SearchEngine, SearchHit, SearchPage};
pub use error::{SearchError, SearchResult};
pub use matcher::{Collation, MatchedProperty, Matcher, SubstringMatcher};
