//! The principal-scoped search engine.

use std::collections::HashMap;

use futures_util::future::try_join_all;
use serde::Serialize;
use tracing::{debug, warn};

use davsearch_backend::{BoxFuture, CalendarObjectStore, ContainerLister};
use davsearch_core::{
    CalendarContainer, CalendarObject, ComponentTypes, ContainerRef, IcalComponent, Principal,
    SearchQuery,
};

use crate::config::EngineConfig;
use crate::error::SearchResult;
use crate::matcher::{MatchedProperty, Matcher, SubstringMatcher};

/// One matching calendar object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    /// The stored object.
    pub object: CalendarObject,
    /// The container holding it.
    pub container: CalendarContainer,
    /// Where the term was found.
    pub matched: MatchedProperty,
    /// The primary component that was searched.
    pub component: IcalComponent,
}

/// One page of results.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchPage {
    /// Hits in result order.
    pub hits: Vec<SearchHit>,
    /// Offset of the next page: the request offset plus the number of hits.
    pub next_offset: usize,
}

impl SearchPage {
    /// Returns an empty page that does not advance `offset`.
    pub fn empty(offset: usize) -> Self {
        Self {
            hits: Vec::new(),
            next_offset: offset,
        }
    }

    /// Returns the number of hits.
    pub fn len(&self) -> usize {
        self.hits.len()
    }

    /// Returns true if the page holds no hits.
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}

/// Searches the calendar objects of one principal.
///
/// Results are ordered by the display order of their container (calendars
/// before subscriptions on ties) and then by object URI, so pages taken at
/// increasing offsets never repeat or skip a hit as long as the data does
/// not change in between.
pub struct SearchEngine<L, S, M = SubstringMatcher> {
    lister: L,
    store: S,
    matcher: M,
    config: EngineConfig,
}

impl<L, S> SearchEngine<L, S>
where
    L: ContainerLister,
    S: CalendarObjectStore,
{
    /// Creates an engine using a [`SubstringMatcher`] with the configured
    /// collation.
    pub fn new(lister: L, store: S, config: EngineConfig) -> Self {
        Self {
            lister,
            store,
            matcher: SubstringMatcher::new(config.collation),
            config,
        }
    }
}

impl<L, S, M> SearchEngine<L, S, M>
where
    L: ContainerLister,
    S: CalendarObjectStore,
    M: Matcher,
{
    /// Replaces the matcher.
    pub fn with_matcher<N: Matcher>(self, matcher: N) -> SearchEngine<L, S, N> {
        SearchEngine {
            lister: self.lister,
            store: self.store,
            matcher,
            config: self.config,
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Returns the object store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Lists the containers of `principal` in display order.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::StoreUnavailable`](crate::SearchError) if the
    /// lister fails.
    pub async fn containers(&self, principal: &Principal) -> SearchResult<Vec<CalendarContainer>> {
        let mut containers = self.lister.list_containers(principal).await?;
        containers.sort_by(CalendarContainer::display_cmp);
        Ok(containers)
    }

    /// Runs `query` over the containers of `principal` and returns one page.
    ///
    /// # Errors
    ///
    /// - [`SearchError::InvalidQuery`](crate::SearchError) if the query is
    ///   rejected; no store is called in that case.
    /// - [`SearchError::StoreUnavailable`](crate::SearchError) if listing
    ///   containers or objects fails. No partial page is returned.
    #[tracing::instrument(
        skip_all,
        fields(principal = %principal, term = %query.term, limit = query.limit, offset = query.offset)
    )]
    pub async fn search(
        &self,
        principal: &Principal,
        query: &SearchQuery,
    ) -> SearchResult<SearchPage> {
        query.validate(self.config.max_limit)?;

        let containers = self.containers(principal).await?;
        if containers.is_empty() {
            debug!("Principal has no containers");
            return Ok(SearchPage::empty(query.offset));
        }
        let container_count = containers.len();

        let references: Vec<ContainerRef> =
            containers.iter().map(CalendarContainer::reference).collect();
        let ranks: HashMap<ContainerRef, (usize, CalendarContainer)> = containers
            .into_iter()
            .enumerate()
            .map(|(rank, container)| (container.reference(), (rank, container)))
            .collect();

        let objects = self.scan(&references, &query.component_types).await?;
        let candidates = objects.len();

        let term = query.term.as_str();
        let mut ranked: Vec<(usize, SearchHit)> = objects
            .into_iter()
            .filter_map(|object| {
                let Some((rank, container)) = ranks.get(&object.container) else {
                    warn!(
                        container = %object.container,
                        uri = %object.uri,
                        "Store returned an object outside the requested containers"
                    );
                    return None;
                };
                let component = match object.primary_component(&object.component_type) {
                    Ok(Some(component)) => component,
                    Ok(None) => {
                        debug!(uri = %object.uri, "Object has no primary component");
                        return None;
                    }
                    Err(e) => {
                        debug!(uri = %object.uri, error = %e, "Skipping unparseable object");
                        return None;
                    }
                };
                let matched = self.matcher.find_match(
                    &component,
                    term,
                    &query.search_properties,
                    &query.search_parameters,
                )?;
                Some((
                    *rank,
                    SearchHit {
                        object,
                        container: container.clone(),
                        matched,
                        component,
                    },
                ))
            })
            .collect();
        let matched = ranked.len();

        ranked.sort_by(|(a_rank, a), (b_rank, b)| {
            a_rank
                .cmp(b_rank)
                .then_with(|| a.object.uri.cmp(&b.object.uri))
        });

        let hits: Vec<SearchHit> = ranked
            .into_iter()
            .skip(query.offset)
            .take(query.limit)
            .map(|(_, hit)| hit)
            .collect();

        debug!(
            containers = container_count,
            candidates,
            matched,
            returned = hits.len(),
            "Search finished"
        );

        Ok(SearchPage {
            next_offset: query.offset + hits.len(),
            hits,
        })
    }

    async fn scan(
        &self,
        references: &[ContainerRef],
        component_types: &ComponentTypes,
    ) -> SearchResult<Vec<CalendarObject>> {
        if self.config.parallel_scan {
            let batches = try_join_all(references.iter().map(|reference| {
                self.store
                    .list_objects(std::slice::from_ref(reference), component_types)
            }))
            .await?;
            return Ok(batches.into_iter().flatten().collect());
        }

        let mut objects = Vec::new();
        for reference in references {
            objects.extend(
                self.store
                    .list_objects(std::slice::from_ref(reference), component_types)
                    .await?,
            );
        }
        Ok(objects)
    }
}

/// Object-safe view of a search engine.
///
/// Lets callers hold `Arc<dyn PrincipalSearch>` without naming the
/// lister, store and matcher types.
pub trait PrincipalSearch: Send + Sync {
    /// See [`SearchEngine::search`].
    fn search<'a>(
        &'a self,
        principal: &'a Principal,
        query: &'a SearchQuery,
    ) -> BoxFuture<'a, SearchResult<SearchPage>>;
}

impl<L, S, M> PrincipalSearch for SearchEngine<L, S, M>
where
    L: ContainerLister,
    S: CalendarObjectStore,
    M: Matcher,
{
    fn search<'a>(
        &'a self,
        principal: &'a Principal,
        query: &'a SearchQuery,
    ) -> BoxFuture<'a, SearchResult<SearchPage>> {
        Box::pin(SearchEngine::search(self, principal, query))
    }
}
