//! Events and tasks providers.
//!
//! Both providers run the same pipeline: check the feature gate, map the
//! user to a principal, search one component type and render each hit.
//! A [`ProviderProfile`] supplies what differs in data, a
//! [`SublineFormatter`] what differs in rendering.

use std::sync::Arc;

use tracing::debug;

use davsearch_backend::BoxFuture;
use davsearch_core::{ComponentType, Principal, SearchParameters, SearchQuery};
use davsearch_engine::{PrincipalSearch, SearchHit};

use crate::error::{ProviderError, ProviderResult};
use crate::features::FeatureGate;
use crate::format::{EventSubline, FormatOptions, SublineFormatter, TaskSubline};
use crate::links::UrlGenerator;
use crate::provider::SearchProvider;
use crate::types::{ProviderQuery, SearchResult, SearchResultEntry, User};

/// What a calendar provider searches and how it labels the results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderProfile {
    /// Provider id.
    pub id: String,
    /// Provider display name.
    pub name: String,
    /// Position among providers.
    pub order: i32,
    /// Feature that must be enabled for the user; also the app the links
    /// and thumbnail point into.
    pub app: String,
    /// Thumbnail image file inside the app.
    pub thumbnail: String,
    /// Component type to search.
    pub component_type: ComponentType,
    /// Properties whose values are searched.
    pub properties: Vec<String>,
    /// Parameters searched per property.
    pub parameters: SearchParameters,
}

impl ProviderProfile {
    /// Events: `VEVENT`s in the calendar app.
    pub fn events() -> Self {
        Self {
            id: "dav-calendar".to_string(),
            name: "Events".to_string(),
            order: 10,
            app: "calendar".to_string(),
            thumbnail: "calendar.svg".to_string(),
            component_type: ComponentType::Event,
            properties: ["SUMMARY", "LOCATION", "DESCRIPTION", "ATTENDEE", "ORGANIZER"]
                .map(String::from)
                .to_vec(),
            parameters: SearchParameters::new()
                .with("ATTENDEE", ["CN"])
                .with("ORGANIZER", ["CN"]),
        }
    }

    /// Tasks: `VTODO`s in the tasks app.
    pub fn tasks() -> Self {
        Self {
            id: "dav-tasks".to_string(),
            name: "Tasks".to_string(),
            order: 11,
            app: "tasks".to_string(),
            thumbnail: "tasks.svg".to_string(),
            component_type: ComponentType::Todo,
            properties: ["SUMMARY", "DESCRIPTION"].map(String::from).to_vec(),
            parameters: SearchParameters::new(),
        }
    }

    /// Builds the engine query for a provider request.
    pub fn query(&self, request: &ProviderQuery) -> SearchQuery {
        SearchQuery::builder(request.term.clone())
            .component_type(self.component_type.clone())
            .properties(&self.properties)
            .parameters(self.parameters.clone())
            .limit(request.limit)
            .offset(request.cursor)
            .build()
    }
}

/// A search provider over calendar objects of one component type.
pub struct CalendarSearchProvider<F> {
    profile: ProviderProfile,
    formatter: F,
    options: FormatOptions,
    engine: Arc<dyn PrincipalSearch>,
    features: Arc<dyn FeatureGate>,
    urls: Arc<dyn UrlGenerator>,
}

/// The events provider.
pub type EventsSearchProvider = CalendarSearchProvider<EventSubline>;

/// The tasks provider.
pub type TasksSearchProvider = CalendarSearchProvider<TaskSubline>;

impl CalendarSearchProvider<EventSubline> {
    /// Creates the events provider.
    pub fn events(
        engine: Arc<dyn PrincipalSearch>,
        features: Arc<dyn FeatureGate>,
        urls: Arc<dyn UrlGenerator>,
    ) -> Self {
        Self::new(ProviderProfile::events(), EventSubline, engine, features, urls)
    }
}

impl CalendarSearchProvider<TaskSubline> {
    /// Creates the tasks provider.
    pub fn tasks(
        engine: Arc<dyn PrincipalSearch>,
        features: Arc<dyn FeatureGate>,
        urls: Arc<dyn UrlGenerator>,
    ) -> Self {
        Self::new(ProviderProfile::tasks(), TaskSubline, engine, features, urls)
    }
}

impl<F: SublineFormatter> CalendarSearchProvider<F> {
    /// Creates a provider for an arbitrary profile.
    pub fn new(
        profile: ProviderProfile,
        formatter: F,
        engine: Arc<dyn PrincipalSearch>,
        features: Arc<dyn FeatureGate>,
        urls: Arc<dyn UrlGenerator>,
    ) -> Self {
        Self {
            profile,
            formatter,
            options: FormatOptions::default(),
            engine,
            features,
            urls,
        }
    }

    /// Builder: set the formatting options.
    pub fn with_options(mut self, options: FormatOptions) -> Self {
        self.options = options;
        self
    }

    /// Returns the profile.
    pub fn profile(&self) -> &ProviderProfile {
        &self.profile
    }

    fn entry(&self, hit: &SearchHit) -> SearchResultEntry {
        let app = &self.profile.app;
        SearchResultEntry::new(
            self.urls.image_path(app, &self.profile.thumbnail),
            self.formatter.title(&hit.component, &self.options),
            self.formatter.subline(&hit.component, &self.options),
            self.urls
                .link_to_object(app, &hit.container.uri, &hit.object.uri),
        )
    }

    async fn run(&self, user: &User, request: &ProviderQuery) -> ProviderResult<SearchResult> {
        if !self.features.is_enabled(user, &self.profile.app) {
            debug!(
                provider = %self.profile.id,
                user = %user.uid,
                feature = %self.profile.app,
                "Feature disabled, returning no results"
            );
            return Ok(SearchResult::complete(&self.profile.name, Vec::new()));
        }

        let principal = Principal::for_user(&user.uid)
            .map_err(|_| ProviderError::InvalidUser(user.uid.clone()))?;
        let page = self
            .engine
            .search(&principal, &self.profile.query(request))
            .await?;

        let entries: Vec<_> = page.hits.iter().map(|hit| self.entry(hit)).collect();
        debug!(
            provider = %self.profile.id,
            entries = entries.len(),
            cursor = page.next_offset,
            "Provider search finished"
        );
        Ok(SearchResult::paginated(
            &self.profile.name,
            entries,
            page.next_offset,
        ))
    }
}

impl<F: SublineFormatter> SearchProvider for CalendarSearchProvider<F> {
    fn id(&self) -> &str {
        &self.profile.id
    }

    fn name(&self) -> &str {
        &self.profile.name
    }

    fn order(&self) -> i32 {
        self.profile.order
    }

    fn search<'a>(
        &'a self,
        user: &'a User,
        query: &'a ProviderQuery,
    ) -> BoxFuture<'a, ProviderResult<SearchResult>> {
        Box::pin(self.run(user, query))
    }
}
