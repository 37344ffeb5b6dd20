//! Unified-search providers for calendar events and tasks
//!
//! Turns engine hits into result entries with a title, a subline and
//! links:
//!
//! - [`EventsSearchProvider`] (`dav-calendar`) searches `VEVENT`s by
//!   summary, location, description, attendees and organizer
//! - [`TasksSearchProvider`] (`dav-tasks`) searches `VTODO`s by summary
//!   and description
//!
//! Both are [`CalendarSearchProvider`]s configured by a [`ProviderProfile`].

pub mod calendar;
pub mod error;
pub mod features;
pub mod format;
pub mod links;
pub mod provider;
pub mod types;

pub use calendar::{
    CalendarSearchProvider, EventsSearchProvider, ProviderProfile, TasksSearchProvider,
};
pub use error::{ProviderError, ProviderResult};
pub use features::{FeatureGate, StaticFeatureGate};
pub use format::{EventSubline, FormatOptions, SublineFormatter, TaskSubline};
pub use links::{BaseUrlGenerator, UrlGenerator};
pub use provider::SearchProvider;
pub use types::{ProviderQuery, SearchResult, SearchResultEntry, User};
