//! Core types: principals, containers, calendar objects, queries, tracing
//!
//! Everything the search engine, the storage backends and the result
//! formatters agree on lives here:
//!
//! - [`Principal`] - identity owning calendars (`principals/users/<uid>`)
//! - [`CalendarContainer`] - a calendar or subscription and its metadata
//! - [`CalendarObject`] - one stored iCalendar resource
//! - [`IcalComponent`] - the parsed property tree of a calendar object
//! - [`SearchQuery`] - term, component types, searchable properties, page bounds

pub mod container;
pub mod error;
pub mod ical;
pub mod object;
pub mod principal;
pub mod query;
pub mod time;
pub mod tracing;

pub use container::{CalendarContainer, ContainerKind, ContainerRef};
pub use error::{CoreError, CoreResult};
pub use ical::{IcalComponent, IcalParameter, IcalProperty, parse_calendar};
pub use object::{CalendarObject, ComponentType, ComponentTypes};
pub use principal::Principal;
pub use query::{SearchParameters, SearchQuery, SearchQueryBuilder};
pub use time::{IcalDateTime, parse_duration};
pub use crate::tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing, parse_level};
