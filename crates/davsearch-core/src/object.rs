//! Calendar objects and component types.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::container::ContainerRef;
use crate::error::{CoreError, CoreResult};
use crate::ical::{IcalComponent, parse_calendar};

/// The structural kind of a calendar object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum ComponentType {
    /// `VEVENT`
    Event,
    /// `VTODO`
    Todo,
    /// `VJOURNAL`
    Journal,
    /// `VFREEBUSY`
    FreeBusy,
    /// Any other component name, upper-cased.
    Other(String),
}

impl ComponentType {
    /// Returns the iCalendar component name.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Event => "VEVENT",
            Self::Todo => "VTODO",
            Self::Journal => "VJOURNAL",
            Self::FreeBusy => "VFREEBUSY",
            Self::Other(name) => name,
        }
    }

    /// Maps a component name, case-insensitively.
    pub fn from_name(name: &str) -> Self {
        let upper = name.trim().to_ascii_uppercase();
        match upper.as_str() {
            "VEVENT" => Self::Event,
            "VTODO" => Self::Todo,
            "VJOURNAL" => Self::Journal,
            "VFREEBUSY" => Self::FreeBusy,
            _ => Self::Other(upper),
        }
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComponentType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Err(CoreError::invalid_query("component type must not be empty"));
        }
        Ok(Self::from_name(s))
    }
}

impl From<String> for ComponentType {
    fn from(value: String) -> Self {
        Self::from_name(&value)
    }
}

impl From<ComponentType> for String {
    fn from(value: ComponentType) -> Self {
        value.as_str().to_string()
    }
}

/// An ordered set of component types.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentTypes(BTreeSet<ComponentType>);

impl ComponentTypes {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a set holding one type.
    pub fn single(kind: ComponentType) -> Self {
        Self(BTreeSet::from([kind]))
    }

    /// Adds a type to the set.
    pub fn insert(&mut self, kind: ComponentType) -> bool {
        self.0.insert(kind)
    }

    /// Returns true if the set holds `kind`.
    pub fn contains(&self, kind: &ComponentType) -> bool {
        self.0.contains(kind)
    }

    /// Returns true if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of types in the set.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterates in a stable order.
    pub fn iter(&self) -> impl Iterator<Item = &ComponentType> {
        self.0.iter()
    }
}

impl FromIterator<ComponentType> for ComponentTypes {
    fn from_iter<I: IntoIterator<Item = ComponentType>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for ComponentTypes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<_> = self.0.iter().map(ComponentType::as_str).collect();
        f.write_str(&names.join(","))
    }
}

/// A stored calendar object.
///
/// The raw iCalendar text is kept as-is; [`CalendarObject::parse`] produces
/// the property tree used for matching and formatting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarObject {
    /// URI, unique within the container.
    pub uri: String,
    /// Owning container.
    pub container: ContainerRef,
    /// Kind of the object's main component.
    pub component_type: ComponentType,
    /// Raw iCalendar data.
    pub calendar_data: String,
    /// Entity tag, if the store tracks one.
    pub etag: Option<String>,
    /// Last modification time, if known.
    pub last_modified: Option<DateTime<Utc>>,
}

impl CalendarObject {
    /// Creates a new calendar object.
    pub fn new(
        container: ContainerRef,
        uri: impl Into<String>,
        component_type: ComponentType,
        calendar_data: impl Into<String>,
    ) -> Self {
        Self {
            uri: uri.into(),
            container,
            component_type,
            calendar_data: calendar_data.into(),
            etag: None,
            last_modified: None,
        }
    }

    /// Creates an object, reading the component type from the data.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Parse`] if the data cannot be parsed or holds no
    /// component other than `VTIMEZONE`.
    pub fn from_ics(
        container: ContainerRef,
        uri: impl Into<String>,
        calendar_data: impl Into<String>,
    ) -> CoreResult<Self> {
        let calendar_data = calendar_data.into();
        let root = parse_calendar(&calendar_data)?;
        let component_type = root
            .main_component_type()
            .ok_or_else(|| CoreError::parse("calendar data holds no component"))?;
        Ok(Self::new(container, uri, component_type, calendar_data))
    }

    /// Builder method to set the entity tag.
    pub fn with_etag(mut self, etag: impl Into<String>) -> Self {
        self.etag = Some(etag.into());
        self
    }

    /// Builder method to set the last modification time.
    pub fn with_last_modified(mut self, at: DateTime<Utc>) -> Self {
        self.last_modified = Some(at);
        self
    }

    /// Parses the raw calendar data.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Parse`] if the data is not valid iCalendar.
    pub fn parse(&self) -> CoreResult<IcalComponent> {
        parse_calendar(&self.calendar_data)
    }

    /// Returns the primary component of the given type.
    ///
    /// This is the first such component in document order, so for a
    /// recurring event it is the master (or the first override when the
    /// master is absent).
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Parse`] if the data is not valid iCalendar.
    pub fn primary_component(&self, kind: &ComponentType) -> CoreResult<Option<IcalComponent>> {
        let root = self.parse()?;
        Ok(root.first_component(kind.as_str()).cloned())
    }
}
