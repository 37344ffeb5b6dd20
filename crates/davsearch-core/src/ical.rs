//! Parsed iCalendar structure.
//!
//! The raw text of a calendar object is parsed with the `icalendar` crate's
//! content-line parser and copied into an owned tree of components,
//! properties and parameters. Names are upper-cased, quoted parameter values
//! are unquoted and TEXT escapes are decoded, so matchers and formatters can
//! compare plain strings.

use icalendar::parser;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{CoreError, CoreResult};
use crate::object::ComponentType;

/// Name of the calendar root component.
pub const VCALENDAR: &str = "VCALENDAR";

/// Component names that never carry searchable content on their own.
const AUXILIARY_COMPONENTS: &[&str] = &["VTIMEZONE", "VALARM", "STANDARD", "DAYLIGHT"];

/// A parameter attached to a property, e.g. `CN="Bob Jones"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IcalParameter {
    /// Upper-cased parameter name.
    pub name: String,
    /// Unquoted value; empty for value-less parameters.
    pub value: String,
}

/// A single content line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IcalProperty {
    /// Upper-cased property name.
    pub name: String,
    /// Parameters in document order.
    pub params: Vec<IcalParameter>,
    /// Decoded value.
    pub value: String,
}

impl IcalProperty {
    /// Creates a property without parameters.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into().to_ascii_uppercase(),
            params: Vec::new(),
            value: value.into(),
        }
    }

    /// Builder method to append a parameter.
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push(IcalParameter {
            name: name.into().to_ascii_uppercase(),
            value: value.into(),
        });
        self
    }

    /// Returns the first value of the named parameter.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
            .map(|p| p.value.as_str())
    }

    /// Returns every value of the named parameter.
    pub fn params_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.params
            .iter()
            .filter(move |p| p.name.eq_ignore_ascii_case(name))
            .map(|p| p.value.as_str())
    }
}

/// A component and its nested components.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IcalComponent {
    /// Upper-cased component name.
    pub name: String,
    /// Properties in document order.
    pub properties: Vec<IcalProperty>,
    /// Nested components in document order.
    pub components: Vec<IcalComponent>,
}

impl IcalComponent {
    /// Creates an empty component.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into().to_ascii_uppercase(),
            properties: Vec::new(),
            components: Vec::new(),
        }
    }

    /// Builder method to append a property.
    pub fn with_property(mut self, property: IcalProperty) -> Self {
        self.properties.push(property);
        self
    }

    /// Builder method to append a nested component.
    pub fn with_component(mut self, component: IcalComponent) -> Self {
        self.components.push(component);
        self
    }

    /// Returns the first property with the given name.
    pub fn property(&self, name: &str) -> Option<&IcalProperty> {
        self.properties
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// Returns the value of the first property with the given name.
    pub fn property_value(&self, name: &str) -> Option<&str> {
        self.property(name).map(|p| p.value.as_str())
    }

    /// Returns every instance of a (possibly multi-valued) property.
    pub fn properties_named<'a>(
        &'a self,
        name: &'a str,
    ) -> impl Iterator<Item = &'a IcalProperty> + 'a {
        self.properties
            .iter()
            .filter(move |p| p.name.eq_ignore_ascii_case(name))
    }

    /// Returns the first component named `name`, searching depth-first in
    /// document order. `self` is considered too.
    pub fn first_component(&self, name: &str) -> Option<&IcalComponent> {
        if self.name.eq_ignore_ascii_case(name) {
            return Some(self);
        }
        self.components
            .iter()
            .find_map(|child| child.first_component(name))
    }

    /// Returns the type of the first non-auxiliary component below the root.
    pub fn main_component_type(&self) -> Option<ComponentType> {
        self.components
            .iter()
            .find(|c| !AUXILIARY_COMPONENTS.contains(&c.name.as_str()))
            .map(|c| ComponentType::from_name(&c.name))
    }
}

/// Parses iCalendar text into a component tree rooted at `VCALENDAR`.
///
/// Input without a `VCALENDAR` wrapper is accepted; its top-level
/// components are placed under a synthetic root.
///
/// # Errors
///
/// Returns [`CoreError::Parse`] if the text is not valid iCalendar.
pub fn parse_calendar(text: &str) -> CoreResult<IcalComponent> {
    let unfolded = parser::unfold(text);
    let trimmed = unfolded.trim();
    if trimmed.is_empty() {
        return Err(CoreError::parse("empty calendar data"));
    }

    let calendar = parser::read_calendar(trimmed).map_err(|e| CoreError::parse(e.to_string()))?;
    let mut roots: Vec<IcalComponent> = calendar.components.iter().map(convert_component).collect();

    trace!(roots = roots.len(), "Parsed calendar data");

    if roots.len() == 1 && roots[0].name == VCALENDAR {
        return Ok(roots.remove(0));
    }
    if roots.is_empty() {
        return Err(CoreError::parse("calendar data holds no component"));
    }

    Ok(IcalComponent {
        name: VCALENDAR.to_string(),
        properties: Vec::new(),
        components: roots,
    })
}

fn convert_component(component: &parser::Component<'_>) -> IcalComponent {
    IcalComponent {
        name: component.name.as_str().to_ascii_uppercase(),
        properties: component.properties.iter().map(convert_property).collect(),
        components: component.components.iter().map(convert_component).collect(),
    }
}

fn convert_property(property: &parser::Property<'_>) -> IcalProperty {
    IcalProperty {
        name: property.name.as_str().to_ascii_uppercase(),
        params: property
            .params
            .iter()
            .map(|param| IcalParameter {
                name: param.key.as_str().to_ascii_uppercase(),
                value: param
                    .val
                    .as_ref()
                    .map(|v| unquote(v.as_str()).to_string())
                    .unwrap_or_default(),
            })
            .collect(),
        value: unescape_text(property.val.as_str()),
    }
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

/// Decodes RFC 5545 TEXT escapes (`\n`, `\N`, `\,`, `\;`, `\\`).
pub fn unescape_text(value: &str) -> String {
    if !value.contains('\\') {
        return value.to_string();
    }

    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n' | 'N') => out.push('\n'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
