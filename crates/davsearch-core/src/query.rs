//! Search queries.
//!
//! A [`SearchQuery`] names what to look for (term), where to look
//! (component types, properties, parameters) and which page to return
//! (limit, offset). Queries are validated before any store is touched.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::object::{ComponentType, ComponentTypes};

/// Searchable parameters per property, e.g. `ATTENDEE -> [CN]`.
///
/// Names are stored upper-cased.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchParameters(BTreeMap<String, Vec<String>>);

impl SearchParameters {
    /// Creates an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to make `parameters` of `property` searchable.
    pub fn with<I, S>(mut self, property: &str, parameters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.insert(property, parameters);
        self
    }

    /// Makes `parameters` of `property` searchable.
    pub fn insert<I, S>(&mut self, property: &str, parameters: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let entry = self.0.entry(property.to_ascii_uppercase()).or_default();
        for parameter in parameters {
            let parameter = parameter.as_ref().to_ascii_uppercase();
            if !entry.contains(&parameter) {
                entry.push(parameter);
            }
        }
    }

    /// Returns the searchable parameters of `property`.
    pub fn get(&self, property: &str) -> &[String] {
        self.0
            .get(&property.to_ascii_uppercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Iterates over property names in sorted order.
    pub fn properties(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Returns true if no parameter is searchable.
    pub fn is_empty(&self) -> bool {
        self.0.values().all(Vec::is_empty)
    }
}

/// A search over a principal's calendar objects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Free-text term, matched case-insensitively as a substring.
    pub term: String,
    /// Component types to consider.
    pub component_types: ComponentTypes,
    /// Property names whose values are searched, in order.
    pub search_properties: Vec<String>,
    /// Parameters whose values are searched as well.
    pub search_parameters: SearchParameters,
    /// Page size.
    pub limit: usize,
    /// Position of the first result in the full ordered result set.
    pub offset: usize,
}

impl SearchQuery {
    /// Default page size.
    pub const DEFAULT_LIMIT: usize = 20;

    /// Starts building a query for `term`.
    pub fn builder(term: impl Into<String>) -> SearchQueryBuilder {
        SearchQueryBuilder::new(term)
    }

    /// Returns a copy of this query starting at `offset`.
    pub fn at_offset(&self, offset: usize) -> Self {
        Self {
            offset,
            ..self.clone()
        }
    }

    /// Returns a copy of this query starting at a signed offset.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidQuery`] for negative offsets.
    pub fn with_signed_offset(&self, offset: i64) -> CoreResult<Self> {
        let offset = usize::try_from(offset)
            .map_err(|_| CoreError::invalid_query(format!("offset must not be negative: {offset}")))?;
        Ok(self.at_offset(offset))
    }

    /// Returns the term with surrounding whitespace removed.
    pub fn trimmed_term(&self) -> &str {
        self.term.trim()
    }

    /// Checks the query before execution.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidQuery`] if the term is blank, no component
    /// type or searchable field is given, or the limit is zero or above
    /// `max_limit`.
    pub fn validate(&self, max_limit: Option<usize>) -> CoreResult<()> {
        if self.trimmed_term().is_empty() {
            return Err(CoreError::invalid_query("search term must not be empty"));
        }
        if self.component_types.is_empty() {
            return Err(CoreError::invalid_query(
                "at least one component type is required",
            ));
        }
        if self.search_properties.is_empty() && self.search_parameters.is_empty() {
            return Err(CoreError::invalid_query(
                "at least one property or parameter must be searchable",
            ));
        }
        if self.limit == 0 {
            return Err(CoreError::invalid_query("limit must be positive"));
        }
        if let Some(max) = max_limit
            && self.limit > max
        {
            return Err(CoreError::invalid_query(format!(
                "limit {} exceeds maximum of {max}",
                self.limit
            )));
        }
        Ok(())
    }
}

/// Builder for [`SearchQuery`].
#[derive(Debug, Clone)]
pub struct SearchQueryBuilder {
    query: SearchQuery,
}

impl SearchQueryBuilder {
    /// Creates a builder with the default limit and offset 0.
    pub fn new(term: impl Into<String>) -> Self {
        Self {
            query: SearchQuery {
                term: term.into(),
                component_types: ComponentTypes::new(),
                search_properties: Vec::new(),
                search_parameters: SearchParameters::new(),
                limit: SearchQuery::DEFAULT_LIMIT,
                offset: 0,
            },
        }
    }

    /// Adds a component type.
    pub fn component_type(mut self, kind: ComponentType) -> Self {
        self.query.component_types.insert(kind);
        self
    }

    /// Adds searchable properties, keeping their order.
    pub fn properties<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in names {
            let name = name.as_ref().to_ascii_uppercase();
            if !self.query.search_properties.contains(&name) {
                self.query.search_properties.push(name);
            }
        }
        self
    }

    /// Sets the searchable parameters.
    pub fn parameters(mut self, parameters: SearchParameters) -> Self {
        self.query.search_parameters = parameters;
        self
    }

    /// Sets the page size.
    pub fn limit(mut self, limit: usize) -> Self {
        self.query.limit = limit;
        self
    }

    /// Sets the offset.
    pub fn offset(mut self, offset: usize) -> Self {
        self.query.offset = offset;
        self
    }

    /// Returns the query. Validation happens when the query is executed.
    pub fn build(self) -> SearchQuery {
        self.query
    }
}
