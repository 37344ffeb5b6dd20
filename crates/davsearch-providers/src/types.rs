//! Provider requests and results.

use serde::{Deserialize, Serialize};

/// The user a search runs for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// User id; the principal is `principals/users/<uid>`.
    pub uid: String,
    /// Human-readable name, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl User {
    /// Creates a user with the given id.
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            display_name: None,
        }
    }

    /// Builder method to set the display name.
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }
}

/// A search request as seen by a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderQuery {
    /// Free-text term.
    pub term: String,
    /// Page size.
    pub limit: usize,
    /// Offset of the first entry, as returned in a previous result.
    pub cursor: usize,
}

impl ProviderQuery {
    /// Default page size.
    pub const DEFAULT_LIMIT: usize = 5;

    /// Creates a query for the first page.
    pub fn new(term: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            limit: Self::DEFAULT_LIMIT,
            cursor: 0,
        }
    }

    /// Builder method to set the page size.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Builder method to set the cursor.
    pub fn with_cursor(mut self, cursor: usize) -> Self {
        self.cursor = cursor;
        self
    }
}

/// One rendered search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResultEntry {
    /// Image shown next to the entry.
    pub thumbnail_url: String,
    /// Main line.
    pub title: String,
    /// Secondary line, possibly empty.
    pub subline: String,
    /// Link to the object.
    pub resource_url: String,
    /// Icon class, possibly empty.
    pub icon: String,
    /// Whether the thumbnail is drawn rounded.
    pub rounded: bool,
}

impl SearchResultEntry {
    /// Creates an entry without icon.
    pub fn new(
        thumbnail_url: impl Into<String>,
        title: impl Into<String>,
        subline: impl Into<String>,
        resource_url: impl Into<String>,
    ) -> Self {
        Self {
            thumbnail_url: thumbnail_url.into(),
            title: title.into(),
            subline: subline.into(),
            resource_url: resource_url.into(),
            icon: String::new(),
            rounded: false,
        }
    }
}

/// The entries one provider returns for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Provider name, e.g. "Events".
    pub name: String,
    /// Entries in result order.
    pub entries: Vec<SearchResultEntry>,
    /// Cursor for the next page; absent for complete results.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<usize>,
    /// Whether more entries may follow at `cursor`.
    #[serde(rename = "isPaginated")]
    pub paginated: bool,
}

impl SearchResult {
    /// A result that will never have further pages.
    pub fn complete(name: impl Into<String>, entries: Vec<SearchResultEntry>) -> Self {
        Self {
            name: name.into(),
            entries,
            cursor: None,
            paginated: false,
        }
    }

    /// A result continued at `cursor`.
    pub fn paginated(
        name: impl Into<String>,
        entries: Vec<SearchResultEntry>,
        cursor: usize,
    ) -> Self {
        Self {
            name: name.into(),
            entries,
            cursor: Some(cursor),
            paginated: true,
        }
    }

    /// Returns true if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complete_results_have_no_cursor() {
        let result = SearchResult::complete("Events", Vec::new());
        assert!(!result.paginated);
        assert_eq!(result.cursor, None);
        assert!(result.is_empty());
    }

    #[test]
    fn serializes_like_the_unified_search_api() {
        let result = SearchResult::paginated(
            "Tasks",
            vec![SearchResultEntry::new("/t.svg", "Buy milk", "Due on 20.08.20", "/apps/tasks/a/b")],
            3,
        );
        insta::assert_snapshot!(serde_json::to_string_pretty(&result).unwrap(), @r#"
        {
          "name": "Tasks",
          "entries": [
            {
              "thumbnailUrl": "/t.svg",
              "title": "Buy milk",
              "subline": "Due on 20.08.20",
              "resourceUrl": "/apps/tasks/a/b",
              "icon": "",
              "rounded": false
            }
          ],
          "cursor": 3,
          "isPaginated": true
        }
        "#);
    }
}
