//! Property matching.
//!
//! A [`Matcher`] decides whether a component contains the search term in
//! one of the searchable properties or parameters. Matching is boolean:
//! the first hit is reported, nothing is ranked.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use davsearch_core::{CoreError, IcalComponent, SearchParameters};
use icu::casemap::CaseMapper;
use serde::{Deserialize, Serialize};

/// RFC 4790 collations supported for term comparison.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Collation {
    /// `i;unicode-casemap`: Unicode case folding.
    #[default]
    UnicodeCasemap,
    /// `i;ascii-casemap`: only ASCII letters are folded.
    AsciiCasemap,
    /// `i;octet`: case-sensitive.
    Octet,
}

impl Collation {
    /// Returns the RFC 4790 name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnicodeCasemap => "i;unicode-casemap",
            Self::AsciiCasemap => "i;ascii-casemap",
            Self::Octet => "i;octet",
        }
    }

    /// Folds `text` so that two folded strings compare as the collation says.
    pub fn fold<'a>(&self, text: &'a str) -> Cow<'a, str> {
        match self {
            Self::UnicodeCasemap => Cow::Owned(CaseMapper::new().fold_string(text).into_owned()),
            Self::AsciiCasemap => Cow::Owned(text.to_ascii_lowercase()),
            Self::Octet => Cow::Borrowed(text),
        }
    }

    /// Returns true if `haystack` contains the already folded `needle`.
    pub fn contains(&self, haystack: &str, folded_needle: &str) -> bool {
        self.fold(haystack).contains(folded_needle)
    }
}

impl fmt::Display for Collation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Collation {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "i;unicode-casemap" => Ok(Self::UnicodeCasemap),
            "i;ascii-casemap" => Ok(Self::AsciiCasemap),
            "i;octet" => Ok(Self::Octet),
            _ => Err(CoreError::UnknownCollation(s.to_string())),
        }
    }
}

impl TryFrom<String> for Collation {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Collation> for String {
    fn from(value: Collation) -> Self {
        value.as_str().to_string()
    }
}

/// Where a term was found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchedProperty {
    /// Property name, e.g. `ATTENDEE`.
    pub property: String,
    /// Parameter name when the hit was in a parameter, e.g. `CN`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameter: Option<String>,
    /// The matching value, as stored.
    pub value: String,
}

impl MatchedProperty {
    fn value(property: &str, value: &str) -> Self {
        Self {
            property: property.to_string(),
            parameter: None,
            value: value.to_string(),
        }
    }

    fn parameter(property: &str, parameter: &str, value: &str) -> Self {
        Self {
            property: property.to_string(),
            parameter: Some(parameter.to_string()),
            value: value.to_string(),
        }
    }
}

/// Decides whether a component matches a term.
pub trait Matcher: Send + Sync {
    /// Returns the first searchable property or parameter of `component`
    /// containing `term`.
    ///
    /// Values of `properties` are searched, as are the parameters listed in
    /// `parameters` (whether or not their property is in `properties`).
    /// Absent properties simply do not match.
    fn find_match(
        &self,
        component: &IcalComponent,
        term: &str,
        properties: &[String],
        parameters: &SearchParameters,
    ) -> Option<MatchedProperty>;

    /// Returns true if [`Matcher::find_match`] finds anything.
    fn matches(
        &self,
        component: &IcalComponent,
        term: &str,
        properties: &[String],
        parameters: &SearchParameters,
    ) -> bool {
        self.find_match(component, term, properties, parameters)
            .is_some()
    }
}

/// Case-insensitive substring matching under a [`Collation`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubstringMatcher {
    collation: Collation,
}

impl SubstringMatcher {
    /// Creates a matcher using `collation`.
    pub fn new(collation: Collation) -> Self {
        Self { collation }
    }

    /// Returns the collation in use.
    pub fn collation(&self) -> Collation {
        self.collation
    }
}

impl Matcher for SubstringMatcher {
    fn find_match(
        &self,
        component: &IcalComponent,
        term: &str,
        properties: &[String],
        parameters: &SearchParameters,
    ) -> Option<MatchedProperty> {
        let needle = self.collation.fold(term);

        let parameter_only = parameters
            .properties()
            .filter(|name| !properties.iter().any(|p| p.eq_ignore_ascii_case(name)));
        let candidates = properties
            .iter()
            .map(String::as_str)
            .chain(parameter_only);

        for name in candidates {
            let value_searchable = properties.iter().any(|p| p.eq_ignore_ascii_case(name));
            let searchable_params = parameters.get(name);

            for property in component.properties_named(name) {
                if value_searchable && self.collation.contains(&property.value, &needle) {
                    return Some(MatchedProperty::value(&property.name, &property.value));
                }
                for param in searchable_params {
                    if let Some(value) = property
                        .params_named(param)
                        .find(|value| self.collation.contains(value, &needle))
                    {
                        return Some(MatchedProperty::parameter(&property.name, param, value));
                    }
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use davsearch_core::IcalProperty;

    fn meeting() -> IcalComponent {
        IcalComponent::new("VEVENT")
            .with_property(IcalProperty::new("SUMMARY", "Team Sync"))
            .with_property(IcalProperty::new("LOCATION", "Room 4"))
            .with_property(
                IcalProperty::new("ATTENDEE", "mailto:bob@example.com")
                    .with_param("CN", "Bob Jones"),
            )
            .with_property(
                IcalProperty::new("ATTENDEE", "mailto:carol@example.com")
                    .with_param("CN", "Carol Straße"),
            )
    }

    fn props(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn matches_substrings_case_insensitively() {
        let matcher = SubstringMatcher::default();
        let properties = props(&["SUMMARY"]);
        let none = SearchParameters::new();

        assert!(matcher.matches(&meeting(), "team", &properties, &none));
        assert!(matcher.matches(&meeting(), "M SY", &properties, &none));
        assert!(matcher.matches(&meeting(), "Team Sync", &properties, &none));
        assert!(!matcher.matches(&meeting(), "teams", &properties, &none));
    }

    #[test]
    fn unlisted_properties_are_ignored() {
        let matcher = SubstringMatcher::default();
        assert!(!matcher.matches(&meeting(), "room", &props(&["SUMMARY"]), &SearchParameters::new()));
        assert!(!matcher.matches(&meeting(), "team", &props(&["DESCRIPTION"]), &SearchParameters::new()));
    }

    #[test]
    fn parameters_match_without_listing_the_property() {
        let matcher = SubstringMatcher::default();
        let parameters = SearchParameters::new().with("ATTENDEE", ["CN"]);

        let hit = matcher
            .find_match(&meeting(), "bob", &props(&["SUMMARY"]), &parameters)
            .unwrap();
        assert_eq!(
            hit,
            MatchedProperty {
                property: "ATTENDEE".into(),
                parameter: Some("CN".into()),
                value: "Bob Jones".into(),
            }
        );

        // The value (mailto:...) is not searchable unless ATTENDEE is listed.
        assert!(!matcher.matches(&meeting(), "example.com", &props(&["SUMMARY"]), &parameters));
        assert!(matcher.matches(&meeting(), "example.com", &props(&["ATTENDEE"]), &parameters));
    }

    #[test]
    fn every_instance_of_a_property_is_checked() {
        let matcher = SubstringMatcher::default();
        let parameters = SearchParameters::new().with("ATTENDEE", ["CN"]);
        let hit = matcher
            .find_match(&meeting(), "carol", &[], &parameters)
            .unwrap();
        assert_eq!(hit.value, "Carol Straße");
    }

    #[test]
    fn first_listed_property_wins() {
        let matcher = SubstringMatcher::default();
        let component = IcalComponent::new("VEVENT")
            .with_property(IcalProperty::new("SUMMARY", "Budget"))
            .with_property(IcalProperty::new("DESCRIPTION", "Budget review"));

        let hit = matcher
            .find_match(&component, "budget", &props(&["DESCRIPTION", "SUMMARY"]), &SearchParameters::new())
            .unwrap();
        assert_eq!(hit.property, "DESCRIPTION");
    }

    #[test]
    fn collations_fold_differently() {
        let parameters = SearchParameters::new().with("ATTENDEE", ["CN"]);

        let unicode = SubstringMatcher::new(Collation::UnicodeCasemap);
        assert!(unicode.matches(&meeting(), "STRASSE", &[], &parameters));

        let ascii = SubstringMatcher::new(Collation::AsciiCasemap);
        assert!(!ascii.matches(&meeting(), "STRASSE", &[], &parameters));
        assert!(ascii.matches(&meeting(), "CAROL", &[], &parameters));

        let octet = SubstringMatcher::new(Collation::Octet);
        assert!(!octet.matches(&meeting(), "carol", &[], &parameters));
        assert!(octet.matches(&meeting(), "Carol", &[], &parameters));
    }

    #[test]
    fn collation_names() {
        assert_eq!("i;octet".parse::<Collation>().unwrap(), Collation::Octet);
        assert_eq!(
            " I;ASCII-CASEMAP ".parse::<Collation>().unwrap(),
            Collation::AsciiCasemap
        );
        assert_eq!(Collation::default().to_string(), "i;unicode-casemap");
        assert_eq!(
            "i;basic".parse::<Collation>().unwrap_err(),
            CoreError::UnknownCollation("i;basic".to_string())
        );
    }
}
