//! Principal identifiers.
//!
//! A principal is the identity that owns calendars. It is carried around as
//! the DAV principal URI without the leading slash, e.g.
//! `principals/users/alice`.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Shape of a principal URI: `principals/<collection>/<name>`.
static PRINCIPAL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^principals/([a-z][a-z-]*)/([^/\s][^/]*)$").expect("Invalid principal regex")
});

/// Prefix of every user principal.
pub const USER_PRINCIPAL_PREFIX: &str = "principals/users/";

/// A stable principal identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Principal(String);

impl Principal {
    /// Builds the principal of a user from its uid.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidPrincipal`] if the uid is empty or contains `/`.
    pub fn for_user(uid: &str) -> CoreResult<Self> {
        Self::parse(format!("{USER_PRINCIPAL_PREFIX}{uid}"))
    }

    /// Validates and wraps a principal URI.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidPrincipal`] if `uri` is not of the form
    /// `principals/<collection>/<name>`.
    pub fn parse(uri: impl Into<String>) -> CoreResult<Self> {
        let uri = uri.into();
        if PRINCIPAL_REGEX.is_match(&uri) {
            Ok(Self(uri))
        } else {
            Err(CoreError::InvalidPrincipal(uri))
        }
    }

    /// Returns the principal URI.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the collection segment (`users`, `groups`, ...).
    pub fn collection(&self) -> &str {
        self.segments().0
    }

    /// Returns the last segment, the user id for user principals.
    pub fn name(&self) -> &str {
        self.segments().1
    }

    /// Returns true for `principals/users/...`.
    pub fn is_user(&self) -> bool {
        self.0.starts_with(USER_PRINCIPAL_PREFIX)
    }

    fn segments(&self) -> (&str, &str) {
        // Validated in `parse`, so both separators exist.
        let rest = self.0.strip_prefix("principals/").unwrap_or(&self.0);
        rest.split_once('/').unwrap_or((rest, ""))
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Principal {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<Principal> for String {
    fn from(value: Principal) -> Self {
        value.0
    }
}
