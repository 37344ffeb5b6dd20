//! Calendar containers: calendars and subscriptions.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::principal::Principal;

/// The kind of a calendar container.
///
/// Ids are only unique within a kind, so a calendar and a subscription may
/// share the same numeric id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerKind {
    /// A calendar owned by the principal.
    Calendar,
    /// A read-only subscription to a remote calendar.
    Subscription,
}

impl ContainerKind {
    /// Returns a stable name for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Calendar => "calendar",
            Self::Subscription => "subscription",
        }
    }
}

impl fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifies a container across kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContainerRef {
    /// Container id, unique per kind.
    pub id: i64,
    /// Container kind.
    pub kind: ContainerKind,
}

impl ContainerRef {
    /// Creates a reference to a calendar.
    pub fn calendar(id: i64) -> Self {
        Self {
            id,
            kind: ContainerKind::Calendar,
        }
    }

    /// Creates a reference to a subscription.
    pub fn subscription(id: i64) -> Self {
        Self {
            id,
            kind: ContainerKind::Subscription,
        }
    }
}

impl fmt::Display for ContainerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.kind, self.id)
    }
}

/// A calendar or subscription visible to a principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarContainer {
    /// Container id, unique per kind.
    pub id: i64,
    /// Calendar or subscription.
    pub kind: ContainerKind,
    /// URI, stable per principal.
    pub uri: String,
    /// Human-readable name, if set.
    pub display_name: Option<String>,
    /// Whether objects in this container can be modified.
    pub read_only: bool,
    /// Display order; lower sorts first.
    pub order: i32,
    /// Owning principal.
    pub principal: Principal,
}

impl CalendarContainer {
    /// Creates a calendar.
    pub fn calendar(id: i64, uri: impl Into<String>, principal: Principal) -> Self {
        Self::new(ContainerRef::calendar(id), uri, principal)
    }

    /// Creates a subscription. Subscriptions are read-only.
    pub fn subscription(id: i64, uri: impl Into<String>, principal: Principal) -> Self {
        Self::new(ContainerRef::subscription(id), uri, principal).with_read_only(true)
    }

    fn new(reference: ContainerRef, uri: impl Into<String>, principal: Principal) -> Self {
        Self {
            id: reference.id,
            kind: reference.kind,
            uri: uri.into(),
            display_name: None,
            read_only: false,
            order: 0,
            principal,
        }
    }

    /// Builder method to set the display name.
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Builder method to set the display order.
    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    /// Builder method to set the read-only flag.
    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    /// Returns the reference identifying this container.
    pub fn reference(&self) -> ContainerRef {
        ContainerRef {
            id: self.id,
            kind: self.kind,
        }
    }

    /// Compares two containers by display order.
    ///
    /// Ties are broken by kind (calendars first) and then id, so the
    /// ordering is total.
    pub fn display_cmp(&self, other: &Self) -> Ordering {
        (self.order, self.kind, self.id).cmp(&(other.order, other.kind, other.id))
    }
}
