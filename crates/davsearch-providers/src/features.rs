//! Per-user feature availability.

use std::collections::{BTreeMap, BTreeSet};

use crate::types::User;

/// Decides whether an app feature is enabled for a user.
pub trait FeatureGate: Send + Sync {
    /// Returns true if `feature` (e.g. "calendar", "tasks") is enabled for `user`.
    fn is_enabled(&self, user: &User, feature: &str) -> bool;
}

/// A gate with a fixed configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticFeatureGate {
    /// When set, only these features are enabled.
    allowed: Option<BTreeSet<String>>,
    disabled: BTreeSet<String>,
    disabled_per_user: BTreeMap<String, BTreeSet<String>>,
}

impl StaticFeatureGate {
    /// Enables every feature for every user.
    pub fn allow_all() -> Self {
        Self::default()
    }

    /// Enables only `features`.
    pub fn only<I, S>(features: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed: Some(features.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    /// Builder: disable `feature` for everyone.
    pub fn without(mut self, feature: impl Into<String>) -> Self {
        self.disabled.insert(feature.into());
        self
    }

    /// Builder: disable `feature` for one user.
    pub fn without_for_user(mut self, uid: impl Into<String>, feature: impl Into<String>) -> Self {
        self.disabled_per_user
            .entry(uid.into())
            .or_default()
            .insert(feature.into());
        self
    }
}

impl FeatureGate for StaticFeatureGate {
    fn is_enabled(&self, user: &User, feature: &str) -> bool {
        if self
            .allowed
            .as_ref()
            .is_some_and(|allowed| !allowed.contains(feature))
        {
            return false;
        }
        if self.disabled.contains(feature) {
            return false;
        }
        !self
            .disabled_per_user
            .get(&user.uid)
            .is_some_and(|features| features.contains(feature))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allow_all_enables_everything() {
        let gate = StaticFeatureGate::allow_all();
        assert!(gate.is_enabled(&User::new("alice"), "calendar"));
        assert!(gate.is_enabled(&User::new("alice"), "anything"));
    }

    #[test]
    fn explicit_sets_and_exclusions() {
        let gate = StaticFeatureGate::only(["calendar", "tasks"])
            .without("tasks")
            .without_for_user("bob", "calendar");

        assert!(gate.is_enabled(&User::new("alice"), "calendar"));
        assert!(!gate.is_enabled(&User::new("alice"), "tasks"));
        assert!(!gate.is_enabled(&User::new("alice"), "mail"));
        assert!(!gate.is_enabled(&User::new("bob"), "calendar"));
    }
}
