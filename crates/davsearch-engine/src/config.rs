//! Engine configuration.

use crate::matcher::Collation;

/// Default upper bound for a page size.
pub const DEFAULT_MAX_LIMIT: usize = 200;

/// Search engine configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Largest accepted page size; `None` disables the check.
    pub max_limit: Option<usize>,

    /// Scan containers concurrently.
    pub parallel_scan: bool,

    /// Collation used by the default matcher.
    pub collation: Collation,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_limit: Some(DEFAULT_MAX_LIMIT),
            parallel_scan: true,
            collation: Collation::default(),
        }
    }
}

impl EngineConfig {
    /// Builder: set the page size bound.
    pub fn with_max_limit(mut self, max_limit: Option<usize>) -> Self {
        self.max_limit = max_limit;
        self
    }

    /// Builder: enable or disable the concurrent scan.
    pub fn with_parallel_scan(mut self, parallel: bool) -> Self {
        self.parallel_scan = parallel;
        self
    }

    /// Builder: set the collation.
    pub fn with_collation(mut self, collation: Collation) -> Self {
        self.collation = collation;
        self
    }
}
