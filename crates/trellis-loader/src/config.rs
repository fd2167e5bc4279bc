//! Loader configuration.

use trellis_spec::SpecVersion;

/// Default bound on fetches running at the same time.
pub const DEFAULT_MAX_CONCURRENT_FETCHES: usize = 8;

/// Loader configuration.
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Version assumed for resources that neither declare `openapi` nor are
    /// reached from a resource with a known version.
    pub default_version: Option<SpecVersion>,

    /// Dialect assumed when a resource declares none and does not inherit
    /// one. When unset the version's own dialect applies.
    pub default_dialect: Option<String>,

    /// Upper bound on concurrent fetches. Set through
    /// `with_max_concurrent_fetches`.
    max_concurrent_fetches: usize,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            default_version: None,
            default_dialect: None,
            max_concurrent_fetches: DEFAULT_MAX_CONCURRENT_FETCHES,
        }
    }
}

impl LoaderConfig {
    /// Create a new loader config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the fallback version.
    pub fn with_default_version(mut self, version: SpecVersion) -> Self {
        self.default_version = Some(version);
        self
    }

    /// Set the fallback dialect.
    pub fn with_default_dialect(mut self, dialect: impl Into<String>) -> Self {
        self.default_dialect = Some(dialect.into());
        self
    }

    /// Set the concurrent fetch bound. Zero is treated as one.
    pub fn with_max_concurrent_fetches(mut self, max: usize) -> Self {
        self.max_concurrent_fetches = max.max(1);
        self
    }

    /// Concurrent fetch bound, never below one.
    pub fn max_concurrent_fetches(&self) -> usize {
        self.max_concurrent_fetches.max(1)
    }
}
