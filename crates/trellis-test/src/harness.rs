//! Loader construction and fixture lookup for tests.

use std::path::PathBuf;
use std::sync::Arc;

use url::Url;

use trellis_loader::{Fetch, FileFetcher, Loader, LoaderConfig, SchemeFetcher};
use trellis_validator::{NoopValidator, ValidationError, ValidatorFactory};

#[derive(Debug, thiserror::Error)]
pub enum TestError {
    #[error("rule sets failed to compile: {0}")]
    Rules(#[from] ValidationError),

    #[error("fixture {0} is not a valid file path")]
    Fixture(String),
}

/// Absolute path to the shared fixtures directory.
pub fn fixtures_dir() -> PathBuf {
    // CARGO_MANIFEST_DIR = .../crates/trellis-test
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("tests")
        .join("fixtures")
}

/// `file:` URI of a fixture, relative to the fixtures directory.
pub fn fixture(relative: &str) -> Result<Url, TestError> {
    let path = fixtures_dir().join(relative);
    let path = std::fs::canonicalize(&path).map_err(|_| TestError::Fixture(relative.to_string()))?;
    Url::from_file_path(&path).map_err(|()| TestError::Fixture(relative.to_string()))
}

/// A loader that applies every structural and graph rule.
pub fn strict_loader(fetch: Arc<dyn Fetch>, config: LoaderConfig) -> Result<Loader, TestError> {
    let validator = ValidatorFactory::new().build()?;
    Ok(Loader::new(fetch, Arc::new(validator)).with_config(config))
}

/// A loader that only resolves references.
pub fn permissive_loader(fetch: Arc<dyn Fetch>, config: LoaderConfig) -> Loader {
    Loader::new(fetch, Arc::new(NoopValidator)).with_config(config)
}

/// A strict loader reading fixtures from disk.
pub fn file_loader() -> Result<Loader, TestError> {
    let fetch = SchemeFetcher::new().with("file", Arc::new(FileFetcher));
    strict_loader(Arc::new(fetch), LoaderConfig::default())
}
