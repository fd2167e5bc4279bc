//! Loading multi-file OpenAPI descriptions.
//!
//! [`Loader`] fetches a root document and every resource it references,
//! decodes each once, infers its version and dialect, validates it, and
//! attaches every reference to its target. The result is one
//! [`Graph`](trellis_spec::Graph).
//!
//! # Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//! use trellis_loader::{root_url, Loader, SchemeFetcher};
//! use trellis_validator::ValidatorFactory;
//!
//! let fetch = Arc::new(SchemeFetcher::standard(Duration::from_secs(30))?);
//! let validator = Arc::new(ValidatorFactory::new().build()?);
//! let loader = Loader::new(fetch, validator);
//! let graph = loader.load(&root_url("api.yaml")?).await?;
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod fetch;
pub mod infer;
pub mod loader;
pub mod resolver;

pub use config::LoaderConfig;
pub use error::{FetchError, LoadError};
pub use fetch::{root_url, sniff_kind, Fetch, FileFetcher, Fetched, HttpFetcher, SchemeFetcher};
pub use loader::Loader;
pub use tokio_util::sync::CancellationToken;
