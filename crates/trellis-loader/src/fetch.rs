//! The fetch capability and the stock fetchers.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use url::Url;

use trellis_spec::Kind;

use crate::codec;
use crate::error::FetchError;

/// Bytes of a resource plus the kind the fetcher determined for it.
#[derive(Debug, Clone)]
pub struct Fetched {
    pub kind: Kind,
    pub bytes: Vec<u8>,
}

impl Fetched {
    pub fn new(kind: Kind, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            kind,
            bytes: bytes.into(),
        }
    }

    /// Wrap bytes, determining the kind with [`sniff_kind`].
    pub fn sniffed(bytes: impl Into<Vec<u8>>, expected: Option<Kind>) -> Self {
        let bytes = bytes.into();
        Self {
            kind: sniff_kind(&bytes, expected),
            bytes,
        }
    }
}

/// Retrieves the raw bytes of a resource.
///
/// Implementations are shared by every fetch of a load and must accept
/// concurrent calls for distinct URIs. `expected` is the kind the
/// referencing site needs when it addresses the resource as a whole, and
/// `None` when it points inside it.
#[async_trait]
pub trait Fetch: Send + Sync {
    async fn fetch(
        &self,
        uri: &Url,
        expected: Option<Kind>,
        cancel: &CancellationToken,
    ) -> Result<Fetched, FetchError>;
}

/// Kind of a resource from its content: anything with an `openapi` key is a
/// document, otherwise the expected kind, otherwise an untyped fragment.
pub fn sniff_kind(bytes: &[u8], expected: Option<Kind>) -> Kind {
    let declares_version = matches!(
        codec::decode(bytes),
        Ok(Value::Object(object)) if object.contains_key("openapi")
    );
    if declares_version {
        Kind::Document
    } else {
        expected.unwrap_or(Kind::Fragment)
    }
}

/// Turn a command-line argument into an absolute URI. Absolute URIs pass
/// through; anything else is a filesystem path.
pub fn root_url(input: &str) -> Result<Url, FetchError> {
    // A one-letter scheme is a Windows drive.
    if let Ok(url) = Url::parse(input) {
        if url.scheme().len() > 1 {
            return Ok(url);
        }
    }

    let invalid = |reason: String| FetchError::InvalidUri {
        uri: input.to_string(),
        reason,
    };
    let path = std::path::absolute(Path::new(input)).map_err(|e| invalid(e.to_string()))?;
    Url::from_file_path(&path).map_err(|()| invalid("not an absolute path".to_string()))
}

/// Reads `file:` URIs from the local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileFetcher;

#[async_trait]
impl Fetch for FileFetcher {
    async fn fetch(
        &self,
        uri: &Url,
        expected: Option<Kind>,
        cancel: &CancellationToken,
    ) -> Result<Fetched, FetchError> {
        let path = uri.to_file_path().map_err(|()| FetchError::InvalidUri {
            uri: uri.to_string(),
            reason: "not a local file path".to_string(),
        })?;

        let bytes = tokio::select! {
            _ = cancel.cancelled() => return Err(FetchError::Cancelled),
            read = tokio::fs::read(&path) => read,
        };

        match bytes {
            Ok(bytes) => {
                tracing::trace!(path = %path.display(), bytes = bytes.len(), "file read");
                Ok(Fetched::sniffed(bytes, expected))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(FetchError::NotFound(uri.to_string()))
            }
            Err(source) => Err(FetchError::Io {
                path: path.display().to_string(),
                source,
            }),
        }
    }
}

/// Fetches `http:` and `https:` URIs.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// A fetcher whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("trellis/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Http(e.to_string()))?;
        Ok(Self { client })
    }

    /// Use an existing client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn fetch(
        &self,
        uri: &Url,
        expected: Option<Kind>,
        cancel: &CancellationToken,
    ) -> Result<Fetched, FetchError> {
        let request = async {
            let response = self
                .client
                .get(uri.clone())
                .send()
                .await
                .map_err(|e| FetchError::Http(e.to_string()))?;

            let status = response.status();
            if status == reqwest::StatusCode::NOT_FOUND || status == reqwest::StatusCode::GONE {
                return Err(FetchError::NotFound(uri.to_string()));
            }
            if !status.is_success() {
                return Err(FetchError::Http(format!("{} returned {}", uri, status)));
            }

            response
                .bytes()
                .await
                .map_err(|e| FetchError::Http(e.to_string()))
        };

        let bytes = tokio::select! {
            _ = cancel.cancelled() => return Err(FetchError::Cancelled),
            bytes = request => bytes?,
        };
        tracing::trace!(uri = %uri, bytes = bytes.len(), "http body received");
        Ok(Fetched::sniffed(bytes.to_vec(), expected))
    }
}

/// Dispatches on the URI scheme.
#[derive(Clone, Default)]
pub struct SchemeFetcher {
    fetchers: HashMap<String, Arc<dyn Fetch>>,
}

impl SchemeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// `file`, `http` and `https`, with HTTP requests bounded by `timeout`.
    pub fn standard(timeout: Duration) -> Result<Self, FetchError> {
        let http: Arc<dyn Fetch> = Arc::new(HttpFetcher::new(timeout)?);
        Ok(Self::new()
            .with("file", Arc::new(FileFetcher))
            .with("http", Arc::clone(&http))
            .with("https", http))
    }

    /// Register `fetcher` for `scheme`, replacing any previous one.
    pub fn with(mut self, scheme: impl Into<String>, fetcher: Arc<dyn Fetch>) -> Self {
        self.fetchers.insert(scheme.into().to_ascii_lowercase(), fetcher);
        self
    }

    pub fn supports(&self, scheme: &str) -> bool {
        self.fetchers.contains_key(&scheme.to_ascii_lowercase())
    }
}

#[async_trait]
impl Fetch for SchemeFetcher {
    async fn fetch(
        &self,
        uri: &Url,
        expected: Option<Kind>,
        cancel: &CancellationToken,
    ) -> Result<Fetched, FetchError> {
        match self.fetchers.get(uri.scheme()) {
            Some(fetcher) => fetcher.fetch(uri, expected, cancel).await,
            None => Err(FetchError::UnsupportedScheme(uri.scheme().to_string())),
        }
    }
}
