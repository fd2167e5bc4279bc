//! An in-memory fetcher with fetch accounting.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use url::Url;

use trellis_loader::{Fetch, FetchError, Fetched};
use trellis_spec::Kind;

/// A failure to report instead of serving a resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    NotFound,
    Http(String),
}

impl Failure {
    fn to_error(&self, uri: &Url) -> FetchError {
        match self {
            Failure::NotFound => FetchError::NotFound(uri.to_string()),
            Failure::Http(message) => FetchError::Http(message.clone()),
        }
    }
}

#[derive(Debug, Clone)]
struct Entry {
    bytes: Vec<u8>,
    kind: Option<Kind>,
}

/// Serves resources registered by URI.
///
/// Every call is counted, and the number of fetches running at the same
/// time is tracked so tests can check the loader's concurrency bound.
#[derive(Debug, Default)]
pub struct MemoryFetcher {
    resources: HashMap<String, Entry>,
    failures: HashMap<String, Failure>,
    latency: Option<Duration>,
    fetches: Mutex<HashMap<String, usize>>,
    running: AtomicUsize,
    peak: AtomicUsize,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `value` as JSON text at `uri`. The kind is sniffed per request.
    pub fn with_json(self, uri: &str, value: Value) -> Self {
        self.with_text(uri, value.to_string())
    }

    /// Serve `text` (JSON or YAML) at `uri`.
    pub fn with_text(mut self, uri: &str, text: impl Into<String>) -> Self {
        self.resources.insert(
            uri.to_string(),
            Entry {
                bytes: text.into().into_bytes(),
                kind: None,
            },
        );
        self
    }

    /// Serve `text` at `uri` and always report it as `kind`.
    pub fn with_typed(mut self, uri: &str, kind: Kind, text: impl Into<String>) -> Self {
        self.resources.insert(
            uri.to_string(),
            Entry {
                bytes: text.into().into_bytes(),
                kind: Some(kind),
            },
        );
        self
    }

    /// Fail every fetch of `uri`.
    pub fn with_failure(mut self, uri: &str, failure: Failure) -> Self {
        self.failures.insert(uri.to_string(), failure);
        self
    }

    /// Delay every fetch by `latency`, or until the load is cancelled.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// How many times `uri` was fetched.
    pub fn fetches(&self, uri: &str) -> usize {
        self.fetches.lock().get(uri).copied().unwrap_or(0)
    }

    pub fn total_fetches(&self) -> usize {
        self.fetches.lock().values().sum()
    }

    /// The largest number of fetches observed running at once.
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    fn enter(&self) -> Running<'_> {
        let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        Running(&self.running)
    }
}

struct Running<'a>(&'a AtomicUsize);

impl Drop for Running<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Fetch for MemoryFetcher {
    async fn fetch(
        &self,
        uri: &Url,
        expected: Option<Kind>,
        cancel: &CancellationToken,
    ) -> Result<Fetched, FetchError> {
        *self.fetches.lock().entry(uri.to_string()).or_default() += 1;
        let _running = self.enter();

        if let Some(latency) = self.latency {
            tokio::select! {
                _ = cancel.cancelled() => return Err(FetchError::Cancelled),
                _ = tokio::time::sleep(latency) => {}
            }
        }

        if let Some(failure) = self.failures.get(uri.as_str()) {
            return Err(failure.to_error(uri));
        }
        let entry = self
            .resources
            .get(uri.as_str())
            .ok_or_else(|| FetchError::NotFound(uri.to_string()))?;
        Ok(match entry.kind {
            Some(kind) => Fetched::new(kind, entry.bytes.clone()),
            None => Fetched::sniffed(entry.bytes.clone(), expected),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[tokio::test]
    async fn serves_and_counts() {
        let fetcher = MemoryFetcher::new().with_json("mem:/a.json", json!({"type": "string"}));
        let cancel = CancellationToken::new();

        let fetched = fetcher
            .fetch(&url("mem:/a.json"), Some(Kind::Schema), &cancel)
            .await
            .unwrap();
        assert_eq!(fetched.kind, Kind::Schema);
        fetcher.fetch(&url("mem:/a.json"), None, &cancel).await.unwrap();

        assert_eq!(fetcher.fetches("mem:/a.json"), 2);
        assert_eq!(fetcher.total_fetches(), 2);
        assert_eq!(fetcher.peak_concurrency(), 1);
    }

    #[tokio::test]
    async fn reports_missing_and_injected_failures() {
        let fetcher =
            MemoryFetcher::new().with_failure("mem:/down.json", Failure::Http("503".into()));
        let cancel = CancellationToken::new();

        assert!(matches!(
            fetcher.fetch(&url("mem:/down.json"), None, &cancel).await,
            Err(FetchError::Http(message)) if message == "503"
        ));
        assert!(matches!(
            fetcher.fetch(&url("mem:/nope.json"), None, &cancel).await,
            Err(FetchError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn latency_yields_to_cancellation() {
        let fetcher = MemoryFetcher::new()
            .with_json("mem:/a.json", json!({}))
            .with_latency(Duration::from_secs(60));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = fetcher
            .fetch(&url("mem:/a.json"), None, &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Cancelled));
    }

    #[tokio::test]
    async fn typed_entries_skip_sniffing() {
        let fetcher = MemoryFetcher::new().with_typed("mem:/p.yaml", Kind::Parameter, "openapi: 3.1.0");
        let fetched = fetcher
            .fetch(&url("mem:/p.yaml"), None, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(fetched.kind, Kind::Parameter);
    }
}
