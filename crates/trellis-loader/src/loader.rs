//! The fixpoint loader.
//!
//! A load starts from the root document and keeps a FIFO queue of pending
//! references. Each one is resolved against the graph built so far, joins
//! the fetch already running for its resource, or starts a new fetch. The
//! loop ends when the queue is empty and no fetch is running; the graph is
//! then validated as a whole.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Instant;

use futures_util::future::BoxFuture;
use futures_util::stream::{FuturesUnordered, StreamExt};
use futures_util::FutureExt;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use url::Url;

use trellis_spec::{
    collect_references, without_fragment, Context, Graph, Kind, Location, NodeId, Pointer,
    Reference, Resource, ResourceId, Target,
};
use trellis_telemetry::{
    log_load_completed, log_load_failed, log_load_started, log_resource_cached,
    log_validation_failure,
};
use trellis_validator::{ValidationError, Validator};

use crate::codec;
use crate::config::LoaderConfig;
use crate::error::{FetchError, LoadError};
use crate::fetch::{Fetch, Fetched};
use crate::infer;
use crate::resolver::{self, Resolution, Unresolved};

/// Loads multi-file OpenAPI descriptions into [`Graph`]s.
///
/// Completed graphs are cached per root URI: loading the same root again
/// returns the same `Arc<Graph>` without fetching.
pub struct Loader {
    fetch: Arc<dyn Fetch>,
    validator: Arc<dyn Validator>,
    config: LoaderConfig,
    loaded: Mutex<HashMap<Url, Arc<Graph>>>,
}

impl Loader {
    pub fn new(fetch: Arc<dyn Fetch>, validator: Arc<dyn Validator>) -> Self {
        Self {
            fetch,
            validator,
            config: LoaderConfig::default(),
            loaded: Mutex::new(HashMap::new()),
        }
    }

    /// Replace the configuration.
    pub fn with_config(mut self, config: LoaderConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Load the document at `root` and everything it references.
    pub async fn load(&self, root: &Url) -> Result<Arc<Graph>, LoadError> {
        self.load_with_cancel(root, &CancellationToken::new()).await
    }

    /// Like [`load`](Self::load), giving up with [`LoadError::Cancelled`]
    /// once `cancel` fires. Running fetches are dropped.
    pub async fn load_with_cancel(
        &self,
        root: &Url,
        cancel: &CancellationToken,
    ) -> Result<Arc<Graph>, LoadError> {
        let root = without_fragment(root);
        let cached = self.loaded.lock().get(&root).cloned();
        if let Some(graph) = cached {
            tracing::debug!(root = %root, "graph served from cache");
            return Ok(graph);
        }

        log_load_started!(root = %root);
        let started = Instant::now();

        match Session::new(self, cancel.clone()).run(&root).await {
            Ok(graph) => {
                let graph = Arc::new(graph);
                log_load_completed!(
                    root = %root,
                    resources = graph.len(),
                    references = graph.references().len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "load completed"
                );
                let mut loaded = self.loaded.lock();
                // A concurrent load of the same root may have finished first.
                Ok(Arc::clone(loaded.entry(root).or_insert(graph)))
            }
            Err(error) => {
                log_load_failed!(root = %root, code = error.code(), error = %error, "load failed");
                Err(error)
            }
        }
    }

    /// The cached graph for `root`, if one was loaded.
    pub fn cached(&self, root: &Url) -> Option<Arc<Graph>> {
        self.loaded.lock().get(&without_fragment(root)).cloned()
    }

    /// Drop the cached graph for `root` so the next load fetches again.
    pub fn forget(&self, root: &Url) -> bool {
        self.loaded.lock().remove(&without_fragment(root)).is_some()
    }
}

type InFlight = BoxFuture<'static, (Url, Result<Fetched, FetchError>)>;

/// A reference waiting for its target.
#[derive(Debug)]
struct Pending {
    /// Where the reference object sits.
    site: NodeId,
    /// Adopted fragment the reference was collected under, `None` for the
    /// resource root.
    entry: Option<Pointer>,
    location: Location,
    /// The reference as written.
    reference: String,
    /// Absolute target, fragment included.
    target: Url,
    expected: Kind,
    /// Context active at the site.
    context: Context,
}

impl Pending {
    fn from_reference(
        resource: ResourceId,
        entry: Option<&Pointer>,
        reference: &Reference,
        context: Context,
    ) -> Result<Self, LoadError> {
        let location = reference.location().clone();
        let target = reference
            .target_url()
            .map_err(|e| LoadError::NotResolvable {
                uri: location.uri().clone(),
                pointer: location.pointer().clone(),
                reference: reference.target().to_string(),
                site: location.clone(),
                reason: e.to_string(),
            })?;
        Ok(Self {
            site: NodeId::new(resource, location.pointer().clone()),
            entry: entry.cloned(),
            location,
            reference: reference.target().to_string(),
            target,
            expected: reference.expected(),
            context,
        })
    }

    fn fail(&self, unresolved: Unresolved) -> LoadError {
        let uri = without_fragment(&self.target);
        match unresolved {
            Unresolved::NotFound { pointer } => LoadError::NotFound {
                uri,
                pointer,
                reference: self.reference.clone(),
                site: self.location.clone(),
            },
            Unresolved::Missing => LoadError::NotFound {
                uri,
                pointer: Pointer::root(),
                reference: self.reference.clone(),
                site: self.location.clone(),
            },
            Unresolved::NotResolvable { pointer, reason } => LoadError::NotResolvable {
                uri,
                pointer,
                reference: self.reference.clone(),
                site: self.location.clone(),
                reason,
            },
        }
    }
}

/// A fetch that was requested but has not completed.
struct Waiting {
    /// Kind required of the whole resource, if a reference addresses it
    /// without a fragment.
    expected: Option<Kind>,
    /// Context of the first referencing site; `None` for the root.
    referrer: Option<Context>,
    /// Location of the first referencing site; `None` for the root.
    site: Option<Location>,
    pending: Vec<Pending>,
}

/// State of one `load` call, owned by the coordinating task.
struct Session<'l> {
    loader: &'l Loader,
    cancel: CancellationToken,
    graph: Graph,
    queue: VecDeque<Pending>,
    waiting: HashMap<Url, Waiting>,
    deferred: VecDeque<Url>,
    inflight: FuturesUnordered<InFlight>,
}

impl<'l> Session<'l> {
    fn new(loader: &'l Loader, cancel: CancellationToken) -> Self {
        Self {
            loader,
            cancel,
            graph: Graph::new(),
            queue: VecDeque::new(),
            waiting: HashMap::new(),
            deferred: VecDeque::new(),
            inflight: FuturesUnordered::new(),
        }
    }

    async fn run(mut self, root: &Url) -> Result<Graph, LoadError> {
        let cancelled = || LoadError::Cancelled { uri: root.clone() };
        if self.cancel.is_cancelled() {
            return Err(cancelled());
        }

        self.waiting.insert(
            root.clone(),
            Waiting {
                expected: Some(Kind::Document),
                referrer: None,
                site: None,
                pending: Vec::new(),
            },
        );
        self.schedule(root.clone());

        loop {
            while let Some(pending) = self.queue.pop_front() {
                self.advance(pending)?;
            }
            self.start_deferred();
            if self.inflight.is_empty() {
                break;
            }

            let completed = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => None,
                Some(done) = self.inflight.next() => Some(done),
            };
            let Some((uri, result)) = completed else {
                return Err(cancelled());
            };
            self.complete(uri, result)?;
        }

        if self.cancel.is_cancelled() {
            return Err(cancelled());
        }

        self.loader
            .validator
            .validate_graph(&self.graph)
            .map_err(|source| {
                rejected(root, None, &source);
                LoadError::GraphValidation {
                    uri: root.clone(),
                    source,
                }
            })?;
        Ok(self.graph)
    }

    /// Resolve from the graph, join a running fetch, or start one.
    fn advance(&mut self, pending: Pending) -> Result<(), LoadError> {
        let resource = without_fragment(&pending.target);
        if self.graph.contains(&resource) {
            return self.resolve(pending);
        }
        if let Some(waiting) = self.waiting.get_mut(&resource) {
            tracing::trace!(uri = %resource, "joined running fetch");
            waiting.pending.push(pending);
            return Ok(());
        }

        let addresses_whole = pending.target.fragment().unwrap_or_default().is_empty();
        self.waiting.insert(
            resource.clone(),
            Waiting {
                expected: addresses_whole.then_some(pending.expected),
                referrer: Some(pending.context.clone()),
                site: Some(pending.location.clone()),
                pending: vec![pending],
            },
        );
        self.schedule(resource);
        Ok(())
    }

    fn schedule(&mut self, uri: Url) {
        if self.inflight.len() < self.loader.config.max_concurrent_fetches() {
            self.start(uri);
        } else {
            self.deferred.push_back(uri);
        }
    }

    fn start_deferred(&mut self) {
        while self.inflight.len() < self.loader.config.max_concurrent_fetches() {
            let Some(uri) = self.deferred.pop_front() else {
                break;
            };
            self.start(uri);
        }
    }

    fn start(&mut self, uri: Url) {
        let fetch = Arc::clone(&self.loader.fetch);
        let cancel = self.cancel.clone();
        let expected = self.waiting.get(&uri).and_then(|waiting| waiting.expected);
        tracing::debug!(uri = %uri, expected = ?expected, "fetch started");

        self.inflight.push(
            async move {
                let result = fetch.fetch(&uri, expected, &cancel).await;
                (uri, result)
            }
            .boxed(),
        );
    }

    fn complete(&mut self, uri: Url, result: Result<Fetched, FetchError>) -> Result<(), LoadError> {
        let Some(waiting) = self.waiting.remove(&uri) else {
            return Ok(());
        };
        let fetched = result.map_err(|source| LoadError::Fetch {
            uri: uri.clone(),
            source,
        })?;
        tracing::debug!(uri = %uri, kind = %fetched.kind, bytes = fetched.bytes.len(), "fetch finished");

        self.ingest(&uri, fetched, &waiting)?;
        for pending in waiting.pending {
            self.resolve(pending)?;
        }
        Ok(())
    }

    /// Decode, infer, validate, parse and cache a fetched resource, then
    /// queue its references.
    fn ingest(&mut self, uri: &Url, fetched: Fetched, waiting: &Waiting) -> Result<(), LoadError> {
        if let Some(expected) = waiting.expected {
            if fetched.kind != expected {
                return Err(LoadError::Fetch {
                    uri: uri.clone(),
                    source: FetchError::KindMismatch {
                        expected,
                        actual: fetched.kind,
                    },
                });
            }
        }

        let kind = fetched.kind;
        let raw = codec::decode(&fetched.bytes).map_err(|e| LoadError::Decode {
            uri: uri.clone(),
            pointer: None,
            reason: e.to_string(),
        })?;

        let context = infer::infer(&raw, kind, waiting.referrer.as_ref(), &self.loader.config)
            .map_err(|e| LoadError::VersionDialect {
                uri: uri.clone(),
                reason: e.to_string(),
            })?;

        self.loader
            .validator
            .validate_structure(&raw, kind, &context)
            .map_err(|source| {
                rejected(uri, None, &source);
                LoadError::StructuralValidation {
                    uri: uri.clone(),
                    pointer: None,
                    source,
                }
            })?;

        let root = if kind == Kind::Fragment {
            None
        } else {
            let mut node =
                trellis_spec::decode(kind, raw.clone()).map_err(|e| LoadError::Decode {
                    uri: uri.clone(),
                    pointer: None,
                    reason: e.to_string(),
                })?;
            node.locate(match &waiting.site {
                Some(site) => site.with_resource(uri, Pointer::root()),
                None => Location::from_url(uri).map_err(|e| LoadError::Decode {
                    uri: uri.clone(),
                    pointer: None,
                    reason: e.to_string(),
                })?,
            });
            Some(node)
        };

        let id = self
            .graph
            .insert(Resource::new(uri, kind, context.clone(), raw, root));
        log_resource_cached!(uri = %uri, kind = %kind, context = %context, "resource cached");

        self.enqueue_references(id, None)
    }

    /// Queue the references below the resource root, or below an adopted
    /// fragment.
    fn enqueue_references(
        &mut self,
        id: ResourceId,
        fragment: Option<&Pointer>,
    ) -> Result<(), LoadError> {
        let Some(resource) = self.graph.resource(id) else {
            return Ok(());
        };
        // A node adopted at the root became the resource root.
        let fragment = fragment.filter(|pointer| !pointer.is_root());
        let node = match fragment {
            None => resource.root(),
            Some(pointer) => self.graph.node(&NodeId::new(id, pointer.clone())),
        };
        let Some(node) = node else {
            return Ok(());
        };

        // A `$schema` on the node itself is picked up by the walk.
        let mut found = Vec::new();
        collect_references(node, resource.context(), &mut found);
        let pending = found
            .into_iter()
            .map(|(reference, context)| Pending::from_reference(id, fragment, reference, context))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::trace!(resource = %id, references = pending.len(), "references queued");
        self.queue.extend(pending);
        Ok(())
    }

    fn resolve(&mut self, pending: Pending) -> Result<(), LoadError> {
        let target = match resolver::locate(&self.graph, &pending.target, pending.expected) {
            Ok(Resolution::Node(target)) => target,
            Ok(Resolution::Adopt { resource, pointer }) => self.adopt(&pending, resource, pointer)?,
            Err(unresolved) => return Err(pending.fail(unresolved)),
        };
        self.attach(&pending, target);
        Ok(())
    }

    /// Parse untyped data at `pointer` as the expected kind and store it in
    /// its resource.
    fn adopt(
        &mut self,
        pending: &Pending,
        id: ResourceId,
        pointer: Pointer,
    ) -> Result<Target, LoadError> {
        let expected = pending.expected;
        let resource = self.graph.resource(id).ok_or_else(|| pending.fail(Unresolved::Missing))?;
        let uri = resource.uri().clone();
        let raw = resource
            .raw_at(&pointer)
            .map_err(|_| pending.fail(Unresolved::NotFound { pointer: pointer.clone() }))?
            .clone();

        let context = infer::scope(&raw, expected, resource.context()).map_err(|e| {
            LoadError::VersionDialect {
                uri: uri.clone(),
                reason: e.to_string(),
            }
        })?;
        self.loader
            .validator
            .validate_structure(&raw, expected, &context)
            .map_err(|source| {
                rejected(&uri, Some(&pointer), &source);
                LoadError::StructuralValidation {
                    uri: uri.clone(),
                    pointer: Some(pointer.clone()),
                    source,
                }
            })?;

        let mut node = trellis_spec::decode(expected, raw).map_err(|e| LoadError::Decode {
            uri: uri.clone(),
            pointer: Some(pointer.clone()),
            reason: e.to_string(),
        })?;
        node.locate(pending.location.with_resource(&uri, pointer.clone()));
        let location = node.location().clone();

        self.graph.insert_fragment(id, pointer.clone(), node);
        tracing::debug!(uri = %uri, pointer = %pointer, kind = %expected, "fragment adopted");
        self.enqueue_references(id, Some(&pointer))?;

        Ok(Target {
            node: NodeId::new(id, pointer),
            kind: expected,
            location,
        })
    }

    /// Resolve the reference object through the entry point it was found
    /// under. Sites whose fragment was absorbed by a later adoption are
    /// looked up afresh.
    fn attach(&self, pending: &Pending, target: Target) {
        let site = self
            .graph
            .resource(pending.site.resource)
            .and_then(|resource| resource.node_within(pending.entry.as_ref(), &pending.site.pointer))
            .or_else(|| self.graph.node(&pending.site));
        match site.and_then(|node| node.reference()) {
            Some(reference) => {
                if reference.resolve(target) {
                    tracing::trace!(site = %pending.location, target = %pending.target, "reference resolved");
                }
            }
            None => {
                tracing::warn!(site = %pending.location, "reference site vanished from the graph");
            }
        }
    }
}

fn rejected(uri: &Url, pointer: Option<&Pointer>, error: &ValidationError) {
    let violations = error.violations().len() + error.graph_violations().len();
    match pointer {
        Some(pointer) => log_validation_failure!(
            uri = %uri,
            pointer = %pointer,
            violations,
            error = %error,
            "validation rejected a fragment"
        ),
        None => log_validation_failure!(uri = %uri, violations, error = %error, "validation rejected a resource"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use trellis_spec::model::{Document, Parameter, PathItem};
    use trellis_spec::{downcast, Component, Node};
    use trellis_validator::{NoopValidator, ValidatorFactory};

    /// Serves JSON values by URI and counts fetches.
    #[derive(Default)]
    struct Static {
        resources: HashMap<String, Value>,
        fetches: Mutex<HashMap<String, usize>>,
    }

    impl Static {
        fn with(mut self, uri: &str, value: Value) -> Self {
            self.resources.insert(uri.to_string(), value);
            self
        }

        fn count(&self, uri: &str) -> usize {
            self.fetches.lock().get(uri).copied().unwrap_or(0)
        }
    }

    #[async_trait]
    impl Fetch for Static {
        async fn fetch(
            &self,
            uri: &Url,
            expected: Option<Kind>,
            _cancel: &CancellationToken,
        ) -> Result<Fetched, FetchError> {
            *self.fetches.lock().entry(uri.to_string()).or_default() += 1;
            let value = self
                .resources
                .get(uri.as_str())
                .ok_or_else(|| FetchError::NotFound(uri.to_string()))?;
            Ok(Fetched::sniffed(value.to_string(), expected))
        }
    }

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    fn petstore() -> Static {
        Static::default()
            .with(
                "https://example.test/api.json",
                json!({
                    "openapi": "3.1.0",
                    "info": {"title": "Pets", "version": "1"},
                    "paths": {
                        "/pets/{id}": {
                            "parameters": [{"$ref": "#/components/parameters/Id"}],
                            "get": {
                                "operationId": "getPet",
                                "responses": {
                                    "200": {
                                        "description": "a pet",
                                        "content": {
                                            "application/json": {
                                                "schema": {"$ref": "schemas.json#/Pet"}
                                            }
                                        }
                                    }
                                }
                            }
                        }
                    },
                    "components": {
                        "parameters": {
                            "Id": {"name": "id", "in": "path", "required": true, "schema": {"type": "string"}}
                        }
                    }
                }),
            )
            .with(
                "https://example.test/schemas.json",
                json!({
                    "Pet": {"type": "object", "properties": {"owner": {"$ref": "#/Owner"}}},
                    "Owner": {"type": "object"}
                }),
            )
    }

    fn loader(fetch: Arc<Static>) -> Loader {
        Loader::new(fetch, Arc::new(NoopValidator))
    }

    #[tokio::test]
    async fn resolves_local_and_external_references() {
        let fetch = Arc::new(petstore());
        let validator = Arc::new(ValidatorFactory::new().build().unwrap());
        let loader = Loader::new(fetch.clone(), validator);

        let graph = loader.load(&url("https://example.test/api.json")).await.unwrap();

        assert_eq!(graph.len(), 2);
        assert!(graph.unresolved().is_empty());
        assert_eq!(graph.references().len(), 3);

        let document = graph.root_node().and_then(downcast::<Document>).unwrap();
        let item = document.paths.as_ref().unwrap().get("/pets/{id}").unwrap();
        let item = graph.resolve::<PathItem>(item).unwrap();
        let parameter: &Component<Parameter> = item.parameters.as_ref().unwrap().get(0).unwrap();
        let parameter = graph.resolve::<Parameter>(parameter).unwrap();
        assert_eq!(parameter.name, "id");
        assert_eq!(
            parameter.location().pointer().to_string(),
            "/components/parameters/Id"
        );

        let schemas = graph.by_uri(&url("https://example.test/schemas.json")).unwrap();
        assert_eq!(schemas.kind(), Kind::Fragment);
        let adopted: Vec<String> = schemas.fragments().map(|(p, _)| p.to_string()).collect();
        assert_eq!(adopted, ["/Owner", "/Pet"]);
    }

    #[tokio::test]
    async fn adopted_nodes_keep_the_first_document_pointer() {
        let fetch = Arc::new(petstore());
        let graph = loader(fetch).load(&url("https://example.test/api.json")).await.unwrap();

        let schemas = graph.by_uri(&url("https://example.test/schemas.json")).unwrap();
        let pet = graph
            .node(&NodeId::new(schemas.id(), Pointer::parse("/Pet").unwrap()))
            .unwrap();
        assert_eq!(pet.location().uri().as_str(), "https://example.test/schemas.json");
        assert_eq!(
            pet.location().document_pointer().to_string(),
            "/paths/~1pets~1{id}/get/responses/200/content/application~1json/schema"
        );
    }

    #[tokio::test]
    async fn completed_graphs_are_cached() {
        let fetch = Arc::new(petstore());
        let loader = loader(fetch.clone());
        let root = url("https://example.test/api.json");

        let first = loader.load(&root).await.unwrap();
        let second = loader.load(&root).await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(fetch.count("https://example.test/api.json"), 1);
        assert_eq!(fetch.count("https://example.test/schemas.json"), 1);

        assert!(loader.forget(&root));
        let third = loader.load(&root).await.unwrap();
        assert!(!Arc::ptr_eq(&first, &third));
        assert_eq!(fetch.count("https://example.test/api.json"), 2);
    }

    #[tokio::test]
    async fn missing_resource_fails_without_caching() {
        let fetch = Arc::new(Static::default().with(
            "https://example.test/api.json",
            json!({
                "openapi": "3.1.0",
                "info": {"title": "t", "version": "1"},
                "components": {"schemas": {"A": {"$ref": "missing.json"}}}
            }),
        ));
        let loader = loader(fetch);
        let root = url("https://example.test/api.json");

        let err = loader.load(&root).await.unwrap_err();
        assert!(matches!(
            err,
            LoadError::Fetch { source: FetchError::NotFound(_), .. }
        ));
        assert_eq!(err.uri().as_str(), "https://example.test/missing.json");
        assert!(loader.cached(&root).is_none());
    }

    #[tokio::test]
    async fn kind_mismatch_is_not_resolvable() {
        let fetch = Arc::new(Static::default().with(
            "https://example.test/api.json",
            json!({
                "openapi": "3.1.0",
                "info": {"title": "t", "version": "1"},
                "components": {
                    "schemas": {"A": {"$ref": "#/components/parameters/Id"}},
                    "parameters": {"Id": {"name": "id", "in": "query"}}
                }
            }),
        ));
        let err = loader(fetch)
            .load(&url("https://example.test/api.json"))
            .await
            .unwrap_err();
        match err {
            LoadError::NotResolvable { pointer, site, .. } => {
                assert_eq!(pointer.to_string(), "/components/parameters/Id");
                assert_eq!(site.pointer().to_string(), "/components/schemas/A");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn whole_resource_of_wrong_kind_is_a_fetch_error() {
        let fetch = Arc::new(
            Static::default()
                .with(
                    "https://example.test/api.json",
                    json!({
                        "openapi": "3.1.0",
                        "info": {"title": "t", "version": "1"},
                        "components": {"schemas": {"A": {"$ref": "other.json"}}}
                    }),
                )
                .with(
                    "https://example.test/other.json",
                    json!({"openapi": "3.1.0", "info": {"title": "o", "version": "1"}, "paths": {}}),
                ),
        );
        let err = loader(fetch)
            .load(&url("https://example.test/api.json"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LoadError::Fetch {
                source: FetchError::KindMismatch {
                    expected: Kind::Schema,
                    actual: Kind::Document
                },
                ..
            }
        ));
    }

    #[tokio::test]
    async fn structural_errors_abort_the_load() {
        let fetch = Arc::new(Static::default().with(
            "https://example.test/api.json",
            json!({
                "openapi": "3.1.0",
                "info": {"title": "t", "version": "1"},
                "components": {"parameters": {"Id": {"$ref": "params.json#/Bad"}}}
            }),
        ).with(
            "https://example.test/params.json",
            json!({"Bad": {"name": "id", "in": "body"}}),
        ));
        let validator = Arc::new(ValidatorFactory::new().build().unwrap());
        let err = Loader::new(fetch, validator)
            .load(&url("https://example.test/api.json"))
            .await
            .unwrap_err();
        assert!(matches!(err, LoadError::StructuralValidation { .. }));
        assert_eq!(err.pointer().map(ToString::to_string).as_deref(), Some("/Bad"));
    }

    #[tokio::test]
    async fn graph_rule_violations_abort_the_load() {
        let fetch = Arc::new(Static::default().with(
            "https://example.test/api.json",
            json!({
                "openapi": "3.1.0",
                "info": {"title": "t", "version": "1"},
                "paths": {
                    "/a": {"get": {"operationId": "same", "responses": {"200": {"description": "ok"}}}},
                    "/b": {"get": {"operationId": "same", "responses": {"200": {"description": "ok"}}}}
                }
            }),
        ));
        let validator = Arc::new(ValidatorFactory::new().build().unwrap());
        let root = url("https://example.test/api.json");
        let loader = Loader::new(fetch, validator);

        let err = loader.load(&root).await.unwrap_err();
        assert!(matches!(err, LoadError::GraphValidation { .. }));
        assert_eq!(err.code(), "E1317");
        assert!(loader.cached(&root).is_none());
    }

    #[tokio::test]
    async fn unknown_version_needs_a_default() {
        let fetch = Arc::new(Static::default().with(
            "https://example.test/api.json",
            json!({"info": {"title": "t", "version": "1"}, "paths": {}}),
        ));
        let root = url("https://example.test/api.json");

        let err = loader(fetch.clone()).load(&root).await.unwrap_err();
        assert!(matches!(err, LoadError::VersionDialect { .. }));

        let config = LoaderConfig::new().with_default_version(trellis_spec::SpecVersion::V3_0);
        let graph = loader(fetch).with_config(config).load(&root).await.unwrap();
        assert_eq!(
            graph.root().unwrap().context().version(),
            trellis_spec::SpecVersion::V3_0
        );
    }

    #[tokio::test]
    async fn cancelled_load_returns_cancelled() {
        let fetch = Arc::new(petstore());
        let cancel = CancellationToken::new();
        cancel.cancel();
        let root = url("https://example.test/api.json");
        let loader = loader(fetch.clone());

        let err = loader.load_with_cancel(&root, &cancel).await.unwrap_err();
        assert!(matches!(err, LoadError::Cancelled { .. }));
        assert_eq!(fetch.count("https://example.test/api.json"), 0);
        assert!(loader.cached(&root).is_none());
    }
}
