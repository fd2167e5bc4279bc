//! End-to-end loads against in-memory and on-disk descriptions.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::json;
use url::Url;

use trellis_loader::{CancellationToken, FetchError, LoadError, LoaderConfig};
use trellis_spec::model::Document;
use trellis_spec::{downcast, Kind, NodeId, Object, Pointer, SpecVersion};

use crate::{file_loader, fixture, permissive_loader, strict_loader, Failure, MemoryFetcher};

const BASE: &str = "https://example.test";

fn url(path: &str) -> Url {
    Url::parse(&format!("{}{}", BASE, path)).unwrap()
}

fn uri(path: &str) -> String {
    format!("{}{}", BASE, path)
}

fn diamond() -> MemoryFetcher {
    MemoryFetcher::new()
        .with_json(
            &uri("/a.json"),
            json!({
                "openapi": "3.1.0",
                "info": {"title": "A", "version": "1"},
                "components": {"schemas": {
                    "FromB": {"$ref": "b.json#/components/schemas/B"},
                    "FromC": {"$ref": "c.json#/components/schemas/C"}
                }}
            }),
        )
        .with_json(
            &uri("/b.json"),
            json!({
                "openapi": "3.1.0",
                "info": {"title": "B", "version": "1"},
                "components": {"schemas": {
                    "B": {"type": "object", "properties": {"c": {"$ref": "c.json#/components/schemas/C"}}}
                }}
            }),
        )
        .with_json(
            &uri("/c.json"),
            json!({
                "openapi": "3.1.0",
                "info": {"title": "C", "version": "1"},
                "components": {"schemas": {"C": {"type": "string"}}}
            }),
        )
}

#[tokio::test]
async fn diamond_fetches_shared_resource_once() {
    let fetch = Arc::new(diamond());
    let loader = strict_loader(fetch.clone(), LoaderConfig::default()).unwrap();

    let graph = loader.load(&url("/a.json")).await.unwrap();

    assert_eq!(graph.len(), 3);
    assert_eq!(fetch.fetches(&uri("/a.json")), 1);
    assert_eq!(fetch.fetches(&uri("/b.json")), 1);
    assert_eq!(fetch.fetches(&uri("/c.json")), 1);

    let into_c: Vec<_> = graph
        .references()
        .into_iter()
        .filter(|(reference, _)| reference.target().starts_with("c.json"))
        .map(|(reference, _)| reference.resolved().cloned().unwrap())
        .collect();
    assert_eq!(into_c.len(), 2);
    assert_eq!(into_c[0], into_c[1]);
    assert_eq!(into_c[0].node.pointer.to_string(), "/components/schemas/C");
}

#[tokio::test]
async fn every_reference_is_resolved_after_a_load() {
    let loader = file_loader().unwrap();
    let graph = loader.load(&fixture("petstore/openapi.yaml").unwrap()).await.unwrap();

    assert_eq!(graph.len(), 4);
    assert!(graph.unresolved().is_empty());
    let references = graph.references();
    assert_eq!(references.len(), 7);
    for (reference, _) in references {
        let target = reference.resolved().unwrap();
        assert_eq!(target.kind, reference.expected());
        assert!(graph.node(&target.node).is_some());
    }

    let common = graph
        .resources()
        .find(|resource| resource.uri().path().ends_with("/schemas/common.yaml"))
        .unwrap();
    assert_eq!(common.kind(), Kind::Fragment);
    assert_eq!(common.context().version(), SpecVersion::V3_1);
}

#[tokio::test]
async fn dynamic_reference_resolves_to_enclosing_schema() {
    let fetch = Arc::new(MemoryFetcher::new().with_json(
        &uri("/tree.json"),
        json!({
            "openapi": "3.1.0",
            "info": {"title": "Tree", "version": "1"},
            "components": {"schemas": {
                "Tree": {
                    "$dynamicAnchor": "node",
                    "type": "object",
                    "properties": {
                        "children": {"type": "array", "items": {"$dynamicRef": "#node"}}
                    }
                }
            }}
        }),
    ));
    let loader = strict_loader(fetch.clone(), LoaderConfig::default()).unwrap();

    let graph = loader.load(&url("/tree.json")).await.unwrap();

    let references = graph.references();
    assert_eq!(references.len(), 1);
    let (reference, _) = &references[0];
    assert!(reference.is_dynamic());
    let target = reference.resolved().unwrap();
    assert_eq!(target.node.pointer.to_string(), "/components/schemas/Tree");
    assert_eq!(Some(target.node.resource), graph.root_id());
    assert_eq!(fetch.total_fetches(), 1);
}

#[tokio::test]
async fn escaped_pointer_segments_address_path_items() {
    let fetch = Arc::new(MemoryFetcher::new().with_json(
        &uri("/api.json"),
        json!({
            "openapi": "3.1.0",
            "info": {"title": "Alias", "version": "1"},
            "paths": {
                "/foo/bar": {"get": {"responses": {"200": {"description": "ok"}}}},
                "/alias": {"$ref": "#/paths/~1foo~1bar"}
            }
        }),
    ));
    let loader = strict_loader(fetch, LoaderConfig::default()).unwrap();

    let graph = loader.load(&url("/api.json")).await.unwrap();

    let (reference, _) = &graph.references()[0];
    let target = reference.resolved().unwrap();
    assert_eq!(target.kind, Kind::PathItem);
    assert_eq!(target.node.pointer.tokens(), ["paths", "/foo/bar"]);
}

#[tokio::test]
async fn reference_to_the_wrong_kind_across_files_fails() {
    let fetch = Arc::new(
        MemoryFetcher::new()
            .with_json(
                &uri("/api.json"),
                json!({
                    "openapi": "3.1.0",
                    "info": {"title": "t", "version": "1"},
                    "components": {"schemas": {
                        "Limit": {"$ref": "shared.json#/components/parameters/Limit"}
                    }}
                }),
            )
            .with_json(
                &uri("/shared.json"),
                json!({
                    "openapi": "3.1.0",
                    "info": {"title": "shared", "version": "1"},
                    "components": {"parameters": {"Limit": {"name": "limit", "in": "query"}}}
                }),
            ),
    );
    let loader = strict_loader(fetch, LoaderConfig::default()).unwrap();

    let err = loader.load(&url("/api.json")).await.unwrap_err();
    match err {
        LoadError::NotResolvable { uri: target, pointer, site, .. } => {
            assert_eq!(target.as_str(), uri("/shared.json"));
            assert_eq!(pointer.to_string(), "/components/parameters/Limit");
            assert_eq!(site.pointer().to_string(), "/components/schemas/Limit");
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[tokio::test]
async fn serializing_keeps_references_as_written() {
    let loader = file_loader().unwrap();
    let graph = loader.load(&fixture("petstore/openapi.yaml").unwrap()).await.unwrap();

    let document = graph.root_node().and_then(downcast::<Document>).unwrap();
    let encoded = document.encode().unwrap();
    assert_eq!(encoded["paths"]["/pets"]["$ref"], "paths/pets.yaml");
    assert_eq!(
        encoded["paths"]["/pets/{petId}"]["get"]["parameters"][0]["$ref"],
        "#/components/parameters/PetId"
    );
    assert_eq!(
        encoded["components"]["responses"]["Error"]["content"]["application/json"]["schema"]
            ["$ref"],
        "schemas/common.yaml#/Error"
    );

    let decoded = trellis_spec::decode(Kind::Document, encoded.clone()).unwrap();
    let again = downcast::<Document>(decoded.as_ref()).unwrap().encode().unwrap();
    assert_eq!(again, encoded);
}

#[tokio::test]
async fn missing_resource_is_a_fetch_error() {
    let fetch = Arc::new(MemoryFetcher::new().with_json(
        &uri("/api.json"),
        json!({
            "openapi": "3.1.0",
            "info": {"title": "t", "version": "1"},
            "components": {"schemas": {"Gone": {"$ref": "gone.json"}}}
        }),
    ));
    let loader = permissive_loader(fetch.clone(), LoaderConfig::default());
    let root = url("/api.json");

    let err = loader.load(&root).await.unwrap_err();
    assert!(matches!(
        err,
        LoadError::Fetch { source: FetchError::NotFound(_), .. }
    ));
    assert_eq!(err.uri().as_str(), uri("/gone.json"));
    assert_eq!(err.code(), "E1311");
    assert!(loader.cached(&root).is_none());
}

#[tokio::test]
async fn injected_transport_failure_surfaces() {
    let fetch = Arc::new(
        diamond().with_failure(&uri("/c.json"), Failure::Http("503 Service Unavailable".into())),
    );
    let loader = permissive_loader(fetch, LoaderConfig::default());

    let err = loader.load(&url("/a.json")).await.unwrap_err();
    assert!(matches!(err, LoadError::Fetch { source: FetchError::Http(_), .. }));
}

#[tokio::test]
async fn fetches_never_exceed_the_configured_bound() {
    let mut schemas = serde_json::Map::new();
    let mut fetch = MemoryFetcher::new().with_latency(Duration::from_millis(20));
    for i in 0..6 {
        schemas.insert(format!("S{}", i), json!({"$ref": format!("s{}.json", i)}));
        fetch = fetch.with_json(&uri(&format!("/s{}.json", i)), json!({"type": "string"}));
    }
    let fetch = Arc::new(fetch.with_json(
        &uri("/api.json"),
        json!({
            "openapi": "3.1.0",
            "info": {"title": "t", "version": "1"},
            "components": {"schemas": schemas}
        }),
    ));
    let config = LoaderConfig::new().with_max_concurrent_fetches(2);
    let loader = strict_loader(fetch.clone(), config).unwrap();

    let graph = loader.load(&url("/api.json")).await.unwrap();

    assert_eq!(graph.len(), 7);
    assert_eq!(fetch.total_fetches(), 7);
    assert_eq!(fetch.peak_concurrency(), 2);
}

#[tokio::test]
async fn cancellation_stops_a_load_mid_fetch() {
    let fetch = Arc::new(diamond().with_latency(Duration::from_secs(60)));
    let loader = permissive_loader(fetch.clone(), LoaderConfig::default());
    let cancel = CancellationToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.cancel();
    });

    let started = Instant::now();
    let root = url("/a.json");
    let err = tokio::time::timeout(Duration::from_secs(5), loader.load_with_cancel(&root, &cancel))
        .await
        .unwrap()
        .unwrap_err();

    assert!(matches!(err, LoadError::Cancelled { .. }));
    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(fetch.total_fetches(), 1);
    assert!(loader.cached(&root).is_none());
}

#[tokio::test]
async fn fragments_inherit_the_referrer_version() {
    let fetch = Arc::new(
        MemoryFetcher::new()
            .with_text(
                &uri("/api.yaml"),
                "openapi: 3.0.3\n\
                 info: {title: legacy, version: '1'}\n\
                 paths: {}\n\
                 components:\n  schemas:\n    User: {$ref: 'defs.yaml#/User'}\n",
            )
            .with_text(&uri("/defs.yaml"), "User:\n  type: object\n  nullable: true\n"),
    );
    let loader = strict_loader(fetch, LoaderConfig::default()).unwrap();

    let graph = loader.load(&url("/api.yaml")).await.unwrap();

    let defs = graph.by_uri(&url("/defs.yaml")).unwrap();
    assert_eq!(defs.context().version(), SpecVersion::V3_0);
    assert_eq!(defs.fragments().count(), 1);
}

fn nested_then_enclosing(first: &str, second: &str) -> MemoryFetcher {
    MemoryFetcher::new()
        .with_json(
            &uri("/api.json"),
            json!({
                "openapi": "3.1.0",
                "info": {"title": "t", "version": "1"},
                "components": {"schemas": {
                    "First": {"$ref": first},
                    "Second": {"$ref": second}
                }}
            }),
        )
        .with_json(
            &uri("/defs.json"),
            json!({
                "Pet": {"type": "object", "properties": {"owner": {"$ref": "#/Owner"}}},
                "Owner": {"type": "object"}
            }),
        )
}

#[tokio::test]
async fn enclosing_fragment_adopted_after_a_nested_one_resolves_everything() {
    for loader in [
        strict_loader(
            Arc::new(nested_then_enclosing("defs.json#/Pet/properties/owner", "defs.json#/Pet")),
            LoaderConfig::default(),
        )
        .unwrap(),
        permissive_loader(
            Arc::new(nested_then_enclosing("defs.json#/Pet/properties/owner", "defs.json#/Pet")),
            LoaderConfig::default(),
        ),
    ] {
        let graph = loader.load(&url("/api.json")).await.unwrap();

        assert!(graph.unresolved().is_empty());
        let defs = graph.by_uri(&url("/defs.json")).unwrap();
        let adopted: Vec<String> = defs.fragments().map(|(p, _)| p.to_string()).collect();
        assert_eq!(adopted, ["/Owner", "/Pet"]);

        let owner = Pointer::parse("/Pet/properties/owner").unwrap();
        let through_pet = defs.node_within(Some(&Pointer::parse("/Pet").unwrap()), &owner);
        let found = graph.node(&NodeId::new(defs.id(), owner)).unwrap();
        assert!(std::ptr::addr_eq(through_pet.unwrap(), found));
        let target = found.reference().unwrap().resolved().unwrap();
        assert_eq!(target.node.pointer.to_string(), "/Owner");
    }
}

#[tokio::test]
async fn adoption_order_does_not_change_the_graph() {
    let shape = |first: &str, second: &str| {
        let first = first.to_string();
        let second = second.to_string();
        async move {
            let loader = strict_loader(
                Arc::new(nested_then_enclosing(&first, &second)),
                LoaderConfig::default(),
            )
            .unwrap();
            let graph = loader.load(&url("/api.json")).await.unwrap();
            assert!(graph.unresolved().is_empty());
            let defs = graph.by_uri(&url("/defs.json")).unwrap();
            let adopted: Vec<String> = defs.fragments().map(|(p, _)| p.to_string()).collect();
            (defs.kind(), adopted, graph.references().len())
        }
    };

    let nested_first = shape("defs.json#/Pet/properties/owner", "defs.json#/Pet").await;
    let enclosing_first = shape("defs.json#/Pet", "defs.json#/Pet/properties/owner").await;
    assert_eq!(nested_first, enclosing_first);
    assert_eq!(nested_first.0, Kind::Fragment);
}

#[tokio::test]
async fn whole_resource_reference_types_a_fragment_resource() {
    let fetch = Arc::new(
        MemoryFetcher::new()
            .with_json(
                &uri("/api.json"),
                json!({
                    "openapi": "3.1.0",
                    "info": {"title": "t", "version": "1"},
                    "components": {"schemas": {
                        "Name": {"$ref": "name.json#/properties/first"},
                        "Whole": {"$ref": "name.json"}
                    }}
                }),
            )
            .with_json(
                &uri("/name.json"),
                json!({"type": "object", "properties": {"first": {"type": "string"}}}),
            ),
    );
    let loader = strict_loader(fetch, LoaderConfig::default()).unwrap();

    let graph = loader.load(&url("/api.json")).await.unwrap();

    assert!(graph.unresolved().is_empty());
    let name = graph.by_uri(&url("/name.json")).unwrap();
    assert_eq!(name.kind(), Kind::Schema);
    assert!(name.root().is_some());
    assert_eq!(name.fragments().count(), 0);
}

#[tokio::test]
async fn zero_fetch_bound_still_loads_serially() {
    let fetch = Arc::new(diamond().with_latency(Duration::from_millis(5)));
    let config = LoaderConfig::new().with_max_concurrent_fetches(0);
    assert_eq!(config.max_concurrent_fetches(), 1);
    let loader = strict_loader(fetch.clone(), config).unwrap();

    let graph = loader.load(&url("/a.json")).await.unwrap();

    assert_eq!(graph.len(), 3);
    assert_eq!(fetch.total_fetches(), 3);
    assert_eq!(fetch.peak_concurrency(), 1);
}
