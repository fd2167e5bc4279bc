//! Pointer and decoding benchmarks for the document model.
//!
//! Run with: cargo bench -p trellis-spec

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use serde_json::{json, Value};

use trellis_spec::{decode, walk, Kind, Location, Pointer};

/// A document with `count` paths, each with a parameter and a response schema.
fn create_document(count: usize) -> Value {
    let mut paths = serde_json::Map::new();
    for i in 0..count {
        paths.insert(
            format!("/resources{}/{{id}}", i),
            json!({
                "get": {
                    "operationId": format!("getResource{}", i),
                    "parameters": [{"$ref": "#/components/parameters/Id"}],
                    "responses": {
                        "200": {
                            "description": "ok",
                            "content": {
                                "application/json": {
                                    "schema": {
                                        "type": "object",
                                        "properties": {
                                            "id": {"type": "string"},
                                            "tags": {"type": "array", "items": {"type": "string"}}
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }),
        );
    }

    json!({
        "openapi": "3.1.0",
        "info": {"title": "Bench", "version": "1.0.0"},
        "paths": paths,
        "components": {
            "parameters": {
                "Id": {"name": "id", "in": "path", "required": true, "schema": {"type": "string"}}
            }
        }
    })
}

fn bench_pointer_parse(c: &mut Criterion) {
    let inputs = [
        ("short", "/components/schemas/Pet"),
        (
            "escaped",
            "/paths/~1resources0~1{id}/get/responses/200/content/application~1json/schema",
        ),
    ];

    let mut group = c.benchmark_group("pointer_parse");
    for (name, input) in inputs {
        group.bench_with_input(BenchmarkId::from_parameter(name), input, |b, input| {
            b.iter(|| black_box(Pointer::parse(input)));
        });
    }
    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_document");
    for count in [10, 100] {
        let value = create_document(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &value, |b, value| {
            b.iter(|| {
                let mut node = decode(Kind::Document, value.clone()).expect("document decodes");
                node.locate(Location::new("https://bench/api.json").expect("valid uri"));
                black_box(node)
            });
        });
    }
    group.finish();
}

fn bench_walk(c: &mut Criterion) {
    let mut node = decode(Kind::Document, create_document(100)).expect("document decodes");
    node.locate(Location::new("https://bench/api.json").expect("valid uri"));
    let pointer = Pointer::parse(
        "/paths/~1resources50~1{id}/get/responses/200/content/application~1json/schema/properties/tags/items",
    )
    .expect("valid pointer");

    c.bench_function("walk_deep_pointer", |b| {
        b.iter(|| black_box(walk(&*node, &pointer).is_ok()));
    });
}

criterion_group!(benches, bench_pointer_parse, bench_decode, bench_walk);
criterion_main!(benches);
