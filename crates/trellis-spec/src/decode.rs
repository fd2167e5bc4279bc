//! Kind-driven decoding of raw values into typed nodes.

use serde_json::Value;

use crate::component::{Component, Object};
use crate::error::DecodeError;
use crate::kind::Kind;
use crate::model::{
    Callback, Components, Document, Example, Header, Info, Link, MediaType, Operation, Parameter,
    PathItem, Paths, RequestBody, Response, Responses, Schema, SecurityScheme, Server, Tag,
};
use crate::node::Node;

fn object<T: Object>(value: Value) -> Result<Box<dyn Node>, DecodeError> {
    if value.is_null() {
        return Err(DecodeError::Empty(T::KIND));
    }
    T::decode(value)
        .map(|object| Box::new(object) as Box<dyn Node>)
        .map_err(|source| DecodeError::Shape {
            kind: T::KIND,
            source,
        })
}

fn component<T: Object>(value: Value) -> Result<Box<dyn Node>, DecodeError> {
    Component::<T>::from_value(value).map(|component| Box::new(component) as Box<dyn Node>)
}

/// Decode `value` as a node of `kind`.
///
/// Referenceable kinds decode to a [`Component`] so that a resource or
/// fragment consisting of a single `$ref` stays a reference. The returned
/// node is unlocated.
pub fn decode(kind: Kind, value: Value) -> Result<Box<dyn Node>, DecodeError> {
    match kind {
        Kind::Document => object::<Document>(value),
        Kind::Info => object::<Info>(value),
        Kind::Server => object::<Server>(value),
        Kind::Tag => object::<Tag>(value),
        Kind::Components => object::<Components>(value),
        Kind::Paths => object::<Paths>(value),
        Kind::Operation => object::<Operation>(value),
        Kind::MediaType => object::<MediaType>(value),
        Kind::Responses => object::<Responses>(value),
        Kind::PathItem => component::<PathItem>(value),
        Kind::Parameter => component::<Parameter>(value),
        Kind::RequestBody => component::<RequestBody>(value),
        Kind::Response => component::<Response>(value),
        Kind::Header => component::<Header>(value),
        Kind::Example => component::<Example>(value),
        Kind::Link => component::<Link>(value),
        Kind::Callback => component::<Callback>(value),
        Kind::Schema => component::<Schema>(value),
        Kind::SecurityScheme => component::<SecurityScheme>(value),
        Kind::Map | Kind::List | Kind::Fragment => Err(DecodeError::NotDecodable(kind)),
    }
}
