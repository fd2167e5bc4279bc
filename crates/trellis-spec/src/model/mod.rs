//! Typed OpenAPI objects.
//!
//! Only the fields needed for addressing and reference discovery are typed.
//! Everything else is kept as raw JSON so documents round-trip.

mod document;
mod parameter;
mod paths;
mod schema;
mod security;

use std::any::Any;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map as JsonMap, Value};

use crate::kind::Kind;
use crate::location::Location;
use crate::node::{Lookup, Node};
use crate::pointer::parse_index;

pub use document::{Components, Document, Info, Server, Tag};
pub use parameter::{Header, Parameter};
pub use paths::{
    Callback, Example, Link, MediaType, Operation, PathItem, Paths, RequestBody, Response,
    Responses, HTTP_METHODS,
};
pub use schema::Schema;
pub use security::SecurityScheme;

/// Specification extensions (`x-*`) and other keys kept verbatim.
pub type Extensions = IndexMap<String, Value>;

/// A named collection of nodes (`components/schemas`, `content`, ...).
#[derive(Debug, Clone)]
pub struct Map<T> {
    entries: IndexMap<String, T>,
    location: Location,
}

impl<T> Default for Map<T> {
    fn default() -> Self {
        Self {
            entries: IndexMap::new(),
            location: Location::default(),
        }
    }
}

impl<T> Map<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&T> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut T> {
        self.entries.get_mut(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: T) -> Option<T> {
        self.entries.insert(key.into(), value)
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, String, T> {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T> FromIterator<(String, T)> for Map<T> {
    fn from_iter<I: IntoIterator<Item = (String, T)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
            location: Location::default(),
        }
    }
}

impl<'a, T> IntoIterator for &'a Map<T> {
    type Item = (&'a String, &'a T);
    type IntoIter = indexmap::map::Iter<'a, String, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl<T: Node> Node for Map<T> {
    fn kind(&self) -> Kind {
        Kind::Map
    }

    fn location(&self) -> &Location {
        &self.location
    }

    fn locate(&mut self, location: Location) {
        for (key, value) in self.entries.iter_mut() {
            value.locate(location.append(key.clone()));
        }
        self.location = location;
    }

    fn child(&self, token: &str) -> Lookup<'_> {
        match self.entries.get(token) {
            Some(node) => Lookup::Node(node),
            None => Lookup::NotFound,
        }
    }

    fn children(&self) -> Vec<&dyn Node> {
        self.entries.values().map(|node| node as &dyn Node).collect()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl<T: Serialize> Serialize for Map<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.entries.serialize(serializer)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Map<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        IndexMap::deserialize(deserializer).map(|entries| Self {
            entries,
            location: Location::default(),
        })
    }
}

/// An ordered collection of nodes (`parameters`, `allOf`, ...).
#[derive(Debug, Clone)]
pub struct List<T> {
    items: Vec<T>,
    location: Location,
}

impl<T> Default for List<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            location: Location::default(),
        }
    }
}

impl<T> List<T> {
    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T> From<Vec<T>> for List<T> {
    fn from(items: Vec<T>) -> Self {
        Self {
            items,
            location: Location::default(),
        }
    }
}

impl<'a, T> IntoIterator for &'a List<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<T: Node> Node for List<T> {
    fn kind(&self) -> Kind {
        Kind::List
    }

    fn location(&self) -> &Location {
        &self.location
    }

    fn locate(&mut self, location: Location) {
        for (index, item) in self.items.iter_mut().enumerate() {
            item.locate(location.append(index.to_string()));
        }
        self.location = location;
    }

    fn child(&self, token: &str) -> Lookup<'_> {
        let Some(index) = parse_index(token) else {
            return Lookup::NotResolvable;
        };
        match self.items.get(index) {
            Some(node) => Lookup::Node(node),
            None => Lookup::NotFound,
        }
    }

    fn children(&self) -> Vec<&dyn Node> {
        self.items.iter().map(|node| node as &dyn Node).collect()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl<T: Serialize> Serialize for List<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.items.serialize(serializer)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for List<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::deserialize(deserializer).map(List::from)
    }
}

// Helpers shared by the object impls.

/// Lookup of an optional typed field.
pub(crate) fn field<N: Node>(slot: &Option<N>) -> Lookup<'_> {
    match slot {
        Some(node) => Lookup::Node(node),
        None => Lookup::NotFound,
    }
}

/// Lookup of an optional scalar field.
pub(crate) fn scalar<T>(slot: &Option<T>) -> Lookup<'static> {
    if slot.is_some() {
        Lookup::Scalar
    } else {
        Lookup::NotFound
    }
}

/// Lookup of an optional untyped field.
pub(crate) fn raw(slot: &Option<Value>) -> Lookup<'_> {
    match slot {
        Some(value) => Lookup::Value(value),
        None => Lookup::NotFound,
    }
}

/// Fallback for tokens that are not fixed fields: extensions are reachable
/// as raw JSON, other names have no slot.
pub(crate) fn extension<'a>(extensions: &'a Extensions, token: &str) -> Lookup<'a> {
    match extensions.get(token) {
        Some(value) => Lookup::Value(value),
        None if token.starts_with("x-") => Lookup::NotFound,
        None => Lookup::NotResolvable,
    }
}

pub(crate) fn gather<'a, N: Node>(out: &mut Vec<&'a dyn Node>, slot: &'a Option<N>) {
    if let Some(node) = slot {
        out.push(node);
    }
}

pub(crate) fn place<N: Node>(slot: &mut Option<N>, parent: &Location, key: &str) {
    if let Some(node) = slot {
        node.locate(parent.append(key));
    }
}

/// Split a patterned object into its entries and its `x-` extensions.
pub(crate) fn split_extensions(object: JsonMap<String, Value>) -> (Vec<(String, Value)>, Extensions) {
    let mut entries = Vec::new();
    let mut extensions = Extensions::new();
    for (key, value) in object {
        if key.starts_with("x-") {
            extensions.insert(key, value);
        } else {
            entries.push((key, value));
        }
    }
    (entries, extensions)
}
