//! The polymorphic reference-or-object container.

use std::any::Any;
use std::sync::OnceLock;

use serde::de::{DeserializeOwned, Error as _};
use serde::ser::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map as JsonMap, Value};
use url::Url;

use crate::error::{ComponentError, DecodeError, LocationError};
use crate::graph::NodeId;
use crate::kind::Kind;
use crate::location::Location;
use crate::model::Extensions;
use crate::node::{Lookup, Node};

/// A concrete object kind that can sit inside a [`Component`].
pub trait Object: Node + Clone + Serialize + DeserializeOwned {
    const KIND: Kind;

    /// Keys that turn an object-shaped value into a reference.
    const REFERENCE_KEYS: &'static [&'static str] = &["$ref"];

    fn decode(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    fn encode(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

/// Where a resolved reference points.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Target {
    pub node: NodeId,
    pub kind: Kind,
    pub location: Location,
}

/// An unresolved-then-resolved pointer to another node.
#[derive(Debug, Clone)]
pub struct Reference {
    keyword: String,
    target: String,
    summary: Option<String>,
    description: Option<String>,
    siblings: Extensions,
    expected: Kind,
    location: Location,
    resolved: OnceLock<Target>,
}

impl Reference {
    /// A new unresolved `$ref` to `target`, expected to resolve to `expected`.
    pub fn new(target: impl Into<String>, expected: Kind) -> Self {
        Self {
            keyword: "$ref".to_string(),
            target: target.into(),
            summary: None,
            description: None,
            siblings: Extensions::new(),
            expected,
            location: Location::default(),
            resolved: OnceLock::new(),
        }
    }

    fn from_object(
        keyword: &str,
        target: String,
        mut object: JsonMap<String, Value>,
        expected: Kind,
    ) -> Self {
        object.remove(keyword);
        let mut take_text = |key: &str| match object.get(key) {
            Some(Value::String(_)) => object.remove(key).and_then(|v| v.as_str().map(String::from)),
            _ => None,
        };
        let summary = take_text("summary");
        let description = take_text("description");

        Self {
            keyword: keyword.to_string(),
            target,
            summary,
            description,
            siblings: object.into_iter().collect(),
            expected,
            location: Location::default(),
            resolved: OnceLock::new(),
        }
    }

    /// The reference string as written.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// `$ref` or `$dynamicRef`.
    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    pub fn is_dynamic(&self) -> bool {
        self.keyword == "$dynamicRef"
    }

    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Keys written next to the reference keyword other than summary/description.
    pub fn siblings(&self) -> &Extensions {
        &self.siblings
    }

    /// The kind this reference must resolve to.
    pub fn expected(&self) -> Kind {
        self.expected
    }

    /// Where the reference itself appears.
    pub fn location(&self) -> &Location {
        &self.location
    }

    /// The absolute target URI, resolved against the enclosing resource.
    pub fn target_url(&self) -> Result<Url, LocationError> {
        self.location
            .uri()
            .join(&self.target)
            .map_err(|e| LocationError::InvalidUri {
                uri: self.target.clone(),
                reason: e.to_string(),
            })
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved.get().is_some()
    }

    pub fn resolved(&self) -> Option<&Target> {
        self.resolved.get()
    }

    /// Attach the resolved target. Returns false if the reference was
    /// already resolved; the first target stays.
    pub fn resolve(&self, target: Target) -> bool {
        self.resolved.set(target).is_ok()
    }

    pub fn to_value(&self) -> Value {
        let mut object = JsonMap::new();
        object.insert(self.keyword.clone(), Value::String(self.target.clone()));
        if let Some(summary) = &self.summary {
            object.insert("summary".into(), Value::String(summary.clone()));
        }
        if let Some(description) = &self.description {
            object.insert("description".into(), Value::String(description.clone()));
        }
        for (key, value) in &self.siblings {
            object.insert(key.clone(), value.clone());
        }
        Value::Object(object)
    }
}

/// Either a reference or a concrete `T`. Exactly one is present.
#[derive(Debug, Clone)]
pub enum Component<T> {
    Reference(Reference),
    Object(T),
}

impl<T: Object> Component<T> {
    /// Decode a value: reference-shaped objects become references, anything
    /// else is decoded as `T`.
    pub fn from_value(value: Value) -> Result<Self, DecodeError> {
        if value.is_null() {
            return Err(DecodeError::Empty(T::KIND));
        }

        if let Value::Object(object) = &value {
            for keyword in T::REFERENCE_KEYS {
                match object.get(*keyword) {
                    Some(Value::String(target)) => {
                        let target = target.clone();
                        let Value::Object(object) = value else {
                            break;
                        };
                        return Ok(Component::Reference(Reference::from_object(
                            keyword, target, object, T::KIND,
                        )));
                    }
                    Some(_) => {
                        return Err(DecodeError::InvalidReference {
                            kind: T::KIND,
                            keyword: keyword.to_string(),
                        })
                    }
                    None => {}
                }
            }
        }

        T::decode(value)
            .map(Component::Object)
            .map_err(|source| DecodeError::Shape {
                kind: T::KIND,
                source,
            })
    }

    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        match self {
            Component::Reference(reference) => Ok(reference.to_value()),
            Component::Object(object) => object.encode(),
        }
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, Component::Reference(_))
    }

    /// The kind this component holds or is expected to resolve to.
    pub fn object_kind(&self) -> Kind {
        T::KIND
    }

    pub fn as_reference(&self) -> Option<&Reference> {
        match self {
            Component::Reference(reference) => Some(reference),
            Component::Object(_) => None,
        }
    }

    pub fn as_object(&self) -> Option<&T> {
        match self {
            Component::Object(object) => Some(object),
            Component::Reference(_) => None,
        }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut T> {
        match self {
            Component::Object(object) => Some(object),
            Component::Reference(_) => None,
        }
    }

    /// True for objects and for references with an attached target.
    pub fn is_resolved(&self) -> bool {
        match self {
            Component::Object(_) => true,
            Component::Reference(reference) => reference.is_resolved(),
        }
    }

    /// Turn this object into a reference to `target`. The detached object is
    /// returned, re-homed at the target address.
    pub fn make_reference(&mut self, target: &Url) -> Result<T, ComponentError> {
        if self.is_reference() {
            return Err(ComponentError::NotAnObject(T::KIND));
        }
        let site = self.location().clone();
        let target_location = site.with_uri(target)?;

        let mut reference = Reference::new(target.as_str(), T::KIND);
        reference.location = site;

        match std::mem::replace(self, Component::Reference(reference)) {
            Component::Object(mut object) => {
                object.locate(target_location);
                Ok(object)
            }
            previous @ Component::Reference(_) => {
                *self = previous;
                Err(ComponentError::NotAnObject(T::KIND))
            }
        }
    }

    /// Replace the current branch with `object`, located where this
    /// component is. Returns the reference that was replaced, if any.
    pub fn inline(&mut self, mut object: T) -> Option<Reference> {
        object.locate(self.location().clone());
        match std::mem::replace(self, Component::Object(object)) {
            Component::Reference(reference) => Some(reference),
            Component::Object(_) => None,
        }
    }
}

impl<T: Object> From<T> for Component<T> {
    fn from(object: T) -> Self {
        Component::Object(object)
    }
}

impl<T: Object> Node for Component<T> {
    fn kind(&self) -> Kind {
        T::KIND
    }

    fn location(&self) -> &Location {
        match self {
            Component::Reference(reference) => &reference.location,
            Component::Object(object) => object.location(),
        }
    }

    fn locate(&mut self, location: Location) {
        match self {
            Component::Reference(reference) => reference.location = location,
            Component::Object(object) => object.locate(location),
        }
    }

    fn child(&self, token: &str) -> Lookup<'_> {
        match self {
            Component::Object(object) => object.child(token),
            Component::Reference(reference) if token == reference.keyword => Lookup::Scalar,
            Component::Reference(_) => Lookup::NotFound,
        }
    }

    fn children(&self) -> Vec<&dyn Node> {
        match self {
            Component::Object(object) => object.children(),
            Component::Reference(_) => Vec::new(),
        }
    }

    fn reference(&self) -> Option<&Reference> {
        self.as_reference()
    }

    fn dialect(&self) -> Option<&str> {
        self.as_object().and_then(|object| object.dialect())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl<T: Object> Serialize for Component<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value()
            .map_err(S::Error::custom)?
            .serialize(serializer)
    }
}

impl<'de, T: Object> Deserialize<'de> for Component<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Component::from_value(value).map_err(D::Error::custom)
    }
}

/// View a node as `T`, whether it is a bare `T` or a component holding one.
pub fn object_of<T: Object>(node: &dyn Node) -> Option<&T> {
    let any = node.as_any();
    any.downcast_ref::<T>()
        .or_else(|| any.downcast_ref::<Component<T>>().and_then(Component::as_object))
}
