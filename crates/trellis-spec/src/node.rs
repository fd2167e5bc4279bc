//! The capability every addressable node satisfies, and the generic
//! JSON Pointer walk built on it.

use std::any::Any;
use std::fmt;

use serde_json::Value;
use thiserror::Error;

use crate::component::Reference;
use crate::kind::Kind;
use crate::location::Location;
use crate::pointer::{parse_index, Pointer};
use crate::version::Context;

/// An addressable node of the document graph.
///
/// Each kind answers [`Node::child`] for the tokens it can address, so the
/// pointer walk stays generic over kinds.
pub trait Node: Any + fmt::Debug + Send + Sync {
    /// The static kind tag. For components this is the expected kind even
    /// while the component holds a reference.
    fn kind(&self) -> Kind;

    fn location(&self) -> &Location;

    /// Attach `location` to this node and derived locations to every child.
    fn locate(&mut self, location: Location);

    /// Resolve one pointer token against this node.
    fn child(&self, token: &str) -> Lookup<'_>;

    /// Typed children in document order.
    fn children(&self) -> Vec<&dyn Node>;

    /// The reference held by this node, if it currently is a pointer.
    fn reference(&self) -> Option<&Reference> {
        None
    }

    /// A schema dialect declared on this node for its subtree.
    fn dialect(&self) -> Option<&str> {
        None
    }

    fn as_any(&self) -> &dyn Any;
}

impl<T: Node> Node for Box<T> {
    fn kind(&self) -> Kind {
        (**self).kind()
    }

    fn location(&self) -> &Location {
        (**self).location()
    }

    fn locate(&mut self, location: Location) {
        (**self).locate(location)
    }

    fn child(&self, token: &str) -> Lookup<'_> {
        (**self).child(token)
    }

    fn children(&self) -> Vec<&dyn Node> {
        (**self).children()
    }

    fn reference(&self) -> Option<&Reference> {
        (**self).reference()
    }

    fn dialect(&self) -> Option<&str> {
        (**self).dialect()
    }

    fn as_any(&self) -> &dyn Any {
        (**self).as_any()
    }
}

/// Outcome of a single-token lookup.
#[derive(Debug)]
pub enum Lookup<'a> {
    /// A typed child node.
    Node(&'a dyn Node),
    /// Untyped JSON (extensions, examples, raw keywords).
    Value(&'a Value),
    /// A typed scalar field (strings, booleans, numbers).
    Scalar,
    /// The slot is legal for this kind but absent in this instance.
    NotFound,
    /// This kind has no slot addressable by the token.
    NotResolvable,
}

/// Where a walk ended.
#[derive(Debug, Clone, Copy)]
pub enum Found<'a> {
    Node(&'a dyn Node),
    Value(&'a Value),
    Scalar,
}

impl<'a> Found<'a> {
    /// Kind of the node found; `None` for untyped values and scalars.
    pub fn kind(&self) -> Option<Kind> {
        match self {
            Found::Node(node) => Some(node.kind()),
            Found::Value(_) | Found::Scalar => None,
        }
    }

    pub fn node(&self) -> Option<&'a dyn Node> {
        match self {
            Found::Node(node) => Some(*node),
            _ => None,
        }
    }
}

/// Errors of a pointer walk. `at` is the pointer walked so far.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalkError {
    #[error("nothing at '{at}'")]
    NotFound { at: Pointer },

    #[error("'{token}' cannot address anything below '{at}'")]
    NotResolvable { at: Pointer, token: String },
}

/// Walk `pointer` from `start`. An empty pointer returns `start` itself.
///
/// References are not followed; a pointer running into a reference object
/// ends with `NotFound`.
pub fn walk<'a>(start: &'a dyn Node, pointer: &Pointer) -> Result<Found<'a>, WalkError> {
    let mut current = Found::Node(start);
    let mut walked = Pointer::root();

    for token in pointer.tokens() {
        let lookup = match current {
            Found::Node(node) => node.child(token),
            Found::Value(value) => value_child(value, token),
            Found::Scalar => Lookup::NotResolvable,
        };
        current = match lookup {
            Lookup::Node(node) => Found::Node(node),
            Lookup::Value(value) => Found::Value(value),
            Lookup::Scalar => Found::Scalar,
            Lookup::NotFound => {
                walked.push(token.clone());
                return Err(WalkError::NotFound { at: walked });
            }
            Lookup::NotResolvable => {
                return Err(WalkError::NotResolvable {
                    at: walked,
                    token: token.clone(),
                })
            }
        };
        walked.push(token.clone());
    }

    Ok(current)
}

/// Walk `pointer` through raw JSON.
pub fn walk_value<'a>(start: &'a Value, pointer: &Pointer) -> Result<&'a Value, WalkError> {
    let mut current = start;
    let mut walked = Pointer::root();

    for token in pointer.tokens() {
        match value_child(current, token) {
            Lookup::Value(value) => current = value,
            Lookup::NotFound => {
                walked.push(token.clone());
                return Err(WalkError::NotFound { at: walked });
            }
            _ => {
                return Err(WalkError::NotResolvable {
                    at: walked,
                    token: token.clone(),
                })
            }
        }
        walked.push(token.clone());
    }

    Ok(current)
}

/// One-token lookup into raw JSON.
pub fn value_child<'a>(value: &'a Value, token: &str) -> Lookup<'a> {
    match value {
        Value::Object(map) => map.get(token).map_or(Lookup::NotFound, Lookup::Value),
        Value::Array(items) => match parse_index(token) {
            Some(index) => items.get(index).map_or(Lookup::NotFound, Lookup::Value),
            None => Lookup::NotResolvable,
        },
        _ => Lookup::NotResolvable,
    }
}

/// Outgoing references below `node`, depth-first in document order, each
/// tagged with the context active where it was found. Recursion stops at
/// references.
pub fn collect_references<'a>(
    node: &'a dyn Node,
    context: &Context,
    out: &mut Vec<(&'a Reference, Context)>,
) {
    if let Some(reference) = node.reference() {
        out.push((reference, context.clone()));
        return;
    }

    match node.dialect() {
        Some(dialect) => {
            let scoped = context.with_dialect(dialect);
            for child in node.children() {
                collect_references(child, &scoped, out);
            }
        }
        None => {
            for child in node.children() {
                collect_references(child, context, out);
            }
        }
    }
}

/// All nodes below and including `node`, pre-order.
pub fn descendants(node: &dyn Node) -> Vec<&dyn Node> {
    let mut out = Vec::new();
    let mut stack = vec![node];
    while let Some(current) = stack.pop() {
        out.push(current);
        let mut children = current.children();
        children.reverse();
        stack.extend(children);
    }
    out
}

/// Downcast a node to a concrete object type.
pub fn downcast<T: Node>(node: &dyn Node) -> Option<&T> {
    node.as_any().downcast_ref::<T>()
}
