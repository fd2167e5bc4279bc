//! Locating reference targets inside cached resources.

use percent_encoding::percent_decode_str;
use url::Url;

use trellis_spec::{Found, Graph, Kind, NodeId, Pointer, ResourceId, Target, WalkError};

/// Where a target fragment leads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// A typed node of the expected kind.
    Node(Target),
    /// Untyped data that has to be adopted as the expected kind.
    Adopt {
        resource: ResourceId,
        pointer: Pointer,
    },
}

/// Why a target could not be located.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unresolved {
    /// The resource was never cached. The loader fetches before resolving,
    /// so this only shows up when resolving against a foreign graph.
    Missing,
    NotFound { pointer: Pointer },
    NotResolvable { pointer: Pointer, reason: String },
}

/// Locate `target` (an absolute URI, fragment included) in `graph` as a
/// node of kind `expected`.
pub fn locate(graph: &Graph, target: &Url, expected: Kind) -> Result<Resolution, Unresolved> {
    let resource = graph.by_uri(target).ok_or(Unresolved::Missing)?;
    let fragment = target.fragment().unwrap_or_default();

    let pointer = if Pointer::is_pointer_fragment(fragment) {
        Pointer::from_fragment(fragment).map_err(|e| Unresolved::NotResolvable {
            pointer: Pointer::root(),
            reason: e.to_string(),
        })?
    } else {
        let name = percent_decode_str(fragment).decode_utf8_lossy();
        if !expected.allows_anchors() {
            return Err(Unresolved::NotResolvable {
                pointer: Pointer::root(),
                reason: format!("plain-name fragment '{}' cannot address a {}", name, expected),
            });
        }
        match resource.anchor(&name) {
            Some(anchor) => anchor.pointer.clone(),
            None => {
                return Err(Unresolved::NotFound {
                    pointer: Pointer::root(),
                })
            }
        }
    };

    let found = resource.find(&pointer).map_err(|e| match e {
        WalkError::NotFound { at } => Unresolved::NotFound { pointer: at },
        WalkError::NotResolvable { at, token } => Unresolved::NotResolvable {
            reason: format!("'{}' cannot address anything below '{}'", token, at),
            pointer: at,
        },
    })?;

    match found {
        Found::Node(node) if node.kind() == expected => Ok(Resolution::Node(Target {
            node: NodeId::new(resource.id(), pointer),
            kind: expected,
            location: node.location().clone(),
        })),
        Found::Node(node) => Err(Unresolved::NotResolvable {
            reason: format!("expected a {}, found a {}", expected, node.kind()),
            pointer,
        }),
        Found::Value(_) => Ok(Resolution::Adopt {
            resource: resource.id(),
            pointer,
        }),
        Found::Scalar => Err(Unresolved::NotResolvable {
            reason: format!("expected a {}, found a scalar field", expected),
            pointer,
        }),
    }
}
