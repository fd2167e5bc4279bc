use thiserror::Error;

use crate::kind::Kind;
use crate::location::Location;
use crate::pointer::Pointer;

/// Errors produced while parsing JSON Pointers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PointerError {
    /// A non-empty pointer must start with `/`.
    #[error("E1101: JSON pointer must start with '/': {0}")]
    MissingLeadingSlash(String),

    /// `~` not followed by `0` or `1`.
    #[error("E1102: invalid '~' escape in JSON pointer: {0}")]
    InvalidEscape(String),

    /// Fragment was not valid percent-encoded UTF-8.
    #[error("E1103: invalid percent-encoding in fragment: {0}")]
    InvalidEncoding(String),
}

/// Errors produced while building locations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    /// The URI could not be parsed as an absolute URI.
    #[error("E1111: invalid absolute URI '{uri}': {reason}")]
    InvalidUri { uri: String, reason: String },

    /// The URI fragment is not a JSON pointer.
    #[error("E1112: fragment of '{uri}' is not a JSON pointer: {source}")]
    InvalidFragment {
        uri: String,
        #[source]
        source: PointerError,
    },
}

/// Errors produced while decoding JSON values into typed nodes.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// `null` where a value or a reference is required.
    #[error("E1121: empty value where {0} or a reference is required")]
    Empty(Kind),

    /// A reference keyword whose value is not a string.
    #[error("E1122: '{keyword}' must be a string in {kind}")]
    InvalidReference { kind: Kind, keyword: String },

    /// The value does not have the shape of the expected kind.
    #[error("E1123: invalid {kind}: {source}")]
    Shape {
        kind: Kind,
        #[source]
        source: serde_json::Error,
    },

    /// The kind cannot be decoded on its own (containers, fragments).
    #[error("E1124: {0} is not a decodable node kind")]
    NotDecodable(Kind),
}

/// Errors produced by in-place component conversions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComponentError {
    /// `make_reference` on a component that already is a reference.
    #[error("E1131: {0} component holds no object to convert into a reference")]
    NotAnObject(Kind),

    /// The new target address is not a valid location.
    #[error(transparent)]
    Location(#[from] LocationError),
}

/// Errors produced while following references through a loaded graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// A reference on the chain has no attached target.
    #[error("E1141: unresolved reference at {location}")]
    Unresolved { location: Location },

    /// The chain of references loops back on itself.
    #[error("E1142: reference cycle through {location}")]
    Cycle { location: Location },

    /// A target names a node the graph does not hold.
    #[error("E1143: no node at {uri}#{pointer}")]
    Dangling { uri: String, pointer: Pointer },

    /// The chain ends on a node of another kind.
    #[error("E1144: expected {expected}, found {found} at {location}")]
    WrongKind {
        expected: Kind,
        found: Kind,
        location: Location,
    },
}
