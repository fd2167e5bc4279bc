//! Document object model for OpenAPI descriptions spread over many files.
//!
//! This crate holds the pieces of the model that do not perform I/O:
//! - [`Location`] and [`Pointer`] for addressing nodes
//! - [`Component`] and [`Reference`] for reference-or-object slots
//! - the typed objects in [`model`]
//! - the [`Graph`] arena produced by a load
//!
//! Fetching, inference and resolution live in `trellis-loader`.

pub mod component;
pub mod decode;
pub mod error;
pub mod graph;
pub mod kind;
pub mod location;
pub mod model;
pub mod node;
pub mod pointer;
pub mod version;

pub use component::{object_of, Component, Object, Reference, Target};
pub use decode::decode;
pub use error::{ComponentError, DecodeError, GraphError, LocationError, PointerError};
pub use graph::{Anchor, Graph, NodeId, Resource, ResourceId};
pub use kind::Kind;
pub use location::{without_fragment, Location};
pub use node::{collect_references, descendants, downcast, walk, walk_value, Found, Lookup, Node, WalkError};
pub use pointer::Pointer;
pub use version::{Context, SpecVersion};
