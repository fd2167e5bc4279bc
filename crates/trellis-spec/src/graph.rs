//! The loaded document graph.
//!
//! Resources live in an arena indexed by [`ResourceId`]. References point at
//! nodes through a [`NodeId`] lookup key, so cycles between resources need no
//! shared ownership.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

use serde_json::Value;
use url::Url;

use crate::component::{object_of, Object, Reference};
use crate::error::GraphError;
use crate::kind::Kind;
use crate::location::without_fragment;
use crate::node::{collect_references, walk, walk_value, Found, Node, WalkError};
use crate::pointer::Pointer;
use crate::version::Context;

/// Index of a resource in its graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(usize);

impl ResourceId {
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Stable key of a node: its resource and its pointer inside that resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    pub resource: ResourceId,
    pub pointer: Pointer,
}

impl NodeId {
    pub fn new(resource: ResourceId, pointer: Pointer) -> Self {
        Self { resource, pointer }
    }
}

/// A plain-name fragment declared inside a resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor {
    pub pointer: Pointer,
    /// Declared with `$dynamicAnchor` rather than `$anchor`.
    pub dynamic: bool,
}

/// One fetched and parsed document, cached under its absolute URI.
#[derive(Debug)]
pub struct Resource {
    id: ResourceId,
    uri: Url,
    kind: Kind,
    context: Context,
    raw: Value,
    root: Option<Box<dyn Node>>,
    fragments: BTreeMap<Pointer, Box<dyn Node>>,
    anchors: HashMap<String, Anchor>,
}

impl Resource {
    /// A resource with a typed root. `Fragment` resources pass `None` and
    /// have their contents adopted on demand.
    pub fn new(
        uri: &Url,
        kind: Kind,
        context: Context,
        raw: Value,
        root: Option<Box<dyn Node>>,
    ) -> Self {
        let anchors = scan_anchors(&raw);
        Self {
            id: ResourceId::new(0),
            uri: without_fragment(uri),
            kind,
            context,
            raw,
            root,
            fragments: BTreeMap::new(),
            anchors,
        }
    }

    pub fn id(&self) -> ResourceId {
        self.id
    }

    /// Absolute URI, without fragment.
    pub fn uri(&self) -> &Url {
        &self.uri
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    /// The decoded value as fetched.
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    pub fn root(&self) -> Option<&dyn Node> {
        self.root.as_deref()
    }

    /// Nodes adopted from untyped data, keyed by pointer.
    pub fn fragments(&self) -> impl Iterator<Item = (&Pointer, &dyn Node)> {
        self.fragments.iter().map(|(pointer, node)| (pointer, &**node))
    }

    /// Typed entry points: the root and every adopted fragment.
    pub fn entry_points(&self) -> Vec<&dyn Node> {
        self.root
            .as_deref()
            .into_iter()
            .chain(self.fragments.values().map(|node| &**node))
            .collect()
    }

    pub fn anchor(&self, name: &str) -> Option<&Anchor> {
        self.anchors.get(name)
    }

    pub fn anchors(&self) -> impl Iterator<Item = (&str, &Anchor)> {
        self.anchors.iter().map(|(name, anchor)| (name.as_str(), anchor))
    }

    /// Locate `pointer` inside this resource.
    ///
    /// Adopted fragments take precedence over the typed root, the deepest
    /// one first. Pointers into a resource without typed root walk the raw
    /// value.
    pub fn find(&self, pointer: &Pointer) -> Result<Found<'_>, WalkError> {
        let fragment = self
            .fragments
            .iter()
            .filter(|(prefix, _)| pointer.starts_with(prefix))
            .max_by_key(|(prefix, _)| prefix.len());

        if let Some((prefix, node)) = fragment {
            let rest = pointer.strip_prefix(prefix).unwrap_or_default();
            return walk(&**node, &rest).map_err(|e| rebase(e, prefix));
        }

        match &self.root {
            Some(root) => walk(&**root, pointer),
            None => walk_value(&self.raw, pointer).map(Found::Value),
        }
    }

    /// The typed node at `pointer`, reached from the entry point at `entry`
    /// (the root when `None`) instead of the deepest fragment.
    pub fn node_within(&self, entry: Option<&Pointer>, pointer: &Pointer) -> Option<&dyn Node> {
        let (start, rest) = match entry {
            None => (self.root.as_deref()?, pointer.clone()),
            Some(prefix) => (&**self.fragments.get(prefix)?, pointer.strip_prefix(prefix)?),
        };
        walk(start, &rest).ok()?.node()
    }

    /// The raw value at `pointer`.
    pub fn raw_at(&self, pointer: &Pointer) -> Result<&Value, WalkError> {
        walk_value(&self.raw, pointer)
    }

    /// Drop fragments below `pointer` that `node` types with the same kind.
    fn absorb_below(&mut self, pointer: &Pointer, node: &dyn Node) -> Vec<Pointer> {
        let absorbed: Vec<Pointer> = self
            .fragments
            .iter()
            .filter(|(existing, _)| existing.len() > pointer.len() && existing.starts_with(pointer))
            .filter(|(existing, old)| {
                let rest = existing.strip_prefix(pointer).unwrap_or_default();
                matches!(walk(node, &rest), Ok(Found::Node(found)) if found.kind() == old.kind())
            })
            .map(|(existing, _)| existing.clone())
            .collect();
        for existing in &absorbed {
            self.fragments.remove(existing);
        }
        absorbed
    }
}

fn rebase(error: WalkError, prefix: &Pointer) -> WalkError {
    match error {
        WalkError::NotFound { at } => WalkError::NotFound {
            at: prefix.concat(&at),
        },
        WalkError::NotResolvable { at, token } => WalkError::NotResolvable {
            at: prefix.concat(&at),
            token,
        },
    }
}

/// Index `$anchor` and `$dynamicAnchor` declarations, first one wins.
fn scan_anchors(raw: &Value) -> HashMap<String, Anchor> {
    let mut anchors = HashMap::new();
    let mut stack = vec![(raw, Pointer::root())];

    while let Some((value, pointer)) = stack.pop() {
        match value {
            Value::Object(object) => {
                for (keyword, dynamic) in [("$anchor", false), ("$dynamicAnchor", true)] {
                    if let Some(Value::String(name)) = object.get(keyword) {
                        anchors.entry(name.clone()).or_insert_with(|| Anchor {
                            pointer: pointer.clone(),
                            dynamic,
                        });
                    }
                }
                // Reverse so that the stack pops in document order.
                for (key, child) in object.iter().rev() {
                    if matches!(key.as_str(), "enum" | "const" | "example" | "examples" | "default") {
                        continue;
                    }
                    stack.push((child, pointer.join(key.clone())));
                }
            }
            Value::Array(items) => {
                for (index, child) in items.iter().enumerate().rev() {
                    stack.push((child, pointer.join(index.to_string())));
                }
            }
            _ => {}
        }
    }

    anchors
}

/// All resources of one load, with the root document first.
#[derive(Debug, Default)]
pub struct Graph {
    resources: Vec<Resource>,
    index: HashMap<Url, ResourceId>,
    root: Option<ResourceId>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a resource. A URI already present keeps its first resource and
    /// the existing id is returned.
    pub fn insert(&mut self, mut resource: Resource) -> ResourceId {
        if let Some(id) = self.index.get(&resource.uri) {
            return *id;
        }
        let id = ResourceId::new(self.resources.len());
        resource.id = id;
        self.index.insert(resource.uri.clone(), id);
        self.resources.push(resource);
        if self.root.is_none() {
            self.root = Some(id);
        }
        id
    }

    /// Store a node adopted from untyped data. Returns false if a node was
    /// already adopted at that pointer.
    ///
    /// Fragments adopted earlier below `pointer` are replaced by their copy
    /// inside `node` when it types them with the same kind, so a pointer has
    /// one typed node whatever order the references arrived in. A node
    /// adopted at the root of an untyped resource becomes its root and sets
    /// its kind.
    pub fn insert_fragment(&mut self, id: ResourceId, pointer: Pointer, node: Box<dyn Node>) -> bool {
        let Some(resource) = self.resources.get_mut(id.index()) else {
            return false;
        };
        if resource.fragments.contains_key(&pointer) {
            return false;
        }
        if pointer.is_root() && resource.root.is_some() {
            return false;
        }

        resource.absorb_below(&pointer, &*node);
        if pointer.is_root() {
            resource.kind = node.kind();
            resource.root = Some(node);
        } else {
            resource.fragments.insert(pointer, node);
        }
        true
    }

    pub fn root_id(&self) -> Option<ResourceId> {
        self.root
    }

    pub fn root(&self) -> Option<&Resource> {
        self.root.and_then(|id| self.resource(id))
    }

    /// The root document node.
    pub fn root_node(&self) -> Option<&dyn Node> {
        self.root().and_then(Resource::root)
    }

    pub fn resource(&self, id: ResourceId) -> Option<&Resource> {
        self.resources.get(id.index())
    }

    /// The resource cached for `uri`; any fragment is ignored.
    pub fn by_uri(&self, uri: &Url) -> Option<&Resource> {
        self.index
            .get(&without_fragment(uri))
            .and_then(|id| self.resource(*id))
    }

    pub fn contains(&self, uri: &Url) -> bool {
        self.index.contains_key(&without_fragment(uri))
    }

    pub fn resources(&self) -> impl Iterator<Item = &Resource> {
        self.resources.iter()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// The typed node with this id, if any.
    pub fn node(&self, id: &NodeId) -> Option<&dyn Node> {
        self.resource(id.resource)?.find(&id.pointer).ok()?.node()
    }

    /// Every reference in the graph with the context active at its site,
    /// resource by resource in document order.
    pub fn references(&self) -> Vec<(&Reference, Context)> {
        let mut out = Vec::new();
        for resource in &self.resources {
            for node in resource.entry_points() {
                collect_references(node, resource.context(), &mut out);
            }
        }
        out
    }

    pub fn unresolved(&self) -> Vec<&Reference> {
        self.references()
            .into_iter()
            .map(|(reference, _)| reference)
            .filter(|reference| !reference.is_resolved())
            .collect()
    }

    /// Follow references from `node` until a non-reference node is reached.
    pub fn follow<'a>(&'a self, node: &'a dyn Node) -> Result<&'a dyn Node, GraphError> {
        let mut current = node;
        let mut seen = HashSet::new();

        while let Some(reference) = current.reference() {
            let target = reference.resolved().ok_or_else(|| GraphError::Unresolved {
                location: reference.location().clone(),
            })?;
            if !seen.insert(target.node.clone()) {
                return Err(GraphError::Cycle {
                    location: reference.location().clone(),
                });
            }
            current = self.node(&target.node).ok_or_else(|| GraphError::Dangling {
                uri: target.location.uri().to_string(),
                pointer: target.node.pointer.clone(),
            })?;
        }

        Ok(current)
    }

    /// Follow a component to the object it finally denotes.
    pub fn resolve<'a, T: Object>(&'a self, node: &'a dyn Node) -> Result<&'a T, GraphError> {
        let found = self.follow(node)?;
        object_of::<T>(found).ok_or_else(|| GraphError::WrongKind {
            expected: T::KIND,
            found: found.kind(),
            location: found.location().clone(),
        })
    }
}
