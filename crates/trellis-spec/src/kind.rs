use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Static kind tag of a node.
///
/// Every object kind the loader can decode has a tag; `Map`, `List` and
/// `Fragment` describe untyped containers and resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Kind {
    Document,
    Info,
    Server,
    Tag,
    Components,
    Paths,
    PathItem,
    Operation,
    Parameter,
    RequestBody,
    MediaType,
    Responses,
    Response,
    Header,
    Example,
    Link,
    Callback,
    Schema,
    SecurityScheme,
    /// Named collection of nodes.
    Map,
    /// Ordered collection of nodes.
    List,
    /// A resource with no declared kind; its contents are adopted on demand.
    Fragment,
}

impl Kind {
    pub const ALL: &'static [Kind] = &[
        Kind::Document,
        Kind::Info,
        Kind::Server,
        Kind::Tag,
        Kind::Components,
        Kind::Paths,
        Kind::PathItem,
        Kind::Operation,
        Kind::Parameter,
        Kind::RequestBody,
        Kind::MediaType,
        Kind::Responses,
        Kind::Response,
        Kind::Header,
        Kind::Example,
        Kind::Link,
        Kind::Callback,
        Kind::Schema,
        Kind::SecurityScheme,
        Kind::Map,
        Kind::List,
        Kind::Fragment,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Kind::Document => "document",
            Kind::Info => "info",
            Kind::Server => "server",
            Kind::Tag => "tag",
            Kind::Components => "components",
            Kind::Paths => "paths",
            Kind::PathItem => "pathItem",
            Kind::Operation => "operation",
            Kind::Parameter => "parameter",
            Kind::RequestBody => "requestBody",
            Kind::MediaType => "mediaType",
            Kind::Responses => "responses",
            Kind::Response => "response",
            Kind::Header => "header",
            Kind::Example => "example",
            Kind::Link => "link",
            Kind::Callback => "callback",
            Kind::Schema => "schema",
            Kind::SecurityScheme => "securityScheme",
            Kind::Map => "map",
            Kind::List => "list",
            Kind::Fragment => "fragment",
        }
    }

    /// Kinds that may appear as the target of a `$ref`.
    pub fn is_referenceable(self) -> bool {
        matches!(
            self,
            Kind::PathItem
                | Kind::Parameter
                | Kind::RequestBody
                | Kind::Response
                | Kind::Header
                | Kind::Example
                | Kind::Link
                | Kind::Callback
                | Kind::Schema
                | Kind::SecurityScheme
        )
    }

    /// Kinds whose references may use plain-name (anchor) fragments.
    pub fn allows_anchors(self) -> bool {
        matches!(self, Kind::Schema)
    }

    /// Kinds that a fetched resource may declare as its own root.
    pub fn is_resource_root(self) -> bool {
        self == Kind::Document || self == Kind::Fragment || self.is_referenceable()
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Kind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Kind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown node kind: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_round_trips_display() {
        for kind in Kind::ALL {
            assert_eq!(kind.to_string().parse::<Kind>().unwrap(), *kind);
        }
        assert_eq!("PATHITEM".parse::<Kind>().unwrap(), Kind::PathItem);
        assert!("widget".parse::<Kind>().is_err());
    }

    #[test]
    fn only_schemas_allow_anchors() {
        let anchored: Vec<_> = Kind::ALL.iter().filter(|k| k.allows_anchors()).collect();
        assert_eq!(anchored, [&Kind::Schema]);
    }

    #[test]
    fn containers_are_not_referenceable() {
        assert!(!Kind::Map.is_referenceable());
        assert!(!Kind::Document.is_referenceable());
        assert!(Kind::Document.is_resource_root());
        assert!(Kind::Schema.is_resource_root());
        assert!(!Kind::Operation.is_resource_root());
    }
}
