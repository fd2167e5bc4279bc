use std::any::Any;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{
    extension, field, gather, place, raw, scalar, Callback, Example, Extensions, Header, Link,
    List, Map, Parameter, PathItem, Paths, RequestBody, Response, Schema, SecurityScheme,
};
use crate::component::{Component, Object};
use crate::kind::Kind;
use crate::location::Location;
use crate::node::{Lookup, Node};

/// The root object of an OpenAPI description.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Empty when the version came from elsewhere.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub openapi: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<Info>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json_schema_dialect: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub servers: Option<List<Server>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paths: Option<Paths>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhooks: Option<Map<Component<PathItem>>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub components: Option<Components>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<List<Tag>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_docs: Option<Value>,

    #[serde(flatten)]
    pub extensions: Extensions,

    #[serde(skip)]
    pub(crate) location: Location,
}

impl Object for Document {
    const KIND: Kind = Kind::Document;
}

impl Node for Document {
    fn kind(&self) -> Kind {
        Kind::Document
    }

    fn location(&self) -> &Location {
        &self.location
    }

    fn locate(&mut self, location: Location) {
        place(&mut self.info, &location, "info");
        place(&mut self.servers, &location, "servers");
        place(&mut self.paths, &location, "paths");
        place(&mut self.webhooks, &location, "webhooks");
        place(&mut self.components, &location, "components");
        place(&mut self.tags, &location, "tags");
        self.location = location;
    }

    fn child(&self, token: &str) -> Lookup<'_> {
        match token {
            "openapi" => Lookup::Scalar,
            "info" => field(&self.info),
            "jsonSchemaDialect" => scalar(&self.json_schema_dialect),
            "servers" => field(&self.servers),
            "paths" => field(&self.paths),
            "webhooks" => field(&self.webhooks),
            "components" => field(&self.components),
            "security" => raw(&self.security),
            "tags" => field(&self.tags),
            "externalDocs" => raw(&self.external_docs),
            _ => extension(&self.extensions, token),
        }
    }

    fn children(&self) -> Vec<&dyn Node> {
        let mut out = Vec::new();
        gather(&mut out, &self.info);
        gather(&mut out, &self.servers);
        gather(&mut out, &self.paths);
        gather(&mut out, &self.webhooks);
        gather(&mut out, &self.components);
        gather(&mut out, &self.tags);
        out
    }

    fn dialect(&self) -> Option<&str> {
        self.json_schema_dialect.as_deref()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// API metadata. Every field is optional so that incomplete drafts still load.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Info {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terms_of_service: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<Value>,

    #[serde(flatten)]
    pub extensions: Extensions,

    #[serde(skip)]
    pub(crate) location: Location,
}

impl Object for Info {
    const KIND: Kind = Kind::Info;
}

impl Node for Info {
    fn kind(&self) -> Kind {
        Kind::Info
    }

    fn location(&self) -> &Location {
        &self.location
    }

    fn locate(&mut self, location: Location) {
        self.location = location;
    }

    fn child(&self, token: &str) -> Lookup<'_> {
        match token {
            "title" => scalar(&self.title),
            "version" => scalar(&self.version),
            "summary" => scalar(&self.summary),
            "description" => scalar(&self.description),
            "termsOfService" => scalar(&self.terms_of_service),
            "contact" => raw(&self.contact),
            "license" => raw(&self.license),
            _ => extension(&self.extensions, token),
        }
    }

    fn children(&self) -> Vec<&dyn Node> {
        Vec::new()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Server {
    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variables: Option<Value>,

    #[serde(flatten)]
    pub extensions: Extensions,

    #[serde(skip)]
    pub(crate) location: Location,
}

impl Object for Server {
    const KIND: Kind = Kind::Server;
}

impl Node for Server {
    fn kind(&self) -> Kind {
        Kind::Server
    }

    fn location(&self) -> &Location {
        &self.location
    }

    fn locate(&mut self, location: Location) {
        self.location = location;
    }

    fn child(&self, token: &str) -> Lookup<'_> {
        match token {
            "url" => Lookup::Scalar,
            "description" => scalar(&self.description),
            "name" => scalar(&self.name),
            "variables" => raw(&self.variables),
            _ => extension(&self.extensions, token),
        }
    }

    fn children(&self) -> Vec<&dyn Node> {
        Vec::new()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_docs: Option<Value>,

    #[serde(flatten)]
    pub extensions: Extensions,

    #[serde(skip)]
    pub(crate) location: Location,
}

impl Object for Tag {
    const KIND: Kind = Kind::Tag;
}

impl Node for Tag {
    fn kind(&self) -> Kind {
        Kind::Tag
    }

    fn location(&self) -> &Location {
        &self.location
    }

    fn locate(&mut self, location: Location) {
        self.location = location;
    }

    fn child(&self, token: &str) -> Lookup<'_> {
        match token {
            "name" => Lookup::Scalar,
            "summary" => scalar(&self.summary),
            "description" => scalar(&self.description),
            "parent" => scalar(&self.parent),
            "kind" => scalar(&self.kind),
            "externalDocs" => raw(&self.external_docs),
            _ => extension(&self.extensions, token),
        }
    }

    fn children(&self) -> Vec<&dyn Node> {
        Vec::new()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Reusable objects, addressed as `#/components/<section>/<name>`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Components {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schemas: Option<Map<Component<Schema>>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub responses: Option<Map<Component<Response>>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Map<Component<Parameter>>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub examples: Option<Map<Component<Example>>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_bodies: Option<Map<Component<RequestBody>>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<Map<Component<Header>>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_schemes: Option<Map<Component<SecurityScheme>>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Map<Component<Link>>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callbacks: Option<Map<Component<Callback>>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_items: Option<Map<Component<PathItem>>>,

    #[serde(flatten)]
    pub extensions: Extensions,

    #[serde(skip)]
    pub(crate) location: Location,
}

impl Object for Components {
    const KIND: Kind = Kind::Components;
}

impl Node for Components {
    fn kind(&self) -> Kind {
        Kind::Components
    }

    fn location(&self) -> &Location {
        &self.location
    }

    fn locate(&mut self, location: Location) {
        place(&mut self.schemas, &location, "schemas");
        place(&mut self.responses, &location, "responses");
        place(&mut self.parameters, &location, "parameters");
        place(&mut self.examples, &location, "examples");
        place(&mut self.request_bodies, &location, "requestBodies");
        place(&mut self.headers, &location, "headers");
        place(&mut self.security_schemes, &location, "securitySchemes");
        place(&mut self.links, &location, "links");
        place(&mut self.callbacks, &location, "callbacks");
        place(&mut self.path_items, &location, "pathItems");
        self.location = location;
    }

    fn child(&self, token: &str) -> Lookup<'_> {
        match token {
            "schemas" => field(&self.schemas),
            "responses" => field(&self.responses),
            "parameters" => field(&self.parameters),
            "examples" => field(&self.examples),
            "requestBodies" => field(&self.request_bodies),
            "headers" => field(&self.headers),
            "securitySchemes" => field(&self.security_schemes),
            "links" => field(&self.links),
            "callbacks" => field(&self.callbacks),
            "pathItems" => field(&self.path_items),
            _ => extension(&self.extensions, token),
        }
    }

    fn children(&self) -> Vec<&dyn Node> {
        let mut out = Vec::new();
        gather(&mut out, &self.schemas);
        gather(&mut out, &self.responses);
        gather(&mut out, &self.parameters);
        gather(&mut out, &self.examples);
        gather(&mut out, &self.request_bodies);
        gather(&mut out, &self.headers);
        gather(&mut out, &self.security_schemes);
        gather(&mut out, &self.links);
        gather(&mut out, &self.callbacks);
        gather(&mut out, &self.path_items);
        out
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
