use std::any::Any;

use indexmap::IndexMap;
use serde::de::Error as _;
use serde::ser::{Error as _, SerializeMap};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map as JsonMap, Value};

use super::{
    extension, field, gather, place, raw, scalar, split_extensions, Extensions, Header, List, Map,
    Parameter, Schema, Server,
};
use crate::component::{Component, Object};
use crate::kind::Kind;
use crate::location::Location;
use crate::node::{Lookup, Node};

/// HTTP methods with a fixed field on the Path Item Object (OpenAPI 3.2 adds `query`).
pub const HTTP_METHODS: &[&str] = &[
    "get", "put", "post", "delete", "options", "head", "patch", "trace", "query",
];

/// Decode the entries of a patterned object, keeping `x-` keys aside.
fn decode_patterned<T: Object, E: serde::de::Error>(
    entries: Vec<(String, Value)>,
) -> Result<IndexMap<String, Component<T>>, E> {
    entries
        .into_iter()
        .map(|(key, value)| {
            Component::from_value(value)
                .map(|component| (key.clone(), component))
                .map_err(|e| E::custom(format!("{}: {}", key, e)))
        })
        .collect()
}

fn encode_patterned<S: Serializer, T: Object>(
    serializer: S,
    leading: Option<(&str, &Component<T>)>,
    entries: &IndexMap<String, Component<T>>,
    extensions: &Extensions,
) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(None)?;
    if let Some((key, component)) = leading {
        map.serialize_entry(key, component)?;
    }
    for (key, component) in entries {
        map.serialize_entry(key, component)?;
    }
    for (key, value) in extensions {
        map.serialize_entry(key, value)?;
    }
    map.end()
}

fn json_object<'de, D: Deserializer<'de>>(deserializer: D) -> Result<JsonMap<String, Value>, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Object(object) => Ok(object),
        other => Err(D::Error::custom(format!("expected an object, found {}", other))),
    }
}

/// The `paths` object: path templates to Path Items.
#[derive(Debug, Clone, Default)]
pub struct Paths {
    pub paths: IndexMap<String, Component<PathItem>>,
    pub extensions: Extensions,
    location: Location,
}

impl Paths {
    pub fn get(&self, template: &str) -> Option<&Component<PathItem>> {
        self.paths.get(template)
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, String, Component<PathItem>> {
        self.paths.iter()
    }
}

impl Object for Paths {
    const KIND: Kind = Kind::Paths;
}

impl Node for Paths {
    fn kind(&self) -> Kind {
        Kind::Paths
    }

    fn location(&self) -> &Location {
        &self.location
    }

    fn locate(&mut self, location: Location) {
        for (template, item) in self.paths.iter_mut() {
            item.locate(location.append(template.clone()));
        }
        self.location = location;
    }

    fn child(&self, token: &str) -> Lookup<'_> {
        match self.paths.get(token) {
            Some(item) => Lookup::Node(item),
            None if token.starts_with('/') => Lookup::NotFound,
            None => extension(&self.extensions, token),
        }
    }

    fn children(&self) -> Vec<&dyn Node> {
        self.paths.values().map(|item| item as &dyn Node).collect()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Serialize for Paths {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        encode_patterned(serializer, None, &self.paths, &self.extensions)
    }
}

impl<'de> Deserialize<'de> for Paths {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (entries, extensions) = split_extensions(json_object(deserializer)?);
        Ok(Self {
            paths: decode_patterned::<_, D::Error>(entries)?,
            extensions,
            location: Location::default(),
        })
    }
}

/// Operations available on a single path.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub get: Option<Operation>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub put: Option<Operation>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post: Option<Operation>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete: Option<Operation>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Operation>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head: Option<Operation>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patch: Option<Operation>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<Operation>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<Operation>,

    /// Operations for methods without a fixed field (OpenAPI 3.2).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_operations: Option<Map<Operation>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub servers: Option<List<Server>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<List<Component<Parameter>>>,

    #[serde(flatten)]
    pub extensions: Extensions,

    #[serde(skip)]
    pub(crate) location: Location,
}

impl PathItem {
    fn method(&self, method: &str) -> Option<&Option<Operation>> {
        Some(match method {
            "get" => &self.get,
            "put" => &self.put,
            "post" => &self.post,
            "delete" => &self.delete,
            "options" => &self.options,
            "head" => &self.head,
            "patch" => &self.patch,
            "trace" => &self.trace,
            "query" => &self.query,
            _ => return None,
        })
    }

    fn method_mut(&mut self, method: &str) -> Option<&mut Option<Operation>> {
        Some(match method {
            "get" => &mut self.get,
            "put" => &mut self.put,
            "post" => &mut self.post,
            "delete" => &mut self.delete,
            "options" => &mut self.options,
            "head" => &mut self.head,
            "patch" => &mut self.patch,
            "trace" => &mut self.trace,
            "query" => &mut self.query,
            _ => return None,
        })
    }

    /// All operations with their upper-case method names, fixed fields first.
    pub fn operations(&self) -> Vec<(String, &Operation)> {
        let mut out = Vec::new();
        for method in HTTP_METHODS {
            if let Some(Some(operation)) = self.method(method) {
                out.push((method.to_uppercase(), operation));
            }
        }
        if let Some(additional) = &self.additional_operations {
            for (method, operation) in additional {
                out.push((method.to_uppercase(), operation));
            }
        }
        out
    }
}

impl Object for PathItem {
    const KIND: Kind = Kind::PathItem;
}

impl Node for PathItem {
    fn kind(&self) -> Kind {
        Kind::PathItem
    }

    fn location(&self) -> &Location {
        &self.location
    }

    fn locate(&mut self, location: Location) {
        for method in HTTP_METHODS {
            if let Some(slot) = self.method_mut(method) {
                place(slot, &location, method);
            }
        }
        place(&mut self.additional_operations, &location, "additionalOperations");
        place(&mut self.servers, &location, "servers");
        place(&mut self.parameters, &location, "parameters");
        self.location = location;
    }

    fn child(&self, token: &str) -> Lookup<'_> {
        if let Some(slot) = self.method(token) {
            return field(slot);
        }
        match token {
            "summary" => scalar(&self.summary),
            "description" => scalar(&self.description),
            "additionalOperations" => field(&self.additional_operations),
            "servers" => field(&self.servers),
            "parameters" => field(&self.parameters),
            _ => extension(&self.extensions, token),
        }
    }

    fn children(&self) -> Vec<&dyn Node> {
        let mut out = Vec::new();
        for method in HTTP_METHODS {
            if let Some(slot) = self.method(method) {
                gather(&mut out, slot);
            }
        }
        gather(&mut out, &self.additional_operations);
        gather(&mut out, &self.servers);
        gather(&mut out, &self.parameters);
        out
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_docs: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<List<Component<Parameter>>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_body: Option<Component<RequestBody>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub responses: Option<Responses>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callbacks: Option<Map<Component<Callback>>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub servers: Option<List<Server>>,

    #[serde(flatten)]
    pub extensions: Extensions,

    #[serde(skip)]
    pub(crate) location: Location,
}

impl Object for Operation {
    const KIND: Kind = Kind::Operation;
}

impl Node for Operation {
    fn kind(&self) -> Kind {
        Kind::Operation
    }

    fn location(&self) -> &Location {
        &self.location
    }

    fn locate(&mut self, location: Location) {
        place(&mut self.parameters, &location, "parameters");
        place(&mut self.request_body, &location, "requestBody");
        place(&mut self.responses, &location, "responses");
        place(&mut self.callbacks, &location, "callbacks");
        place(&mut self.servers, &location, "servers");
        self.location = location;
    }

    fn child(&self, token: &str) -> Lookup<'_> {
        match token {
            "tags" => scalar(&self.tags),
            "summary" => scalar(&self.summary),
            "description" => scalar(&self.description),
            "externalDocs" => raw(&self.external_docs),
            "operationId" => scalar(&self.operation_id),
            "parameters" => field(&self.parameters),
            "requestBody" => field(&self.request_body),
            "responses" => field(&self.responses),
            "callbacks" => field(&self.callbacks),
            "deprecated" => scalar(&self.deprecated),
            "security" => raw(&self.security),
            "servers" => field(&self.servers),
            _ => extension(&self.extensions, token),
        }
    }

    fn children(&self) -> Vec<&dyn Node> {
        let mut out = Vec::new();
        gather(&mut out, &self.parameters);
        gather(&mut out, &self.request_body);
        gather(&mut out, &self.responses);
        gather(&mut out, &self.callbacks);
        gather(&mut out, &self.servers);
        out
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Runtime expressions to Path Items.
#[derive(Debug, Clone, Default)]
pub struct Callback {
    pub expressions: IndexMap<String, Component<PathItem>>,
    pub extensions: Extensions,
    location: Location,
}

impl Object for Callback {
    const KIND: Kind = Kind::Callback;
}

impl Node for Callback {
    fn kind(&self) -> Kind {
        Kind::Callback
    }

    fn location(&self) -> &Location {
        &self.location
    }

    fn locate(&mut self, location: Location) {
        for (expression, item) in self.expressions.iter_mut() {
            item.locate(location.append(expression.clone()));
        }
        self.location = location;
    }

    fn child(&self, token: &str) -> Lookup<'_> {
        if token.starts_with("x-") {
            return extension(&self.extensions, token);
        }
        match self.expressions.get(token) {
            Some(item) => Lookup::Node(item),
            None => Lookup::NotFound,
        }
    }

    fn children(&self) -> Vec<&dyn Node> {
        self.expressions.values().map(|item| item as &dyn Node).collect()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Serialize for Callback {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        encode_patterned(serializer, None, &self.expressions, &self.extensions)
    }
}

impl<'de> Deserialize<'de> for Callback {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (entries, extensions) = split_extensions(json_object(deserializer)?);
        Ok(Self {
            expressions: decode_patterned::<_, D::Error>(entries)?,
            extensions,
            location: Location::default(),
        })
    }
}

/// Status codes (and `default`) to responses.
#[derive(Debug, Clone, Default)]
pub struct Responses {
    pub default: Option<Component<Response>>,
    pub codes: IndexMap<String, Component<Response>>,
    pub extensions: Extensions,
    location: Location,
}

fn is_status_code(token: &str) -> bool {
    let bytes = token.as_bytes();
    bytes.len() == 3
        && (b'1'..=b'5').contains(&bytes[0])
        && bytes[1..]
            .iter()
            .all(|b| b.is_ascii_digit() || *b == b'X' || *b == b'x')
}

impl Object for Responses {
    const KIND: Kind = Kind::Responses;
}

impl Node for Responses {
    fn kind(&self) -> Kind {
        Kind::Responses
    }

    fn location(&self) -> &Location {
        &self.location
    }

    fn locate(&mut self, location: Location) {
        place(&mut self.default, &location, "default");
        for (code, response) in self.codes.iter_mut() {
            response.locate(location.append(code.clone()));
        }
        self.location = location;
    }

    fn child(&self, token: &str) -> Lookup<'_> {
        if token == "default" {
            return field(&self.default);
        }
        match self.codes.get(token) {
            Some(response) => Lookup::Node(response),
            None if is_status_code(token) => Lookup::NotFound,
            None => extension(&self.extensions, token),
        }
    }

    fn children(&self) -> Vec<&dyn Node> {
        let mut out = Vec::new();
        gather(&mut out, &self.default);
        out.extend(self.codes.values().map(|response| response as &dyn Node));
        out
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Serialize for Responses {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.codes.contains_key("default") {
            return Err(S::Error::custom("'default' listed as a status code"));
        }
        encode_patterned(
            serializer,
            self.default.as_ref().map(|response| ("default", response)),
            &self.codes,
            &self.extensions,
        )
    }
}

impl<'de> Deserialize<'de> for Responses {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (mut entries, extensions) = split_extensions(json_object(deserializer)?);
        let default = match entries.iter().position(|(key, _)| key == "default") {
            Some(index) => {
                let (_, value) = entries.remove(index);
                Some(Component::from_value(value).map_err(D::Error::custom)?)
            }
            None => None,
        };
        Ok(Self {
            default,
            codes: decode_patterned::<_, D::Error>(entries)?,
            extensions,
            location: Location::default(),
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<Map<Component<Header>>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Map<MediaType>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Map<Component<Link>>>,

    #[serde(flatten)]
    pub extensions: Extensions,

    #[serde(skip)]
    pub(crate) location: Location,
}

impl Object for Response {
    const KIND: Kind = Kind::Response;
}

impl Node for Response {
    fn kind(&self) -> Kind {
        Kind::Response
    }

    fn location(&self) -> &Location {
        &self.location
    }

    fn locate(&mut self, location: Location) {
        place(&mut self.headers, &location, "headers");
        place(&mut self.content, &location, "content");
        place(&mut self.links, &location, "links");
        self.location = location;
    }

    fn child(&self, token: &str) -> Lookup<'_> {
        match token {
            "summary" => scalar(&self.summary),
            "description" => scalar(&self.description),
            "headers" => field(&self.headers),
            "content" => field(&self.content),
            "links" => field(&self.links),
            _ => extension(&self.extensions, token),
        }
    }

    fn children(&self) -> Vec<&dyn Node> {
        let mut out = Vec::new();
        gather(&mut out, &self.headers);
        gather(&mut out, &self.content);
        gather(&mut out, &self.links);
        out
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Map<MediaType>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,

    #[serde(flatten)]
    pub extensions: Extensions,

    #[serde(skip)]
    pub(crate) location: Location,
}

impl Object for RequestBody {
    const KIND: Kind = Kind::RequestBody;
}

impl Node for RequestBody {
    fn kind(&self) -> Kind {
        Kind::RequestBody
    }

    fn location(&self) -> &Location {
        &self.location
    }

    fn locate(&mut self, location: Location) {
        place(&mut self.content, &location, "content");
        self.location = location;
    }

    fn child(&self, token: &str) -> Lookup<'_> {
        match token {
            "description" => scalar(&self.description),
            "content" => field(&self.content),
            "required" => scalar(&self.required),
            _ => extension(&self.extensions, token),
        }
    }

    fn children(&self) -> Vec<&dyn Node> {
        let mut out = Vec::new();
        gather(&mut out, &self.content);
        out
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaType {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Component<Schema>>,

    /// Schema of each item of a sequential media type (OpenAPI 3.2).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_schema: Option<Component<Schema>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub examples: Option<Map<Component<Example>>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<Value>,

    #[serde(flatten)]
    pub extensions: Extensions,

    #[serde(skip)]
    pub(crate) location: Location,
}

impl Object for MediaType {
    const KIND: Kind = Kind::MediaType;
}

impl Node for MediaType {
    fn kind(&self) -> Kind {
        Kind::MediaType
    }

    fn location(&self) -> &Location {
        &self.location
    }

    fn locate(&mut self, location: Location) {
        place(&mut self.schema, &location, "schema");
        place(&mut self.item_schema, &location, "itemSchema");
        place(&mut self.examples, &location, "examples");
        self.location = location;
    }

    fn child(&self, token: &str) -> Lookup<'_> {
        match token {
            "schema" => field(&self.schema),
            "itemSchema" => field(&self.item_schema),
            "example" => raw(&self.example),
            "examples" => field(&self.examples),
            "encoding" => raw(&self.encoding),
            _ => extension(&self.extensions, token),
        }
    }

    fn children(&self) -> Vec<&dyn Node> {
        let mut out = Vec::new();
        gather(&mut out, &self.schema);
        gather(&mut out, &self.item_schema);
        gather(&mut out, &self.examples);
        out
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Example {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_value: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serialized_value: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_value: Option<String>,

    #[serde(flatten)]
    pub extensions: Extensions,

    #[serde(skip)]
    pub(crate) location: Location,
}

impl Object for Example {
    const KIND: Kind = Kind::Example;
}

impl Node for Example {
    fn kind(&self) -> Kind {
        Kind::Example
    }

    fn location(&self) -> &Location {
        &self.location
    }

    fn locate(&mut self, location: Location) {
        self.location = location;
    }

    fn child(&self, token: &str) -> Lookup<'_> {
        match token {
            "summary" => scalar(&self.summary),
            "description" => scalar(&self.description),
            "value" => raw(&self.value),
            "dataValue" => raw(&self.data_value),
            "serializedValue" => scalar(&self.serialized_value),
            "externalValue" => scalar(&self.external_value),
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
pub struct Link {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_ref: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_body: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<Server>,

    #[serde(flatten)]
    pub extensions: Extensions,

    #[serde(skip)]
    pub(crate) location: Location,
}

impl Object for Link {
    const KIND: Kind = Kind::Link;
}

impl Node for Link {
    fn kind(&self) -> Kind {
        Kind::Link
    }

    fn location(&self) -> &Location {
        &self.location
    }

    fn locate(&mut self, location: Location) {
        place(&mut self.server, &location, "server");
        self.location = location;
    }

    fn child(&self, token: &str) -> Lookup<'_> {
        match token {
            "operationRef" => scalar(&self.operation_ref),
            "operationId" => scalar(&self.operation_id),
            "parameters" => raw(&self.parameters),
            "requestBody" => raw(&self.request_body),
            "description" => scalar(&self.description),
            "server" => field(&self.server),
            _ => extension(&self.extensions, token),
        }
    }

    fn children(&self) -> Vec<&dyn Node> {
        let mut out = Vec::new();
        gather(&mut out, &self.server);
        out
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
