use std::any::Any;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{
    extension, field, gather, place, raw, scalar, Example, Extensions, Map, MediaType, Schema,
};
use crate::component::{Component, Object};
use crate::kind::Kind;
use crate::location::Location;
use crate::node::{Lookup, Node};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    pub name: String,

    /// `path`, `query`, `querystring`, `header` or `cookie`.
    #[serde(rename = "in")]
    pub param_in: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_empty_value: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explode: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_reserved: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Component<Schema>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub examples: Option<Map<Component<Example>>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Map<MediaType>>,

    #[serde(flatten)]
    pub extensions: Extensions,

    #[serde(skip)]
    pub(crate) location: Location,
}

impl Parameter {
    pub fn is_required(&self) -> bool {
        self.required.unwrap_or(false)
    }
}

impl Object for Parameter {
    const KIND: Kind = Kind::Parameter;
}

impl Node for Parameter {
    fn kind(&self) -> Kind {
        Kind::Parameter
    }

    fn location(&self) -> &Location {
        &self.location
    }

    fn locate(&mut self, location: Location) {
        place(&mut self.schema, &location, "schema");
        place(&mut self.examples, &location, "examples");
        place(&mut self.content, &location, "content");
        self.location = location;
    }

    fn child(&self, token: &str) -> Lookup<'_> {
        match token {
            "name" | "in" => Lookup::Scalar,
            "description" => scalar(&self.description),
            "required" => scalar(&self.required),
            "deprecated" => scalar(&self.deprecated),
            "allowEmptyValue" => scalar(&self.allow_empty_value),
            "style" => scalar(&self.style),
            "explode" => scalar(&self.explode),
            "allowReserved" => scalar(&self.allow_reserved),
            "schema" => field(&self.schema),
            "example" => raw(&self.example),
            "examples" => field(&self.examples),
            "content" => field(&self.content),
            _ => extension(&self.extensions, token),
        }
    }

    fn children(&self) -> Vec<&dyn Node> {
        let mut out = Vec::new();
        gather(&mut out, &self.schema);
        gather(&mut out, &self.examples);
        gather(&mut out, &self.content);
        out
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A Parameter Object without `name` and `in`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Header {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explode: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Component<Schema>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub examples: Option<Map<Component<Example>>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Map<MediaType>>,

    #[serde(flatten)]
    pub extensions: Extensions,

    #[serde(skip)]
    pub(crate) location: Location,
}

impl Object for Header {
    const KIND: Kind = Kind::Header;
}

impl Node for Header {
    fn kind(&self) -> Kind {
        Kind::Header
    }

    fn location(&self) -> &Location {
        &self.location
    }

    fn locate(&mut self, location: Location) {
        place(&mut self.schema, &location, "schema");
        place(&mut self.examples, &location, "examples");
        place(&mut self.content, &location, "content");
        self.location = location;
    }

    fn child(&self, token: &str) -> Lookup<'_> {
        match token {
            "description" => scalar(&self.description),
            "required" => scalar(&self.required),
            "deprecated" => scalar(&self.deprecated),
            "style" => scalar(&self.style),
            "explode" => scalar(&self.explode),
            "schema" => field(&self.schema),
            "example" => raw(&self.example),
            "examples" => field(&self.examples),
            "content" => field(&self.content),
            _ => extension(&self.extensions, token),
        }
    }

    fn children(&self) -> Vec<&dyn Node> {
        let mut out = Vec::new();
        gather(&mut out, &self.schema);
        gather(&mut out, &self.examples);
        gather(&mut out, &self.content);
        out
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn querystring_parameter_with_content() {
        let mut parameter = Parameter::decode(json!({
            "name": "filter",
            "in": "querystring",
            "content": {"application/x-www-form-urlencoded": {"schema": {"$ref": "#/components/schemas/Filter"}}}
        }))
        .unwrap();
        parameter.locate(Location::new("https://x/a.json#/components/parameters/Filter").unwrap());

        assert_eq!(parameter.param_in, "querystring");
        assert!(!parameter.is_required());
        let media = parameter
            .content
            .as_ref()
            .unwrap()
            .get("application/x-www-form-urlencoded")
            .unwrap();
        assert_eq!(
            media.schema.as_ref().unwrap().location().pointer().to_string(),
            "/components/parameters/Filter/content/application~1x-www-form-urlencoded/schema"
        );
    }

    #[test]
    fn name_and_in_are_required() {
        assert!(Parameter::decode(json!({"name": "id"})).is_err());
    }

    #[test]
    fn header_round_trips() {
        let value = json!({"description": "rate limit", "schema": {"type": "integer"}});
        let header = Header::decode(value.clone()).unwrap();
        assert_eq!(header.encode().unwrap(), value);
    }
}
