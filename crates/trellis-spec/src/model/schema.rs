use std::any::Any;

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use super::{field, gather, place, raw, scalar, Extensions, List, Map};
use crate::component::{Component, Object};
use crate::kind::Kind;
use crate::location::Location;
use crate::node::{Lookup, Node};

type SubSchema = Option<Box<Component<Schema>>>;

/// A Schema Object (JSON Schema with OpenAPI vocabulary).
///
/// Boolean schemas (`true` / `false`) decode to a schema with
/// [`Schema::as_boolean`] set and are encoded back through
/// [`Object::encode`]. Keywords not listed here are kept in `extensions` and
/// remain addressable as raw JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    #[serde(rename = "$schema", default, skip_serializing_if = "Option::is_none")]
    pub schema_uri: Option<String>,

    #[serde(rename = "$id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(rename = "$anchor", default, skip_serializing_if = "Option::is_none")]
    pub anchor: Option<String>,

    #[serde(rename = "$dynamicAnchor", default, skip_serializing_if = "Option::is_none")]
    pub dynamic_anchor: Option<String>,

    #[serde(rename = "$comment", default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,

    #[serde(rename = "$defs", default, skip_serializing_if = "Option::is_none")]
    pub defs: Option<Map<Component<Schema>>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definitions: Option<Map<Component<Schema>>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub examples: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_only: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub write_only: Option<bool>,

    /// A type name or, from 3.1 on, a list of type names.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<Value>,

    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,

    #[serde(rename = "const", default, skip_serializing_if = "Option::is_none")]
    pub const_value: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multiple_of: Option<Number>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<Number>,

    /// A number in 3.1+, a boolean in 3.0.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclusive_maximum: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<Number>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclusive_minimum: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_encoding: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_media_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_schema: SubSchema,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_items: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique_items: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_contains: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_contains: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_properties: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_properties: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependent_required: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub all_of: Option<List<Component<Schema>>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub any_of: Option<List<Component<Schema>>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub one_of: Option<List<Component<Schema>>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not: SubSchema,

    #[serde(rename = "if", default, skip_serializing_if = "Option::is_none")]
    pub if_schema: SubSchema,

    #[serde(rename = "then", default, skip_serializing_if = "Option::is_none")]
    pub then_schema: SubSchema,

    #[serde(rename = "else", default, skip_serializing_if = "Option::is_none")]
    pub else_schema: SubSchema,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependent_schemas: Option<Map<Component<Schema>>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix_items: Option<List<Component<Schema>>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: SubSchema,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contains: SubSchema,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Map<Component<Schema>>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern_properties: Option<Map<Component<Schema>>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_properties: SubSchema,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_names: SubSchema,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unevaluated_items: SubSchema,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unevaluated_properties: SubSchema,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nullable: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discriminator: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xml: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_docs: Option<Value>,

    #[serde(flatten)]
    pub extensions: Extensions,

    #[serde(skip)]
    boolean: Option<bool>,

    #[serde(skip)]
    pub(crate) location: Location,
}

impl Schema {
    /// The `true` or `false` schema.
    pub fn boolean(accept: bool) -> Self {
        Self {
            boolean: Some(accept),
            ..Self::default()
        }
    }

    pub fn as_boolean(&self) -> Option<bool> {
        self.boolean
    }

    fn subschema(&self, token: &str) -> Option<Lookup<'_>> {
        Some(match token {
            "$defs" => field(&self.defs),
            "definitions" => field(&self.definitions),
            "contentSchema" => field(&self.content_schema),
            "allOf" => field(&self.all_of),
            "anyOf" => field(&self.any_of),
            "oneOf" => field(&self.one_of),
            "not" => field(&self.not),
            "if" => field(&self.if_schema),
            "then" => field(&self.then_schema),
            "else" => field(&self.else_schema),
            "dependentSchemas" => field(&self.dependent_schemas),
            "prefixItems" => field(&self.prefix_items),
            "items" => field(&self.items),
            "contains" => field(&self.contains),
            "properties" => field(&self.properties),
            "patternProperties" => field(&self.pattern_properties),
            "additionalProperties" => field(&self.additional_properties),
            "propertyNames" => field(&self.property_names),
            "unevaluatedItems" => field(&self.unevaluated_items),
            "unevaluatedProperties" => field(&self.unevaluated_properties),
            _ => return None,
        })
    }

    fn keyword(&self, token: &str) -> Option<Lookup<'_>> {
        Some(match token {
            "$schema" => scalar(&self.schema_uri),
            "$id" => scalar(&self.id),
            "$anchor" => scalar(&self.anchor),
            "$dynamicAnchor" => scalar(&self.dynamic_anchor),
            "$comment" => scalar(&self.comment),
            "title" => scalar(&self.title),
            "description" => scalar(&self.description),
            "default" => raw(&self.default),
            "examples" => raw(&self.examples),
            "example" => raw(&self.example),
            "deprecated" => scalar(&self.deprecated),
            "readOnly" => scalar(&self.read_only),
            "writeOnly" => scalar(&self.write_only),
            "type" => raw(&self.schema_type),
            "enum" => scalar(&self.enum_values),
            "const" => raw(&self.const_value),
            "multipleOf" => scalar(&self.multiple_of),
            "maximum" => scalar(&self.maximum),
            "exclusiveMaximum" => raw(&self.exclusive_maximum),
            "minimum" => scalar(&self.minimum),
            "exclusiveMinimum" => raw(&self.exclusive_minimum),
            "maxLength" => scalar(&self.max_length),
            "minLength" => scalar(&self.min_length),
            "pattern" => scalar(&self.pattern),
            "format" => scalar(&self.format),
            "contentEncoding" => scalar(&self.content_encoding),
            "contentMediaType" => scalar(&self.content_media_type),
            "maxItems" => scalar(&self.max_items),
            "minItems" => scalar(&self.min_items),
            "uniqueItems" => scalar(&self.unique_items),
            "maxContains" => scalar(&self.max_contains),
            "minContains" => scalar(&self.min_contains),
            "maxProperties" => scalar(&self.max_properties),
            "minProperties" => scalar(&self.min_properties),
            "required" => scalar(&self.required),
            "dependentRequired" => raw(&self.dependent_required),
            "nullable" => scalar(&self.nullable),
            "discriminator" => raw(&self.discriminator),
            "xml" => raw(&self.xml),
            "externalDocs" => raw(&self.external_docs),
            _ => return None,
        })
    }
}

impl Object for Schema {
    const KIND: Kind = Kind::Schema;
    const REFERENCE_KEYS: &'static [&'static str] = &["$ref", "$dynamicRef"];

    fn decode(value: Value) -> Result<Self, serde_json::Error> {
        match value {
            Value::Bool(accept) => Ok(Self::boolean(accept)),
            other => serde_json::from_value(other),
        }
    }

    fn encode(&self) -> Result<Value, serde_json::Error> {
        match self.boolean {
            Some(accept) => Ok(Value::Bool(accept)),
            None => serde_json::to_value(self),
        }
    }
}

impl Node for Schema {
    fn kind(&self) -> Kind {
        Kind::Schema
    }

    fn location(&self) -> &Location {
        &self.location
    }

    fn locate(&mut self, location: Location) {
        place(&mut self.defs, &location, "$defs");
        place(&mut self.definitions, &location, "definitions");
        place(&mut self.content_schema, &location, "contentSchema");
        place(&mut self.all_of, &location, "allOf");
        place(&mut self.any_of, &location, "anyOf");
        place(&mut self.one_of, &location, "oneOf");
        place(&mut self.not, &location, "not");
        place(&mut self.if_schema, &location, "if");
        place(&mut self.then_schema, &location, "then");
        place(&mut self.else_schema, &location, "else");
        place(&mut self.dependent_schemas, &location, "dependentSchemas");
        place(&mut self.prefix_items, &location, "prefixItems");
        place(&mut self.items, &location, "items");
        place(&mut self.contains, &location, "contains");
        place(&mut self.properties, &location, "properties");
        place(&mut self.pattern_properties, &location, "patternProperties");
        place(&mut self.additional_properties, &location, "additionalProperties");
        place(&mut self.property_names, &location, "propertyNames");
        place(&mut self.unevaluated_items, &location, "unevaluatedItems");
        place(&mut self.unevaluated_properties, &location, "unevaluatedProperties");
        self.location = location;
    }

    fn child(&self, token: &str) -> Lookup<'_> {
        if self.boolean.is_some() {
            return Lookup::NotResolvable;
        }
        if let Some(lookup) = self.subschema(token).or_else(|| self.keyword(token)) {
            return lookup;
        }
        // Unknown keywords are legal in a schema; only their presence varies.
        match self.extensions.get(token) {
            Some(value) => Lookup::Value(value),
            None => Lookup::NotFound,
        }
    }

    fn children(&self) -> Vec<&dyn Node> {
        let mut out = Vec::new();
        gather(&mut out, &self.defs);
        gather(&mut out, &self.definitions);
        gather(&mut out, &self.content_schema);
        gather(&mut out, &self.all_of);
        gather(&mut out, &self.any_of);
        gather(&mut out, &self.one_of);
        gather(&mut out, &self.not);
        gather(&mut out, &self.if_schema);
        gather(&mut out, &self.then_schema);
        gather(&mut out, &self.else_schema);
        gather(&mut out, &self.dependent_schemas);
        gather(&mut out, &self.prefix_items);
        gather(&mut out, &self.items);
        gather(&mut out, &self.contains);
        gather(&mut out, &self.properties);
        gather(&mut out, &self.pattern_properties);
        gather(&mut out, &self.additional_properties);
        gather(&mut out, &self.property_names);
        gather(&mut out, &self.unevaluated_items);
        gather(&mut out, &self.unevaluated_properties);
        out
    }

    fn dialect(&self) -> Option<&str> {
        self.schema_uri.as_deref()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{collect_references, walk, Found};
    use crate::pointer::Pointer;
    use crate::version::{Context, SpecVersion, JSON_SCHEMA_DRAFT_07};
    use serde_json::json;

    fn located(value: Value) -> Component<Schema> {
        let mut schema = Component::<Schema>::from_value(value).unwrap();
        schema.locate(Location::new("https://x/schemas.json").unwrap());
        schema
    }

    #[test]
    fn boolean_schemas_are_objects() {
        let schema = located(json!({"properties": {"any": true, "none": false}}));
        let object = schema.as_object().unwrap();
        let none = object.properties.as_ref().unwrap().get("none").unwrap();
        assert!(!none.is_reference());
        assert_eq!(none.as_object().unwrap().as_boolean(), Some(false));
        assert_eq!(
            schema.to_value().unwrap(),
            json!({"properties": {"any": true, "none": false}})
        );
    }

    #[test]
    fn nested_subschemas_are_located() {
        let schema = located(json!({
            "$defs": {"Node": {"properties": {"children": {"items": {"$ref": "#/$defs/Node"}}}}}
        }));
        let found = walk(
            &schema,
            &Pointer::parse("/$defs/Node/properties/children/items").unwrap(),
        )
        .unwrap();
        let node = found.node().unwrap();
        assert!(node.reference().is_some());
        assert_eq!(
            node.location().pointer().to_string(),
            "/$defs/Node/properties/children/items"
        );
    }

    #[test]
    fn unknown_keywords_are_raw_values() {
        let schema = located(json!({"x-tags": ["a"], "myDefs": {"A": {"type": "string"}}}));
        assert!(matches!(
            walk(&schema, &Pointer::parse("/myDefs/A").unwrap()),
            Ok(Found::Value(_))
        ));
        assert!(matches!(
            walk(&schema, &Pointer::parse("/otherDefs").unwrap()),
            Err(crate::node::WalkError::NotFound { .. })
        ));
    }

    #[test]
    fn dynamic_ref_keeps_keyword() {
        let schema = located(json!({"$dynamicRef": "#node"}));
        let reference = schema.as_reference().unwrap();
        assert_eq!(reference.keyword(), "$dynamicRef");
        assert_eq!(schema.to_value().unwrap(), json!({"$dynamicRef": "#node"}));
    }

    #[test]
    fn schema_dialect_scopes_references() {
        let schema = located(json!({
            "properties": {
                "legacy": {"$schema": JSON_SCHEMA_DRAFT_07, "items": {"$ref": "#/a"}},
                "modern": {"$ref": "#/b"}
            }
        }));
        let mut found = Vec::new();
        collect_references(&schema, &Context::for_version(SpecVersion::V3_1), &mut found);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].1.dialect(), JSON_SCHEMA_DRAFT_07);
        assert_eq!(found[1].1.dialect(), SpecVersion::V3_1.default_dialect());
    }

    #[test]
    fn walking_into_boolean_schema_is_not_resolvable() {
        let schema = located(json!(true));
        assert!(matches!(schema.child("type"), Lookup::NotResolvable));
    }
}
