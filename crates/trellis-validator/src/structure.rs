//! Per-kind structural rules compiled from embedded JSON Schema documents.

use std::collections::HashMap;

use serde_json::{json, Value};

use trellis_spec::{Kind, SpecVersion};

use crate::error::{ValidationError, Violation};

const RULES_30: &str = include_str!("../rules/oas-3.0.json");
const RULES_31: &str = include_str!("../rules/oas-3.1.json");
const RULES_32: &str = include_str!("../rules/oas-3.2.json");

/// Compiled structural rules for one specification version.
pub struct RuleSet {
    name: String,
    kinds: HashMap<Kind, jsonschema::Validator>,
    reference: Option<jsonschema::Validator>,
}

impl RuleSet {
    /// The embedded rules for `version`.
    pub fn for_version(version: SpecVersion) -> Result<Self, ValidationError> {
        let source = match version {
            SpecVersion::V3_0 => RULES_30,
            SpecVersion::V3_1 => RULES_31,
            SpecVersion::V3_2 => RULES_32,
        };
        Self::from_json(&format!("OpenAPI {}", version), source)
    }

    /// Compile a rule document with one `$defs` entry per kind name.
    pub fn from_json(name: &str, source: &str) -> Result<Self, ValidationError> {
        let document: Value = serde_json::from_str(source).map_err(|e| ValidationError::RuleSet {
            name: name.to_string(),
            reason: e.to_string(),
        })?;
        let defs = document.get("$defs").cloned().unwrap_or_else(|| json!({}));
        let dialect = document
            .get("$schema")
            .cloned()
            .unwrap_or_else(|| json!(trellis_spec::version::JSON_SCHEMA_2020_12));

        let compile = |entry: &str| -> Result<Option<jsonschema::Validator>, ValidationError> {
            if defs.get(entry).is_none() {
                return Ok(None);
            }
            let schema = json!({
                "$schema": dialect,
                "$ref": format!("#/$defs/{}", entry),
                "$defs": defs,
            });
            jsonschema::options()
                .build(&schema)
                .map(Some)
                .map_err(|e| ValidationError::RuleSet {
                    name: name.to_string(),
                    reason: format!("{}: {}", entry, e),
                })
        };

        let mut kinds = HashMap::new();
        for kind in Kind::ALL {
            if let Some(validator) = compile(kind.as_str())? {
                kinds.insert(*kind, validator);
            }
        }

        Ok(Self {
            name: name.to_string(),
            reference: compile("reference")?,
            kinds,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this set has rules for `kind`.
    pub fn covers(&self, kind: Kind) -> bool {
        self.kinds.contains_key(&kind)
    }

    /// Check `value` against the rules of `kind`. Reference objects in a
    /// referenceable slot are checked against the reference rules instead.
    pub fn check(&self, value: &Value, kind: Kind) -> Vec<Violation> {
        let validator = if kind.is_referenceable() && is_reference(value, kind) {
            self.reference.as_ref()
        } else {
            self.kinds.get(&kind)
        };
        let Some(validator) = validator else {
            return Vec::new();
        };

        validator
            .iter_errors(value)
            .map(|e| Violation {
                pointer: e.instance_path.to_string(),
                message: e.to_string(),
            })
            .collect()
    }
}

fn is_reference(value: &Value, kind: Kind) -> bool {
    let keys: &[&str] = if kind == Kind::Schema {
        &["$ref", "$dynamicRef"]
    } else {
        &["$ref"]
    };
    keys.iter()
        .any(|key| value.get(*key).is_some_and(Value::is_string))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_rules_compile() {
        for version in [SpecVersion::V3_0, SpecVersion::V3_1, SpecVersion::V3_2] {
            let rules = RuleSet::for_version(version).unwrap();
            assert!(rules.covers(Kind::Document));
            assert!(rules.covers(Kind::Schema));
            assert!(!rules.covers(Kind::Fragment));
        }
    }

    #[test]
    fn document_requirements_differ_by_version() {
        let v30 = RuleSet::for_version(SpecVersion::V3_0).unwrap();
        let v31 = RuleSet::for_version(SpecVersion::V3_1).unwrap();

        let without_paths = json!({"openapi": "3.0.3", "info": {"title": "t", "version": "1"}});
        assert!(!v30.check(&without_paths, Kind::Document).is_empty());

        let components_only = json!({
            "openapi": "3.1.0",
            "info": {"title": "t", "version": "1"},
            "components": {}
        });
        assert!(v31.check(&components_only, Kind::Document).is_empty());
    }

    #[test]
    fn dialect_keyword_is_not_allowed_in_30() {
        let v30 = RuleSet::for_version(SpecVersion::V3_0).unwrap();
        let document = json!({
            "openapi": "3.0.3",
            "info": {"title": "t", "version": "1"},
            "paths": {},
            "jsonSchemaDialect": "https://json-schema.org/draft/2020-12/schema"
        });
        assert!(!v30.check(&document, Kind::Document).is_empty());
    }

    #[test]
    fn querystring_is_new_in_32() {
        let parameter = json!({"name": "q", "in": "querystring", "content": {"text/plain": {}}});
        let v31 = RuleSet::for_version(SpecVersion::V3_1).unwrap();
        let v32 = RuleSet::for_version(SpecVersion::V3_2).unwrap();
        assert!(!v31.check(&parameter, Kind::Parameter).is_empty());
        assert!(v32.check(&parameter, Kind::Parameter).is_empty());
    }

    #[test]
    fn references_use_reference_rules() {
        let rules = RuleSet::for_version(SpecVersion::V3_1).unwrap();
        let reference = json!({"$ref": "#/components/parameters/Id"});
        assert!(rules.check(&reference, Kind::Parameter).is_empty());
    }

    #[test]
    fn violations_carry_pointers() {
        let rules = RuleSet::for_version(SpecVersion::V3_1).unwrap();
        let parameter = json!({"name": "id", "in": "body"});
        let violations = rules.check(&parameter, Kind::Parameter);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].pointer, "/in");
    }

    #[test]
    fn boolean_schemas_only_from_31() {
        let v30 = RuleSet::for_version(SpecVersion::V3_0).unwrap();
        let v31 = RuleSet::for_version(SpecVersion::V3_1).unwrap();
        assert!(!v30.check(&json!(true), Kind::Schema).is_empty());
        assert!(v31.check(&json!(true), Kind::Schema).is_empty());
    }
}
