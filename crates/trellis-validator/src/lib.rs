//! Validation for trellis document graphs.
//!
//! Two checks run during a load: structural rules for each raw value before
//! it is decoded, and graph rules once every reference is attached. Both sit
//! behind the [`Validator`] trait so the loader never depends on a concrete
//! rule engine.

mod error;
mod graph;
mod structure;

use std::collections::HashMap;

use serde_json::Value;

use trellis_spec::version::{
    same_dialect, JSON_SCHEMA_2019_09, JSON_SCHEMA_2020_12, JSON_SCHEMA_DRAFT_04,
    JSON_SCHEMA_DRAFT_07,
};
use trellis_spec::{Context, Graph, Kind, SpecVersion};

pub use error::{GraphRule, GraphViolation, ValidationError, Violation};
pub use graph::{normalize_path_template, template_parameters, validate_path_template, GraphRules};
pub use structure::RuleSet;

/// The validation boundary used by the loader.
pub trait Validator: Send + Sync {
    /// Check a raw value against the rules for `kind` under `context`.
    fn validate_structure(
        &self,
        value: &Value,
        kind: Kind,
        context: &Context,
    ) -> Result<(), ValidationError>;

    /// Check the assembled graph.
    fn validate_graph(&self, graph: &Graph) -> Result<(), ValidationError>;
}

/// Accepts everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopValidator;

impl Validator for NoopValidator {
    fn validate_structure(&self, _: &Value, _: Kind, _: &Context) -> Result<(), ValidationError> {
        Ok(())
    }

    fn validate_graph(&self, _: &Graph) -> Result<(), ValidationError> {
        Ok(())
    }
}

/// Builds a [`RuleValidator`]. Build once and share it across loads.
#[derive(Debug, Clone)]
pub struct ValidatorFactory {
    dialects: Vec<String>,
    graph_rules: GraphRules,
    structural: bool,
}

impl Default for ValidatorFactory {
    fn default() -> Self {
        let mut dialects: Vec<String> = [SpecVersion::V3_0, SpecVersion::V3_1, SpecVersion::V3_2]
            .iter()
            .map(|version| version.default_dialect().to_string())
            .collect();
        dialects.extend(
            [
                JSON_SCHEMA_2020_12,
                JSON_SCHEMA_2019_09,
                JSON_SCHEMA_DRAFT_07,
                JSON_SCHEMA_DRAFT_04,
            ]
            .map(String::from),
        );
        Self {
            dialects,
            graph_rules: GraphRules::all(),
            structural: true,
        }
    }
}

impl ValidatorFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept an additional schema dialect URI.
    pub fn with_dialect(mut self, dialect: impl Into<String>) -> Self {
        self.dialects.push(dialect.into());
        self
    }

    /// Turn off one graph rule.
    pub fn without_rule(mut self, rule: GraphRule) -> Self {
        self.graph_rules = self.graph_rules.without(rule);
        self
    }

    /// Enable or disable the per-kind structural rules. Dialect checks
    /// still run.
    pub fn with_structural_rules(mut self, enabled: bool) -> Self {
        self.structural = enabled;
        self
    }

    /// Compile the embedded rule sets.
    pub fn build(&self) -> Result<RuleValidator, ValidationError> {
        let mut rules = HashMap::new();
        if self.structural {
            for version in [SpecVersion::V3_0, SpecVersion::V3_1, SpecVersion::V3_2] {
                rules.insert(version, RuleSet::for_version(version)?);
            }
        }
        Ok(RuleValidator {
            rules,
            dialects: self.dialects.clone(),
            graph_rules: self.graph_rules.clone(),
        })
    }
}

/// The embedded OpenAPI rule sets plus the graph rules.
pub struct RuleValidator {
    rules: HashMap<SpecVersion, RuleSet>,
    dialects: Vec<String>,
    graph_rules: GraphRules,
}

impl RuleValidator {
    pub fn knows_dialect(&self, dialect: &str) -> bool {
        self.dialects.iter().any(|known| same_dialect(known, dialect))
    }
}

impl Validator for RuleValidator {
    fn validate_structure(
        &self,
        value: &Value,
        kind: Kind,
        context: &Context,
    ) -> Result<(), ValidationError> {
        if !self.knows_dialect(context.dialect()) {
            return Err(ValidationError::UnsupportedDialect(
                context.dialect().to_string(),
            ));
        }

        let Some(rules) = self.rules.get(&context.version()) else {
            return Ok(());
        };

        // Schemas written in another dialect only need to be schema-shaped.
        let foreign_schema = kind == Kind::Schema
            && !same_dialect(context.dialect(), context.version().default_dialect());
        let violations = if foreign_schema {
            if value.is_object() || value.is_boolean() {
                Vec::new()
            } else {
                vec![Violation {
                    pointer: String::new(),
                    message: format!("{} is not an object or boolean", value),
                }]
            }
        } else {
            rules.check(value, kind)
        };

        if violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::Structural {
                kind,
                rules: rules.name().to_string(),
                violations,
            })
        }
    }

    fn validate_graph(&self, graph: &Graph) -> Result<(), ValidationError> {
        let violations = self.graph_rules.check(graph);
        tracing::debug!(
            resources = graph.len(),
            violations = violations.len(),
            "graph rules checked"
        );
        if violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::Graph(violations))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use trellis_spec::version::OAS_31_DIALECT;
    use trellis_spec::{Location, Resource};
    use url::Url;

    fn validator() -> RuleValidator {
        ValidatorFactory::new().build().unwrap()
    }

    fn graph_of(raw: Value) -> Graph {
        let uri = "https://example.test/api.json";
        let mut root = trellis_spec::decode(Kind::Document, raw.clone()).unwrap();
        root.locate(Location::new(uri).unwrap());
        let mut graph = Graph::new();
        graph.insert(Resource::new(
            &Url::parse(uri).unwrap(),
            Kind::Document,
            Context::for_version(SpecVersion::V3_1),
            raw,
            Some(root),
        ));
        graph
    }

    #[test]
    fn unknown_dialect_is_rejected() {
        let context = Context::new(SpecVersion::V3_1, "https://example.test/my-dialect");
        let err = validator()
            .validate_structure(&json!({}), Kind::Schema, &context)
            .unwrap_err();
        assert!(matches!(err, ValidationError::UnsupportedDialect(_)));
        assert!(err.to_string().starts_with("E1202"));
    }

    #[test]
    fn extra_dialects_are_accepted() {
        let validator = ValidatorFactory::new()
            .with_dialect("https://example.test/my-dialect")
            .build()
            .unwrap();
        let context = Context::new(SpecVersion::V3_1, "https://example.test/my-dialect");
        assert!(validator
            .validate_structure(&json!({"type": "string"}), Kind::Schema, &context)
            .is_ok());
    }

    #[test]
    fn structural_errors_name_the_rules() {
        let context = Context::new(SpecVersion::V3_1, OAS_31_DIALECT);
        let err = validator()
            .validate_structure(&json!({"openapi": "3.1.0"}), Kind::Document, &context)
            .unwrap_err();
        assert!(!err.violations().is_empty());
        assert!(err.to_string().contains("OpenAPI 3.1"));
    }

    #[test]
    fn structural_rules_can_be_disabled() {
        let validator = ValidatorFactory::new()
            .with_structural_rules(false)
            .build()
            .unwrap();
        let context = Context::for_version(SpecVersion::V3_1);
        assert!(validator
            .validate_structure(&json!({"openapi": "3.1.0"}), Kind::Document, &context)
            .is_ok());
    }

    #[test]
    fn foreign_schema_dialects_are_only_shape_checked() {
        let context = Context::new(SpecVersion::V3_1, JSON_SCHEMA_DRAFT_04);
        let schema = json!({"type": "integer", "exclusiveMinimum": true, "minimum": 0});
        assert!(validator()
            .validate_structure(&schema, Kind::Schema, &context)
            .is_ok());
    }

    #[test]
    fn graph_rules_report_everything() {
        let graph = graph_of(json!({
            "openapi": "3.1.0",
            "info": {"title": "t", "version": "1"},
            "paths": {
                "/users/{id}": {
                    "get": {"operationId": "getUser", "parameters": [
                        {"name": "id", "in": "path"}
                    ]}
                },
                "/users/{name}": {
                    "get": {"operationId": "getUser"}
                },
                "/broken/{": {},
                "/orders": {"parameters": [{"$ref": "#/components/parameters/Missing"}]}
            }
        }));

        let err = validator().validate_graph(&graph).unwrap_err();
        let rules: Vec<GraphRule> = err.graph_violations().iter().map(|v| v.rule).collect();
        assert!(rules.contains(&GraphRule::UnresolvedReference));
        assert!(rules.contains(&GraphRule::OptionalPathParameter));
        assert!(rules.contains(&GraphRule::AmbiguousPath));
        assert!(rules.contains(&GraphRule::DuplicateOperationId));
        assert!(rules.contains(&GraphRule::UndeclaredPathParameter));
        assert!(rules.contains(&GraphRule::PathTemplate));
    }

    #[test]
    fn clean_graph_passes() {
        let graph = graph_of(json!({
            "openapi": "3.1.0",
            "info": {"title": "t", "version": "1"},
            "paths": {
                "/users/{id}": {
                    "parameters": [{"name": "id", "in": "path", "required": true}],
                    "get": {"operationId": "getUser"},
                    "delete": {"operationId": "deleteUser"}
                }
            }
        }));
        assert!(validator().validate_graph(&graph).is_ok());
    }

    #[test]
    fn noop_accepts_everything() {
        let context = Context::for_version(SpecVersion::V3_0);
        assert!(NoopValidator
            .validate_structure(&Value::Null, Kind::Document, &context)
            .is_ok());
        assert!(NoopValidator.validate_graph(&Graph::new()).is_ok());
    }
}
