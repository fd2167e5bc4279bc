//! Issues and inventories printed by the CLI.

use serde::Serialize;

use trellis_loader::LoadError;
use trellis_spec::{descendants, Graph, Kind};
use trellis_validator::ValidationError;

#[derive(Debug, Serialize)]
pub struct Issue {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ValidationResult {
    pub file: String,
    pub valid: bool,
    pub resources: usize,
    pub errors: Vec<Issue>,
}

/// Break a load error into one issue per underlying violation.
pub fn issues(error: &LoadError) -> Vec<Issue> {
    let location = match error.pointer() {
        Some(pointer) if !pointer.is_root() => format!("{}#{}", error.uri(), pointer),
        _ => error.uri().to_string(),
    };

    match error {
        LoadError::GraphValidation {
            source: ValidationError::Graph(violations),
            ..
        } => violations
            .iter()
            .map(|violation| Issue {
                code: violation.rule.code().to_string(),
                message: violation.message.clone(),
                location: violation.location.as_ref().map(ToString::to_string),
            })
            .collect(),
        LoadError::StructuralValidation {
            source: ValidationError::Structural { kind, violations, .. },
            ..
        } if !violations.is_empty() => violations
            .iter()
            .map(|violation| Issue {
                code: error.code().to_string(),
                message: format!("invalid {}: {}", kind, violation),
                location: Some(location.clone()),
            })
            .collect(),
        _ => {
            let message = error.to_string();
            let message = message
                .strip_prefix(error.code())
                .and_then(|rest| rest.strip_prefix(": "))
                .unwrap_or(&message)
                .to_string();
            vec![Issue {
                code: error.code().to_string(),
                message,
                location: Some(location),
            }]
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Inventory {
    pub root: String,
    pub resources: Vec<ResourceEntry>,
    pub references: Vec<ReferenceEntry>,
}

#[derive(Debug, Serialize)]
pub struct ResourceEntry {
    pub uri: String,
    pub kind: Kind,
    pub version: String,
    pub dialect: String,
    pub anchors: Vec<String>,
    pub fragments: Vec<String>,
    /// Typed nodes reachable from the root and adopted fragments.
    pub nodes: usize,
}

#[derive(Debug, Serialize)]
pub struct ReferenceEntry {
    pub site: String,
    pub keyword: String,
    pub target: String,
    pub kind: Kind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved: Option<String>,
}

impl Inventory {
    pub fn of(graph: &Graph) -> Self {
        let resources = graph
            .resources()
            .map(|resource| {
                let mut anchors: Vec<String> =
                    resource.anchors().map(|(name, _)| name.to_string()).collect();
                anchors.sort();
                ResourceEntry {
                    uri: resource.uri().to_string(),
                    kind: resource.kind(),
                    version: resource.context().version().to_string(),
                    dialect: resource.context().dialect().to_string(),
                    anchors,
                    fragments: resource
                        .fragments()
                        .map(|(pointer, _)| pointer.to_string())
                        .collect(),
                    nodes: resource
                        .entry_points()
                        .into_iter()
                        .map(|node| descendants(node).len())
                        .sum(),
                }
            })
            .collect();

        let references = graph
            .references()
            .into_iter()
            .map(|(reference, _)| ReferenceEntry {
                site: reference.location().to_string(),
                keyword: reference.keyword().to_string(),
                target: reference.target().to_string(),
                kind: reference.expected(),
                resolved: reference
                    .resolved()
                    .map(|target| target.location.to_string()),
            })
            .collect();

        Self {
            root: graph
                .root()
                .map(|resource| resource.uri().to_string())
                .unwrap_or_default(),
            resources,
            references,
        }
    }

    pub fn print_text(&self) {
        println!("{}", self.root);
        println!();
        println!("resources ({}):", self.resources.len());
        for resource in &self.resources {
            println!(
                "  {} [{}] OpenAPI {} ({}), {} typed node(s)",
                resource.uri, resource.kind, resource.version, resource.dialect, resource.nodes
            );
            if !resource.anchors.is_empty() {
                println!("    anchors: {}", resource.anchors.join(", "));
            }
            for fragment in &resource.fragments {
                println!("    adopted: #{}", fragment);
            }
        }
        println!();
        println!("references ({}):", self.references.len());
        for reference in &self.references {
            println!(
                "  {} {} '{}' -> {} [{}]",
                reference.site,
                reference.keyword,
                reference.target,
                reference.resolved.as_deref().unwrap_or("(unresolved)"),
                reference.kind
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_spec::{Location, Pointer};
    use trellis_validator::{GraphRule, GraphViolation, Violation};
    use url::Url;

    fn uri() -> Url {
        Url::parse("file:///specs/api.yaml").unwrap()
    }

    #[test]
    fn graph_violations_become_separate_issues() {
        let error = LoadError::GraphValidation {
            uri: uri(),
            source: ValidationError::Graph(vec![
                GraphViolation {
                    rule: GraphRule::DuplicateOperationId,
                    message: "operationId 'a' first at x, duplicate at GET /b".into(),
                    location: Some(Location::new("file:///specs/api.yaml#/paths").unwrap()),
                },
                GraphViolation {
                    rule: GraphRule::AmbiguousPath,
                    message: "ambiguous".into(),
                    location: None,
                },
            ]),
        };
        let issues = issues(&error);
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].code, "E1212");
        assert_eq!(issues[0].location.as_deref(), Some("file:///specs/api.yaml#/paths"));
        assert_eq!(issues[1].code, "E1213");
        assert!(issues[1].location.is_none());
    }

    #[test]
    fn structural_violations_keep_the_kind() {
        let error = LoadError::StructuralValidation {
            uri: uri(),
            pointer: Some(Pointer::parse("/Bad").unwrap()),
            source: ValidationError::Structural {
                kind: Kind::Parameter,
                rules: "OpenAPI 3.1".into(),
                violations: vec![Violation {
                    pointer: "/in".into(),
                    message: "\"body\" is not one of the allowed values".into(),
                }],
            },
        };
        let issues = issues(&error);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].code, "E1313");
        assert!(issues[0].message.starts_with("invalid parameter: /in:"));
        assert_eq!(issues[0].location.as_deref(), Some("file:///specs/api.yaml#/Bad"));
    }

    #[test]
    fn other_errors_drop_the_code_prefix() {
        let error = LoadError::Cancelled { uri: uri() };
        let issues = issues(&error);
        assert_eq!(issues[0].code, "E1318");
        assert_eq!(issues[0].message, "load of file:///specs/api.yaml cancelled");
    }
}
