//! Rules that need the whole graph: every reference resolved, path template
//! syntax and collisions, operationId uniqueness, path parameter declarations.

use std::collections::{HashMap, HashSet};

use trellis_spec::model::{Document, Parameter, PathItem};
use trellis_spec::{downcast, Component, Graph, Location, Node};

use crate::error::{GraphRule, GraphViolation};

/// The set of enabled graph rules.
#[derive(Debug, Clone)]
pub struct GraphRules {
    enabled: HashSet<GraphRule>,
}

impl Default for GraphRules {
    fn default() -> Self {
        Self {
            enabled: GraphRule::ALL.iter().copied().collect(),
        }
    }
}

impl GraphRules {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn without(mut self, rule: GraphRule) -> Self {
        self.enabled.remove(&rule);
        self
    }

    pub fn is_enabled(&self, rule: GraphRule) -> bool {
        self.enabled.contains(&rule)
    }

    /// Run every enabled rule, collecting all violations.
    pub fn check(&self, graph: &Graph) -> Vec<GraphViolation> {
        let mut checker = Checker {
            rules: self,
            graph,
            violations: Vec::new(),
            operation_ids: HashMap::new(),
        };
        checker.run();
        checker.violations
    }
}

struct Checker<'a> {
    rules: &'a GraphRules,
    graph: &'a Graph,
    violations: Vec<GraphViolation>,
    operation_ids: HashMap<String, Location>,
}

impl<'a> Checker<'a> {
    fn report(&mut self, rule: GraphRule, message: String, location: Option<&Location>) {
        if self.rules.is_enabled(rule) {
            self.violations.push(GraphViolation {
                rule,
                message,
                location: location.cloned(),
            });
        }
    }

    fn run(&mut self) {
        for reference in self.graph.unresolved() {
            self.report(
                GraphRule::UnresolvedReference,
                format!("reference '{}' has no target", reference.target()),
                Some(reference.location()),
            );
        }

        let Some(document) = self.graph.root_node().and_then(downcast::<Document>) else {
            return;
        };

        if let Some(paths) = &document.paths {
            let mut shapes: HashMap<String, &str> = HashMap::new();
            for (template, item) in paths.iter() {
                if let Err(reason) = validate_path_template(template) {
                    self.report(
                        GraphRule::PathTemplate,
                        format!("'{}' - {}", template, reason),
                        Some(item.location()),
                    );
                    continue;
                }

                let shape = normalize_path_template(template);
                match shapes.get(shape.as_str()) {
                    Some(other) if *other != template.as_str() => {
                        let message = format!(
                            "'{}' and '{}' have same structure but different param names",
                            template, other
                        );
                        self.report(GraphRule::AmbiguousPath, message, Some(item.location()));
                    }
                    _ => {
                        shapes.insert(shape, template);
                    }
                }

                self.check_path_item(Some(template), item);
            }
        }

        if let Some(webhooks) = &document.webhooks {
            for (_, item) in webhooks {
                self.check_path_item(None, item);
            }
        }
    }

    fn check_path_item(&mut self, template: Option<&str>, item: &'a Component<PathItem>) {
        let graph = self.graph;
        let Ok(item) = graph.resolve::<PathItem>(item) else {
            return;
        };

        let shared = self.parameters(item.parameters.iter().flatten());
        for parameter in &shared {
            self.check_required(parameter);
        }

        for (method, operation) in item.operations() {
            if let Some(id) = &operation.operation_id {
                match self.operation_ids.get(id) {
                    Some(first) => {
                        let message = format!(
                            "operationId '{}' first at {}, duplicate at {} {}",
                            id,
                            first,
                            method,
                            template.unwrap_or("webhook")
                        );
                        let location = operation.location().clone();
                        self.report(GraphRule::DuplicateOperationId, message, Some(&location));
                    }
                    None => {
                        self.operation_ids
                            .insert(id.clone(), operation.location().clone());
                    }
                }
            }

            let own = self.parameters(operation.parameters.iter().flatten());
            for parameter in &own {
                self.check_required(parameter);
            }

            let Some(template) = template else {
                continue;
            };
            let declared: HashSet<&str> = shared
                .iter()
                .chain(own.iter())
                .filter(|p| p.param_in == "path")
                .map(|p| p.name.as_str())
                .collect();
            for name in template_parameters(template) {
                if !declared.contains(name.as_str()) {
                    let message = format!(
                        "{} {} uses '{{{}}}' but declares no path parameter '{}'",
                        method, template, name, name
                    );
                    let location = operation.location().clone();
                    self.report(GraphRule::UndeclaredPathParameter, message, Some(&location));
                }
            }
        }
    }

    fn parameters(
        &self,
        components: impl Iterator<Item = &'a Component<Parameter>>,
    ) -> Vec<&'a Parameter> {
        let graph = self.graph;
        components
            .filter_map(|component| graph.resolve::<Parameter>(component).ok())
            .collect()
    }

    fn check_required(&mut self, parameter: &Parameter) {
        if parameter.param_in == "path" && !parameter.is_required() {
            let message = format!("path parameter '{}' must be required", parameter.name);
            self.report(GraphRule::OptionalPathParameter, message, Some(parameter.location()));
        }
    }
}

/// Check path template syntax: balanced braces, non-empty names made of
/// alphanumerics and underscores, no duplicate names.
pub fn validate_path_template(path: &str) -> Result<(), String> {
    let mut seen_params: HashSet<String> = HashSet::new();
    let mut current_param = String::new();
    let mut in_param = false;

    for ch in path.chars() {
        match ch {
            '{' => {
                if in_param {
                    return Err("nested braces not allowed".into());
                }
                in_param = true;
            }
            '}' => {
                if !in_param {
                    return Err("unmatched closing brace".into());
                }
                in_param = false;

                if current_param.is_empty() {
                    return Err("empty parameter name".into());
                }
                if !seen_params.insert(current_param.clone()) {
                    return Err(format!("duplicate parameter '{}'", current_param));
                }
                current_param.clear();
            }
            _ if in_param => {
                if !ch.is_alphanumeric() && ch != '_' && ch != '.' && ch != '-' {
                    return Err(format!("invalid character '{}' in parameter name", ch));
                }
                current_param.push(ch);
            }
            _ => {}
        }
    }

    if in_param {
        return Err("unclosed brace".into());
    }
    if !path.starts_with('/') {
        return Err("must start with '/'".into());
    }

    Ok(())
}

/// Replace parameter names with a placeholder: `/users/{id}` -> `/users/{_}`.
pub fn normalize_path_template(path: &str) -> String {
    let mut result = String::with_capacity(path.len());
    let mut in_param = false;

    for ch in path.chars() {
        match ch {
            '{' => {
                result.push_str("{_");
                in_param = true;
            }
            '}' => {
                result.push('}');
                in_param = false;
            }
            _ if in_param => {}
            _ => result.push(ch),
        }
    }

    result
}

/// Parameter names of a template, in order.
pub fn template_parameters(path: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut rest = path;
    while let Some(start) = rest.find('{') {
        let Some(len) = rest[start..].find('}') else {
            break;
        };
        names.push(rest[start + 1..start + len].to_string());
        rest = &rest[start + len + 1..];
    }
    names
}
