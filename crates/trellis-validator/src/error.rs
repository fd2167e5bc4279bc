use std::fmt;

use thiserror::Error;

use trellis_spec::{Kind, Location};

/// One failed structural rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// JSON pointer into the validated value.
    pub pointer: String,
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.pointer.is_empty() {
            f.write_str(&self.message)
        } else {
            write!(f, "{}: {}", self.pointer, self.message)
        }
    }
}

/// Whole-graph rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GraphRule {
    /// A reference with no attached target.
    UnresolvedReference,
    /// Unbalanced braces, empty or duplicate names in a path template.
    PathTemplate,
    /// Two operations share an `operationId`.
    DuplicateOperationId,
    /// Two path templates differ only by parameter names.
    AmbiguousPath,
    /// A template parameter with no matching `in: path` parameter.
    UndeclaredPathParameter,
    /// An `in: path` parameter without `required: true`.
    OptionalPathParameter,
}

impl GraphRule {
    pub const ALL: &'static [GraphRule] = &[
        GraphRule::UnresolvedReference,
        GraphRule::PathTemplate,
        GraphRule::DuplicateOperationId,
        GraphRule::AmbiguousPath,
        GraphRule::UndeclaredPathParameter,
        GraphRule::OptionalPathParameter,
    ];

    pub fn code(self) -> &'static str {
        match self {
            GraphRule::UnresolvedReference => "E1210",
            GraphRule::PathTemplate => "E1211",
            GraphRule::DuplicateOperationId => "E1212",
            GraphRule::AmbiguousPath => "E1213",
            GraphRule::UndeclaredPathParameter => "E1214",
            GraphRule::OptionalPathParameter => "E1215",
        }
    }
}

/// One failed graph rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphViolation {
    pub rule: GraphRule,
    pub message: String,
    pub location: Option<Location>,
}

impl fmt::Display for GraphViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.rule.code(), self.message)?;
        if let Some(location) = &self.location {
            write!(f, " (at {})", location)?;
        }
        Ok(())
    }
}

fn joined<T: fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors produced by validators.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// The raw value does not satisfy the rules of its kind.
    #[error("E1201: invalid {kind} for {rules}: {}", joined(.violations))]
    Structural {
        kind: Kind,
        rules: String,
        violations: Vec<Violation>,
    },

    /// The schema dialect is not one this validator knows.
    #[error("E1202: unsupported schema dialect '{0}'")]
    UnsupportedDialect(String),

    /// The assembled graph breaks one or more graph rules.
    #[error("E1203: {} graph rule violation(s): {}", .0.len(), joined(.0))]
    Graph(Vec<GraphViolation>),

    /// An embedded rule set failed to compile.
    #[error("E1204: invalid rule set {name}: {reason}")]
    RuleSet { name: String, reason: String },
}

impl ValidationError {
    /// Structural violations, if this is a structural error.
    pub fn violations(&self) -> &[Violation] {
        match self {
            ValidationError::Structural { violations, .. } => violations,
            _ => &[],
        }
    }

    /// Graph violations, if this is a graph error.
    pub fn graph_violations(&self) -> &[GraphViolation] {
        match self {
            ValidationError::Graph(violations) => violations,
            _ => &[],
        }
    }
}
