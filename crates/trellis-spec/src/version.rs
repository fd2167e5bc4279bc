//! Specification versions and schema dialects.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Dialect implied by OpenAPI 3.0 (its own Schema Object subset).
pub const OAS_30_DIALECT: &str = "https://spec.openapis.org/oas/3.0/schema/2021-09-28";
/// Default `jsonSchemaDialect` of OpenAPI 3.1.
pub const OAS_31_DIALECT: &str = "https://spec.openapis.org/oas/3.1/dialect/base";
/// Default `jsonSchemaDialect` of OpenAPI 3.2.
pub const OAS_32_DIALECT: &str = "https://spec.openapis.org/oas/3.2/dialect/2025-09-17";

pub const JSON_SCHEMA_2020_12: &str = "https://json-schema.org/draft/2020-12/schema";
pub const JSON_SCHEMA_2019_09: &str = "https://json-schema.org/draft/2019-09/schema";
pub const JSON_SCHEMA_DRAFT_07: &str = "http://json-schema.org/draft-07/schema#";
pub const JSON_SCHEMA_DRAFT_04: &str = "http://json-schema.org/draft-04/schema#";

/// Supported OpenAPI specification versions (minor granularity).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SpecVersion {
    #[serde(rename = "3.0")]
    V3_0,
    #[serde(rename = "3.1")]
    V3_1,
    #[serde(rename = "3.2")]
    V3_2,
}

impl SpecVersion {
    /// Parse an `openapi` field value such as `3.1.0`.
    ///
    /// Only the major and minor components are significant.
    pub fn parse(version: &str) -> Option<Self> {
        let mut parts = version.trim().split('.');
        let major = parts.next()?;
        let minor = parts.next()?;
        if major != "3" {
            return None;
        }
        match minor {
            "0" => Some(Self::V3_0),
            "1" => Some(Self::V3_1),
            "2" => Some(Self::V3_2),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::V3_0 => "3.0",
            Self::V3_1 => "3.1",
            Self::V3_2 => "3.2",
        }
    }

    /// The schema dialect assumed when nothing else declares one.
    pub fn default_dialect(self) -> &'static str {
        match self {
            Self::V3_0 => OAS_30_DIALECT,
            Self::V3_1 => OAS_31_DIALECT,
            Self::V3_2 => OAS_32_DIALECT,
        }
    }

    /// Whether documents of this version may declare `jsonSchemaDialect`.
    pub fn supports_dialects(self) -> bool {
        self != Self::V3_0
    }
}

impl fmt::Display for SpecVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SpecVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let padded = if s.matches('.').count() == 1 {
            format!("{}.0", s)
        } else {
            s.to_string()
        };
        Self::parse(&padded).ok_or_else(|| format!("unsupported OpenAPI version: {}", s))
    }
}

/// Compare dialect URIs ignoring an empty trailing fragment.
pub fn same_dialect(a: &str, b: &str) -> bool {
    a.trim_end_matches('#') == b.trim_end_matches('#')
}

/// The version/dialect pair in force while traversing a resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Context {
    version: SpecVersion,
    dialect: Arc<str>,
}

impl Context {
    pub fn new(version: SpecVersion, dialect: impl Into<Arc<str>>) -> Self {
        Self {
            version,
            dialect: dialect.into(),
        }
    }

    /// Context with the version's default dialect.
    pub fn for_version(version: SpecVersion) -> Self {
        Self::new(version, version.default_dialect())
    }

    pub fn version(&self) -> SpecVersion {
        self.version
    }

    pub fn dialect(&self) -> &str {
        &self.dialect
    }

    /// Same version, different dialect. The version never changes below a
    /// resource root.
    pub fn with_dialect(&self, dialect: &str) -> Self {
        if same_dialect(&self.dialect, dialect) {
            return self.clone();
        }
        Self {
            version: self.version,
            dialect: Arc::from(dialect),
        }
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OpenAPI {} ({})", self.version, self.dialect)
    }
}
