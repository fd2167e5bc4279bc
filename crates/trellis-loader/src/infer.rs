//! Version and dialect inference for fetched resources.
//!
//! Version: the resource's own `openapi` field, then the referencing
//! context, then the configured default. Dialect: an explicit declaration,
//! then the referencing context (only when the version came from there as
//! well), then the configured default, then the version's own dialect.

use serde_json::Value;
use thiserror::Error;
use url::Url;

use trellis_spec::{Context, Kind, SpecVersion};

use crate::config::LoaderConfig;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InferError {
    #[error("unsupported OpenAPI version '{0}'")]
    UnsupportedVersion(String),

    #[error("`openapi` must be a string")]
    VersionNotString,

    #[error("no `openapi` field, no referencing document and no default version")]
    NoVersion,

    #[error("`{0}` must be a string")]
    DialectNotString(&'static str),

    #[error("`{keyword}` must be an absolute URI, found '{value}'")]
    RelativeDialect { keyword: &'static str, value: String },

    #[error("`jsonSchemaDialect` requires OpenAPI 3.1 or later")]
    DialectNotSupported,
}

/// Compute the context of a resource of `kind` holding `value`.
///
/// `referrer` is the context at the first reference that led here; the root
/// document has none.
pub fn infer(
    value: &Value,
    kind: Kind,
    referrer: Option<&Context>,
    config: &LoaderConfig,
) -> Result<Context, InferError> {
    let (version, inherited) = match value.get("openapi") {
        Some(Value::String(declared)) => (
            SpecVersion::parse(declared)
                .ok_or_else(|| InferError::UnsupportedVersion(declared.clone()))?,
            false,
        ),
        Some(_) => return Err(InferError::VersionNotString),
        None => match (referrer, config.default_version) {
            (Some(referrer), _) => (referrer.version(), true),
            (None, Some(version)) => (version, false),
            (None, None) => return Err(InferError::NoVersion),
        },
    };

    if let Some(dialect) = declared_dialect(value, kind)? {
        if kind == Kind::Document && !version.supports_dialects() {
            return Err(InferError::DialectNotSupported);
        }
        return Ok(Context::new(version, dialect));
    }

    if inherited {
        if let Some(referrer) = referrer {
            return Ok(Context::new(version, referrer.dialect()));
        }
    }

    Ok(match &config.default_dialect {
        Some(dialect) => Context::new(version, dialect.as_str()),
        None => Context::for_version(version),
    })
}

/// The context for a value adopted as `kind` inside a resource whose
/// context is `outer`: a schema may switch dialect with `$schema`.
pub fn scope(value: &Value, kind: Kind, outer: &Context) -> Result<Context, InferError> {
    if kind != Kind::Schema {
        return Ok(outer.clone());
    }
    Ok(match declared_dialect(value, kind)? {
        Some(dialect) => outer.with_dialect(dialect),
        None => outer.clone(),
    })
}

fn declared_dialect(value: &Value, kind: Kind) -> Result<Option<&str>, InferError> {
    let keyword = match kind {
        Kind::Document => "jsonSchemaDialect",
        Kind::Schema => "$schema",
        _ => return Ok(None),
    };
    match value.get(keyword) {
        None => Ok(None),
        Some(Value::String(dialect)) => {
            if Url::parse(dialect).is_err() {
                return Err(InferError::RelativeDialect {
                    keyword,
                    value: dialect.clone(),
                });
            }
            Ok(Some(dialect))
        }
        Some(_) => Err(InferError::DialectNotString(keyword)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use trellis_spec::version::{JSON_SCHEMA_2020_12, JSON_SCHEMA_DRAFT_07, OAS_31_DIALECT};

    const CUSTOM: &str = "https://example.test/dialect";

    #[test]
    fn explicit_version_and_implied_dialect() {
        let context = infer(
            &json!({"openapi": "3.1.0"}),
            Kind::Document,
            None,
            &LoaderConfig::default(),
        )
        .unwrap();
        assert_eq!(context.version(), SpecVersion::V3_1);
        assert_eq!(context.dialect(), OAS_31_DIALECT);
    }

    #[test]
    fn unsupported_version_is_an_error() {
        let err = infer(
            &json!({"openapi": "2.0"}),
            Kind::Document,
            None,
            &LoaderConfig::default(),
        )
        .unwrap_err();
        assert_eq!(err, InferError::UnsupportedVersion("2.0".into()));
    }

    #[test]
    fn version_and_dialect_are_inherited_together() {
        let referrer = Context::new(SpecVersion::V3_1, CUSTOM);
        let context = infer(
            &json!({"type": "string"}),
            Kind::Schema,
            Some(&referrer),
            &LoaderConfig::default(),
        )
        .unwrap();
        assert_eq!(context, referrer);
    }

    #[test]
    fn explicit_version_does_not_inherit_dialect() {
        let referrer = Context::new(SpecVersion::V3_1, CUSTOM);
        let context = infer(
            &json!({"openapi": "3.1.1"}),
            Kind::Document,
            Some(&referrer),
            &LoaderConfig::default(),
        )
        .unwrap();
        assert_eq!(context.dialect(), OAS_31_DIALECT);
    }

    #[test]
    fn explicit_dialect_wins() {
        let referrer = Context::new(SpecVersion::V3_1, CUSTOM);
        let context = infer(
            &json!({"$schema": JSON_SCHEMA_DRAFT_07}),
            Kind::Schema,
            Some(&referrer),
            &LoaderConfig::default(),
        )
        .unwrap();
        assert_eq!(context.version(), SpecVersion::V3_1);
        assert_eq!(context.dialect(), JSON_SCHEMA_DRAFT_07);
    }

    #[test]
    fn defaults_apply_without_referrer() {
        let config = LoaderConfig::new()
            .with_default_version(SpecVersion::V3_1)
            .with_default_dialect(JSON_SCHEMA_2020_12);
        let context = infer(&json!({}), Kind::Fragment, None, &config).unwrap();
        assert_eq!(context.version(), SpecVersion::V3_1);
        assert_eq!(context.dialect(), JSON_SCHEMA_2020_12);
    }

    #[test]
    fn no_version_anywhere_is_an_error() {
        let err = infer(&json!({}), Kind::Fragment, None, &LoaderConfig::default()).unwrap_err();
        assert_eq!(err, InferError::NoVersion);
    }

    #[test]
    fn relative_dialect_is_an_error() {
        let err = infer(
            &json!({"openapi": "3.1.0", "jsonSchemaDialect": "dialect.json"}),
            Kind::Document,
            None,
            &LoaderConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, InferError::RelativeDialect { .. }));
    }

    #[test]
    fn dialect_on_30_is_an_error() {
        let err = infer(
            &json!({"openapi": "3.0.3", "jsonSchemaDialect": JSON_SCHEMA_2020_12}),
            Kind::Document,
            None,
            &LoaderConfig::default(),
        )
        .unwrap_err();
        assert_eq!(err, InferError::DialectNotSupported);
    }

    #[test]
    fn scope_switches_schema_dialect_only() {
        let outer = Context::for_version(SpecVersion::V3_1);
        let schema = json!({"$schema": JSON_SCHEMA_DRAFT_07});
        assert_eq!(
            scope(&schema, Kind::Schema, &outer).unwrap().dialect(),
            JSON_SCHEMA_DRAFT_07
        );
        assert_eq!(scope(&schema, Kind::Parameter, &outer).unwrap(), outer);
    }
}
