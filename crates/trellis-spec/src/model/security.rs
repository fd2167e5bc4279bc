use std::any::Any;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{extension, raw, scalar, Extensions};
use crate::component::Object;
use crate::kind::Kind;
use crate::location::Location;
use crate::node::{Lookup, Node};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityScheme {
    /// `apiKey`, `http`, `mutualTLS`, `oauth2` or `openIdConnect`.
    #[serde(rename = "type")]
    pub scheme_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(rename = "in", default, skip_serializing_if = "Option::is_none")]
    pub param_in: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bearer_format: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flows: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_id_connect_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oauth2_metadata_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<bool>,

    #[serde(flatten)]
    pub extensions: Extensions,

    #[serde(skip)]
    pub(crate) location: Location,
}

impl Object for SecurityScheme {
    const KIND: Kind = Kind::SecurityScheme;
}

impl Node for SecurityScheme {
    fn kind(&self) -> Kind {
        Kind::SecurityScheme
    }

    fn location(&self) -> &Location {
        &self.location
    }

    fn locate(&mut self, location: Location) {
        self.location = location;
    }

    fn child(&self, token: &str) -> Lookup<'_> {
        match token {
            "type" => Lookup::Scalar,
            "description" => scalar(&self.description),
            "name" => scalar(&self.name),
            "in" => scalar(&self.param_in),
            "scheme" => scalar(&self.scheme),
            "bearerFormat" => scalar(&self.bearer_format),
            "flows" => raw(&self.flows),
            "openIdConnectUrl" => scalar(&self.open_id_connect_url),
            "oauth2MetadataUrl" => scalar(&self.oauth2_metadata_url),
            "deprecated" => scalar(&self.deprecated),
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
