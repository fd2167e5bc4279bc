use thiserror::Error;
use url::Url;

use trellis_spec::{Kind, Location, Pointer};
use trellis_validator::ValidationError;

/// Errors returned by [`Fetch`](crate::Fetch) implementations.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Nothing exists at the URI.
    #[error("E1301: resource not found: {0}")]
    NotFound(String),

    #[error("E1302: failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("E1303: HTTP request failed: {0}")]
    Http(String),

    /// No fetcher is registered for the URI scheme.
    #[error("E1304: unsupported URI scheme '{0}'")]
    UnsupportedScheme(String),

    #[error("E1305: invalid URI '{uri}': {reason}")]
    InvalidUri { uri: String, reason: String },

    /// The fetched resource is not of the kind the referencing site expects.
    #[error("E1306: expected a {expected} resource, fetched a {actual}")]
    KindMismatch { expected: Kind, actual: Kind },

    #[error("E1307: fetch cancelled")]
    Cancelled,
}

/// Errors that abort a load. No graph is returned or cached after one.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("E1311: cannot fetch {uri}: {source}")]
    Fetch {
        uri: Url,
        #[source]
        source: FetchError,
    },

    #[error("E1312: cannot decode {uri}{}: {reason}", at(.pointer))]
    Decode {
        uri: Url,
        pointer: Option<Pointer>,
        reason: String,
    },

    #[error("E1313: {uri}{} failed structural validation: {source}", at(.pointer))]
    StructuralValidation {
        uri: Url,
        pointer: Option<Pointer>,
        #[source]
        source: ValidationError,
    },

    /// The target resource exists but nothing sits at the pointer or anchor.
    #[error("E1314: reference '{reference}' at {site}: nothing at {uri}#{pointer}")]
    NotFound {
        uri: Url,
        pointer: Pointer,
        reference: String,
        site: Location,
    },

    /// The target exists but cannot serve as the expected kind.
    #[error("E1315: reference '{reference}' at {site} cannot be resolved in {uri}#{pointer}: {reason}")]
    NotResolvable {
        uri: Url,
        pointer: Pointer,
        reference: String,
        site: Location,
        reason: String,
    },

    #[error("E1316: cannot determine version or dialect of {uri}: {reason}")]
    VersionDialect { uri: Url, reason: String },

    #[error("E1317: graph rooted at {uri} failed validation: {source}")]
    GraphValidation {
        uri: Url,
        #[source]
        source: ValidationError,
    },

    #[error("E1318: load of {uri} cancelled")]
    Cancelled { uri: Url },
}

fn at(pointer: &Option<Pointer>) -> String {
    match pointer {
        Some(pointer) if !pointer.is_root() => format!("#{}", pointer),
        _ => String::new(),
    }
}

impl LoadError {
    /// The absolute URI the error is about.
    pub fn uri(&self) -> &Url {
        match self {
            LoadError::Fetch { uri, .. }
            | LoadError::Decode { uri, .. }
            | LoadError::StructuralValidation { uri, .. }
            | LoadError::NotFound { uri, .. }
            | LoadError::NotResolvable { uri, .. }
            | LoadError::VersionDialect { uri, .. }
            | LoadError::GraphValidation { uri, .. }
            | LoadError::Cancelled { uri } => uri,
        }
    }

    /// The pointer inside [`uri`](Self::uri), where there is one.
    pub fn pointer(&self) -> Option<&Pointer> {
        match self {
            LoadError::Decode { pointer, .. } | LoadError::StructuralValidation { pointer, .. } => {
                pointer.as_ref()
            }
            LoadError::NotFound { pointer, .. } | LoadError::NotResolvable { pointer, .. } => {
                Some(pointer)
            }
            _ => None,
        }
    }

    /// The `E####` code of this error.
    pub fn code(&self) -> &'static str {
        match self {
            LoadError::Fetch { .. } => "E1311",
            LoadError::Decode { .. } => "E1312",
            LoadError::StructuralValidation { .. } => "E1313",
            LoadError::NotFound { .. } => "E1314",
            LoadError::NotResolvable { .. } => "E1315",
            LoadError::VersionDialect { .. } => "E1316",
            LoadError::GraphValidation { .. } => "E1317",
            LoadError::Cancelled { .. } => "E1318",
        }
    }
}
