//! Node addresses.
//!
//! A [`Location`] names a node twice: by the absolute URI of the resource
//! that contains it plus a pointer inside that resource, and by a pointer
//! from the root of the logical document (the path through which the node
//! was first reached).

use std::fmt;
use std::sync::LazyLock;

use url::Url;

use crate::error::LocationError;
use crate::pointer::Pointer;

static UNLOCATED: LazyLock<Url> =
    LazyLock::new(|| Url::parse("urn:trellis:unlocated").expect("static URN is valid"));

/// Address of a node in the document graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Location {
    uri: Url,
    pointer: Pointer,
    document_pointer: Pointer,
}

impl Default for Location {
    /// Placeholder used between decoding and [`Node::locate`](crate::Node::locate).
    fn default() -> Self {
        Self {
            uri: UNLOCATED.clone(),
            pointer: Pointer::root(),
            document_pointer: Pointer::root(),
        }
    }
}

impl Location {
    /// Parse an absolute URI whose fragment (if any) is a JSON pointer.
    pub fn new(uri: &str) -> Result<Self, LocationError> {
        let url = Url::parse(uri).map_err(|e| LocationError::InvalidUri {
            uri: uri.to_string(),
            reason: e.to_string(),
        })?;
        Self::from_url(&url)
    }

    /// Build a location from a parsed URL; the fragment becomes both pointers.
    pub fn from_url(url: &Url) -> Result<Self, LocationError> {
        let pointer = fragment_pointer(url)?;
        Ok(Self {
            uri: without_fragment(url),
            document_pointer: pointer.clone(),
            pointer,
        })
    }

    /// A location one level deeper. The receiver is left untouched.
    pub fn append(&self, segment: impl Into<String>) -> Self {
        let segment = segment.into();
        Self {
            uri: self.uri.clone(),
            pointer: self.pointer.join(segment.clone()),
            document_pointer: self.document_pointer.join(segment),
        }
    }

    /// Rebind to another resource: the resource pointer is taken from the
    /// fragment of `uri`, the document pointer is kept.
    pub fn with_uri(&self, uri: &Url) -> Result<Self, LocationError> {
        Ok(Self {
            uri: without_fragment(uri),
            pointer: fragment_pointer(uri)?,
            document_pointer: self.document_pointer.clone(),
        })
    }

    /// Rebind to `pointer` inside the resource `uri`, keeping the document
    /// pointer.
    pub fn with_resource(&self, uri: &Url, pointer: Pointer) -> Self {
        Self {
            uri: without_fragment(uri),
            pointer,
            document_pointer: self.document_pointer.clone(),
        }
    }

    /// Absolute URI of the enclosing resource (no fragment).
    pub fn uri(&self) -> &Url {
        &self.uri
    }

    /// Pointer from the root of the enclosing resource.
    pub fn pointer(&self) -> &Pointer {
        &self.pointer
    }

    /// Pointer from the root of the logical document.
    pub fn document_pointer(&self) -> &Pointer {
        &self.document_pointer
    }

    pub fn is_located(&self) -> bool {
        self.uri != *UNLOCATED
    }

    /// The full URI of this node, fragment included.
    pub fn to_url(&self) -> Url {
        let mut url = self.uri.clone();
        url.set_fragment(Some(&self.pointer.to_string()));
        url
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.uri, self.pointer)
    }
}

/// Strip the fragment from a URL.
pub fn without_fragment(url: &Url) -> Url {
    let mut url = url.clone();
    url.set_fragment(None);
    url
}

fn fragment_pointer(url: &Url) -> Result<Pointer, LocationError> {
    match url.fragment() {
        None | Some("") => Ok(Pointer::root()),
        Some(fragment) => {
            Pointer::from_fragment(fragment).map_err(|source| LocationError::InvalidFragment {
                uri: url.to_string(),
                source,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_splits_fragment() {
        let location = Location::new("https://x/a.json#/components/schemas/Pet").unwrap();
        assert_eq!(location.uri().as_str(), "https://x/a.json");
        assert_eq!(location.pointer().to_string(), "/components/schemas/Pet");
        assert_eq!(location.document_pointer(), location.pointer());
    }

    #[test]
    fn new_rejects_anchor_fragment() {
        assert!(matches!(
            Location::new("https://x/a.json#node"),
            Err(LocationError::InvalidFragment { .. })
        ));
    }

    #[test]
    fn new_rejects_relative_uri() {
        assert!(matches!(
            Location::new("a.json"),
            Err(LocationError::InvalidUri { .. })
        ));
    }

    #[test]
    fn append_does_not_mutate() {
        let base = Location::new("https://x/a.json").unwrap();
        let child = base.append("paths").append("/pets");
        assert!(base.pointer().is_root());
        assert_eq!(child.pointer().to_string(), "/paths/~1pets");
        assert_eq!(child.to_string(), "https://x/a.json#/paths/~1pets");
    }

    #[test]
    fn with_uri_keeps_document_pointer() {
        let site = Location::new("https://x/a.json")
            .unwrap()
            .append("components")
            .append("schemas")
            .append("Pet");
        let target = Url::parse("https://x/b.json#/defs/Pet").unwrap();
        let rebound = site.with_uri(&target).unwrap();

        assert_eq!(rebound.uri().as_str(), "https://x/b.json");
        assert_eq!(rebound.pointer().to_string(), "/defs/Pet");
        assert_eq!(
            rebound.document_pointer().to_string(),
            "/components/schemas/Pet"
        );
    }

    #[test]
    fn default_is_unlocated() {
        assert!(!Location::default().is_located());
        assert!(Location::new("file:///tmp/a.yaml").unwrap().is_located());
    }

    #[test]
    fn to_url_escapes_pointer() {
        let location = Location::new("https://x/a.json")
            .unwrap()
            .append("paths")
            .append("/foo");
        assert_eq!(location.to_url().fragment(), Some("/paths/~1foo"));
    }
}
