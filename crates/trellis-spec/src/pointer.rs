//! JSON Pointer (RFC 6901) tokens.
//!
//! Pointers are stored unescaped; `~1` and `~0` are only visible in the
//! string form produced by `Display` and accepted by [`Pointer::parse`].

use std::fmt;

use percent_encoding::percent_decode_str;

use crate::error::PointerError;

/// A parsed JSON Pointer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pointer {
    tokens: Vec<String>,
}

impl Pointer {
    /// The empty pointer, addressing the whole document.
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse the string form (`""` or `/a/b~1c`).
    pub fn parse(input: &str) -> Result<Self, PointerError> {
        if input.is_empty() {
            return Ok(Self::root());
        }
        let rest = input
            .strip_prefix('/')
            .ok_or_else(|| PointerError::MissingLeadingSlash(input.to_string()))?;

        let tokens = rest
            .split('/')
            .map(|raw| unescape(raw).ok_or_else(|| PointerError::InvalidEscape(input.to_string())))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { tokens })
    }

    /// Parse a URI fragment (percent-encoded, without the leading `#`).
    pub fn from_fragment(fragment: &str) -> Result<Self, PointerError> {
        let decoded = percent_decode_str(fragment)
            .decode_utf8()
            .map_err(|_| PointerError::InvalidEncoding(fragment.to_string()))?;
        Self::parse(&decoded)
    }

    /// Returns true when the (percent-decoded) fragment has pointer shape
    /// rather than anchor shape.
    pub fn is_pointer_fragment(fragment: &str) -> bool {
        fragment.is_empty()
            || fragment.starts_with('/')
            || fragment.to_ascii_lowercase().starts_with("%2f")
    }

    pub fn is_root(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn last(&self) -> Option<&str> {
        self.tokens.last().map(String::as_str)
    }

    /// A pointer one token deeper.
    pub fn join(&self, token: impl Into<String>) -> Self {
        let mut tokens = self.tokens.clone();
        tokens.push(token.into());
        Self { tokens }
    }

    pub fn push(&mut self, token: impl Into<String>) {
        self.tokens.push(token.into());
    }

    pub fn parent(&self) -> Option<Self> {
        let (_, init) = self.tokens.split_last()?;
        Some(Self {
            tokens: init.to_vec(),
        })
    }

    pub fn starts_with(&self, prefix: &Pointer) -> bool {
        self.tokens.starts_with(&prefix.tokens)
    }

    /// The tokens remaining after `prefix`, if `prefix` is a prefix of `self`.
    pub fn strip_prefix(&self, prefix: &Pointer) -> Option<Self> {
        self.tokens
            .strip_prefix(prefix.tokens.as_slice())
            .map(|rest| Self {
                tokens: rest.to_vec(),
            })
    }

    /// Concatenate two pointers.
    pub fn concat(&self, other: &Pointer) -> Self {
        let mut tokens = self.tokens.clone();
        tokens.extend(other.tokens.iter().cloned());
        Self { tokens }
    }
}

impl fmt::Display for Pointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for token in &self.tokens {
            write!(f, "/{}", escape(token))?;
        }
        Ok(())
    }
}

impl<S: Into<String>> FromIterator<S> for Pointer {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            tokens: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Escape a single reference token (`~` → `~0`, `/` → `~1`).
pub fn escape(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

fn unescape(raw: &str) -> Option<String> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(ch) = chars.next() {
        if ch == '~' {
            match chars.next() {
                Some('0') => out.push('~'),
                Some('1') => out.push('/'),
                _ => return None,
            }
        } else {
            out.push(ch);
        }
    }
    Some(out)
}

/// Parse a token as an array index (no leading zeros, no sign).
pub fn parse_index(token: &str) -> Option<usize> {
    if token.is_empty() || (token.len() > 1 && token.starts_with('0')) {
        return None;
    }
    if !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    token.parse().ok()
}
