//! Raw bytes to JSON values.
//!
//! JSON is tried first since it is the cheaper parse and a subset of YAML;
//! anything else goes through the YAML parser into the same value type.

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("E1321: resource is empty")]
    Empty,

    #[error("E1322: neither JSON nor YAML: {0}")]
    Syntax(String),
}

/// Decode a JSON or YAML resource.
pub fn decode(bytes: &[u8]) -> Result<Value, CodecError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(CodecError::Empty);
    }

    if let Ok(value) = serde_json::from_slice::<Value>(bytes) {
        return Ok(value);
    }

    match serde_yaml::from_slice::<Value>(bytes) {
        Ok(Value::Null) => Err(CodecError::Empty),
        Ok(value) => Ok(value),
        Err(e) => Err(CodecError::Syntax(e.to_string())),
    }
}
