//! Keyed JSON documents holding arrays of records.
//!
//! Key insertion order of every object is preserved so a rewrite only
//! differs from the input in the arrays that were touched (and in
//! whitespace, which is always re-derived with 4-space indentation).

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use serde_json::{Map, Value};
use thiserror::Error;

const INDENT: &[u8] = b"    ";

/// Why a JSON buffer does not have the expected shape.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum JsonShapeError {
    #[error("invalid JSON: {0}")]
    Syntax(String),

    #[error("top-level value is not an object")]
    NotAnObject,

    #[error("missing required key '{0}'")]
    MissingKey(String),

    #[error("'{0}' is not an object")]
    ExpectedObject(String),

    #[error("'{0}' is not an array")]
    ExpectedArray(String),
}

/// A parsed JSON document whose top level is an object.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonDocument {
    root: Map<String, Value>,
}

impl JsonDocument {
    pub fn parse(bytes: &[u8]) -> Result<Self, JsonShapeError> {
        let bytes = bytes.strip_prefix(b"\xef\xbb\xbf").unwrap_or(bytes);
        let value: Value =
            serde_json::from_slice(bytes).map_err(|e| JsonShapeError::Syntax(e.to_string()))?;
        match value {
            Value::Object(root) => Ok(Self { root }),
            _ => Err(JsonShapeError::NotAnObject),
        }
    }

    /// Walk `container` (every segment required), then return the array at
    /// `field`, creating an empty one when it is absent.
    pub fn array_mut(
        &mut self,
        container: &[&str],
        field: &str,
    ) -> Result<&mut Vec<Value>, JsonShapeError> {
        let mut object = &mut self.root;
        for segment in container {
            object = match object.get_mut(*segment) {
                Some(Value::Object(inner)) => inner,
                Some(_) => return Err(JsonShapeError::ExpectedObject(segment.to_string())),
                None => return Err(JsonShapeError::MissingKey(segment.to_string())),
            };
        }
        match object
            .entry(field)
            .or_insert_with(|| Value::Array(Vec::new()))
        {
            Value::Array(items) => Ok(items),
            _ => Err(JsonShapeError::ExpectedArray(field.to_string())),
        }
    }

    /// Records of a source fragment. An absent container or field means
    /// the fragment contributes nothing.
    pub fn records(&self, container: &[&str], field: &str) -> Result<Vec<Value>, JsonShapeError> {
        let mut object = &self.root;
        for segment in container {
            object = match object.get(*segment) {
                Some(Value::Object(inner)) => inner,
                Some(_) => return Err(JsonShapeError::ExpectedObject(segment.to_string())),
                None => return Ok(Vec::new()),
            };
        }
        match object.get(field) {
            Some(Value::Array(items)) => Ok(items.clone()),
            Some(_) => Err(JsonShapeError::ExpectedArray(field.to_string())),
            None => Ok(Vec::new()),
        }
    }

    /// Pretty-print with 4-space indentation.
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        let mut out = Vec::new();
        let mut serializer = Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(INDENT));
        self.root.serialize(&mut serializer)?;
        Ok(out)
    }
}
