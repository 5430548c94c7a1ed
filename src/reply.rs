//! Raw handshake reply (`hello` / `ismaster`) as returned by a server
//!
//! The reply is kept as an untyped document and read through lenient
//! accessors: a missing, `null` or wrongly typed field reads as absent.

use crate::error::{SdamError, SdamResult};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

/// Read-only view over a handshake reply document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HelloReply {
    document: Map<String, Value>,
}

impl HelloReply {
    pub fn new(document: Map<String, Value>) -> Self {
        Self { document }
    }

    /// Parse a reply from JSON text. The top level must be an object.
    pub fn from_json_str(json: &str) -> SdamResult<Self> {
        let value: Value = serde_json::from_str(json)?;
        Self::try_from(value)
    }

    /// Read a reply saved as a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> SdamResult<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn document(&self) -> &Map<String, Value> {
        &self.document
    }

    pub fn into_document(self) -> Map<String, Value> {
        self.document
    }

    /// Get a field, treating `null` as absent
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.document.get(key).filter(|value| !value.is_null())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Boolean-ish read: `true` or any non-zero number
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(truthy)
    }

    /// Shorthand for flags where absent means false
    pub fn flag(&self, key: &str) -> bool {
        self.get_bool(key).unwrap_or(false)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(integer)
    }

    /// String entries of an array field, skipping anything that isn't a string
    pub fn get_str_list(&self, key: &str) -> Option<Vec<&str>> {
        self.get(key)
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Value::as_str).collect())
    }

    pub fn get_document(&self, key: &str) -> Option<&Map<String, Value>> {
        self.get(key).and_then(Value::as_object)
    }

    /// Whether the handshake succeeded (`ok` present and truthy)
    pub fn is_ok(&self) -> bool {
        self.flag("ok")
    }
}

impl From<Map<String, Value>> for HelloReply {
    fn from(document: Map<String, Value>) -> Self {
        Self::new(document)
    }
}

impl TryFrom<Value> for HelloReply {
    type Error = SdamError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(document) => Ok(Self::new(document)),
            other => Err(SdamError::reply_parse(format!(
                "handshake reply must be a document, got {}",
                value_kind(&other)
            ))),
        }
    }
}

fn truthy(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_f64().map(|f| f != 0.0),
        _ => None,
    }
}

fn integer(value: &Value) -> Option<i64> {
    let Value::Number(number) = value else {
        return None;
    };
    if let Some(i) = number.as_i64() {
        return Some(i);
    }
    // Drivers sometimes encode int32 fields as doubles
    number
        .as_f64()
        .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64)
        .map(|f| f as i64)
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "document",
    }
}
