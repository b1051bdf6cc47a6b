//! Response envelope shared by every HTTP endpoint.
//!
//! The backend answers `{ success, data?, error?: { code, message,
//! timestamp } }`. Older deployments returned bare arrays or wrapped the
//! payload twice; [`adapt_legacy`] migrates those once, before the strict
//! schema is applied. Nothing else in the client inspects response shapes.

#[cfg(test)]
#[path = "envelope_test.rs"]
mod envelope_test;

use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    #[serde(default)]
    pub timestamp: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Envelope {
    pub success: bool,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub error: Option<ErrorBody>,
}

impl Envelope {
    /// Parse a response body through the legacy adapter and the strict schema.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error when the adapted body does not match
    /// the envelope schema.
    pub fn from_value(body: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(adapt_legacy(body))
    }
}

/// Migrate legacy response shapes into the strict envelope.
///
/// - a bare JSON array becomes `{ "success": true, "data": [...] }`
/// - `{ "success": .., "data": { "data": [...] } }` is flattened one level
///
/// Anything else passes through untouched.
#[must_use]
pub fn adapt_legacy(body: Value) -> Value {
    match body {
        Value::Array(items) => {
            let mut map = Map::new();
            map.insert("success".to_owned(), Value::Bool(true));
            map.insert("data".to_owned(), Value::Array(items));
            Value::Object(map)
        }
        Value::Object(mut map) => {
            let nested = map
                .get_mut("data")
                .and_then(Value::as_object_mut)
                .filter(|inner| inner.len() == 1 && inner.get("data").is_some_and(Value::is_array))
                .and_then(|inner| inner.remove("data"));
            if let Some(items) = nested {
                map.insert("data".to_owned(), items);
            }
            Value::Object(map)
        }
        other => other,
    }
}
