//! Key namespacing and value encoding
//!
//! Logical keys become physical keys by plain prefix concatenation, with no
//! escaping; changing the prefix is the only namespace isolation mechanism.
//! Values are stored as strings: JSON strings pass through untouched, every
//! other value is written as JSON text.

use super::errors::CacheResult;
use serde::Serialize;
use serde_json::Value;

/// Maps logical keys to physical store keys and values to stored strings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyCodec {
    prefix: String,
}

impl KeyCodec {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// The configured namespace prefix
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Physical key for a logical key (`prefix + key`)
    pub fn physical_key(&self, logical_key: &str) -> String {
        let mut key = String::with_capacity(self.prefix.len() + logical_key.len());
        key.push_str(&self.prefix);
        key.push_str(logical_key);
        key
    }

    /// Encode any serializable value into its stored representation
    ///
    /// Values that serialize to a JSON string are stored verbatim. Fails with
    /// `CacheError::SerializationError` when the value has no JSON form
    /// (for example a map keyed by sequences).
    pub fn encode<T: Serialize + ?Sized>(value: &T) -> CacheResult<String> {
        let json = serde_json::to_value(value)?;
        Ok(Self::encode_value(&json))
    }

    /// Encode an already-built JSON value
    pub fn encode_value(value: &Value) -> String {
        match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    /// Decode a stored string
    ///
    /// With `parse_json` false the raw string is returned as `Value::String`.
    /// Otherwise the string is parsed as JSON; anything that does not parse
    /// (legacy or foreign values under the key) comes back raw instead of failing.
    pub fn decode(raw: String, parse_json: bool) -> Value {
        if !parse_json {
            return Value::String(raw);
        }

        match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(_) => Value::String(raw),
        }
    }
}
