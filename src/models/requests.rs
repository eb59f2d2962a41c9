//! Request model for the key-value operations
//!
//! A request carries query-string parameters and an optional JSON body. The
//! key may arrive in either; every other field is read from the body.

use std::collections::HashMap;

use serde_json::Value;

use crate::error::{GatewayError, Result};

/// Query parameters plus JSON body of one request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KvRequest {
    pub query: HashMap<String, String>,
    pub body: Option<Value>,
}

impl KvRequest {
    pub fn new(query: HashMap<String, String>, body: Option<Value>) -> Self {
        Self { query, body }
    }

    /// Request with only a JSON body.
    pub fn from_body(body: Value) -> Self {
        Self {
            query: HashMap::new(),
            body: Some(body),
        }
    }

    /// Request with only query parameters.
    pub fn from_query<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            query: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            body: None,
        }
    }

    /// A body field, ignoring explicit nulls.
    pub fn body_field(&self, name: &str) -> Option<&Value> {
        self.body
            .as_ref()
            .and_then(|body| body.get(name))
            .filter(|value| !value.is_null())
    }

    /// The raw `key` field, query first.
    pub fn key_value(&self) -> Option<Value> {
        match self.query.get("key") {
            Some(key) => Some(Value::String(key.clone())),
            None => self.body_field("key").cloned(),
        }
    }

    /// The `key` field as text.
    ///
    /// Numbers are accepted and used as their decimal text.
    pub fn key(&self) -> Result<String> {
        match self.key_value() {
            Some(Value::String(key)) => Ok(key),
            Some(Value::Number(n)) => Ok(n.to_string()),
            Some(_) => Err(GatewayError::invalid("key must be a string")),
            None => Err(GatewayError::invalid("key is required")),
        }
    }

    /// The `value` body field as text.
    pub fn value(&self) -> Result<String> {
        match self.body_field("value") {
            Some(Value::String(s)) => Ok(s.clone()),
            Some(Value::Number(n)) => Ok(n.to_string()),
            Some(Value::Bool(b)) => Ok(b.to_string()),
            Some(_) => Err(GatewayError::invalid("value must be a scalar")),
            None => Err(GatewayError::invalid("value is required")),
        }
    }

    /// A body field holding a non-negative integer, or None.
    ///
    /// Digit-only strings and non-negative JSON integers are accepted;
    /// anything else counts as absent.
    pub fn digits_field(&self, name: &str) -> Option<u64> {
        match self.body_field(name)? {
            Value::String(s) => parse_digits(s),
            Value::Number(n) => n.as_u64(),
            _ => None,
        }
    }
}

/// Parses a string matching `^\d+$`.
pub fn parse_digits(raw: &str) -> Option<u64> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}
