use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::AppError;
use crate::transport::{Method, Request};

/// Deterministic identifier for a cached query.
///
/// Derived from the endpoint and its parameters. Parameters are canonicalized
/// (object keys sorted at every depth, `null` members dropped) so logically
/// equal parameter sets always produce the same key, whatever order their
/// fields were inserted in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey(String);

impl QueryKey {
    /// Derives a key from an endpoint name and any serializable parameter object.
    ///
    /// # Errors
    ///
    /// Returns `UNKNOWN_ERROR` if `params` cannot be serialized to JSON.
    pub fn derive(endpoint: &str, params: &impl Serialize) -> Result<Self, AppError> {
        let value = serde_json::to_value(params)
            .map_err(|e| AppError::unknown(format!("cannot derive query key: {e}")))?;
        Ok(Self::from_value(endpoint, value))
    }

    /// Derives a key from a request: method, path and query parameters.
    #[must_use]
    pub fn from_request(request: &Request) -> Self {
        let params: Map<String, Value> = request
            .query
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        let mut value = Value::Object(params);
        if let Some(body) = &request.body {
            value = serde_json::json!({ "query": value, "body": body });
        }
        Self::from_value(&endpoint_name(request.method, &request.path), value)
    }

    fn from_value(endpoint: &str, value: Value) -> Self {
        match canonicalize(value) {
            Value::Null => Self(endpoint.to_string()),
            Value::Object(map) if map.is_empty() => Self(endpoint.to_string()),
            canonical => Self(format!("{endpoint} {canonical}")),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn endpoint_name(method: Method, path: &str) -> String {
    format!("{method} {path}")
}

/// Rebuilds `value` with sorted object keys and without `null` members.
fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let sorted: BTreeMap<String, Value> = map
                .into_iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k, canonicalize(v)))
                .collect();
            Value::Object(sorted.into_iter().collect())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize).collect()),
        other => other,
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for QueryKey {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for QueryKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}
