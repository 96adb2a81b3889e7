//! Payload Normalization
//!
//! Agent events arrive as loosely shaped trees: maps, lists, scalars, raw
//! audio bytes, and SDK objects that only know how to dump themselves. This
//! module turns any of those into a plain `serde_json::Value` that can be
//! framed over the client websocket.

use base64::Engine;
use bytes::Bytes;
use serde_json::{Map, Number, Value};
use std::fmt;
use std::sync::Arc;

/// Failure of an SDK object to produce one of its representations.
#[derive(Debug, thiserror::Error)]
pub enum DumpError {
    #[error("representation not supported")]
    Unsupported,
    #[error("dump failed: {0}")]
    Failed(String),
}

/// An SDK-shaped object that can describe itself as a mapping.
///
/// `dump` is the preferred form: field names use their wire aliases and
/// unset fields are left out. `dump_json` is consulted only when `dump`
/// fails, and its output is parsed back into a value.
pub trait EventDump: Send + Sync {
    fn dump(&self) -> Result<RawValue, DumpError>;

    fn dump_json(&self) -> Result<String, DumpError> {
        Err(DumpError::Unsupported)
    }
}

/// A mapping key before it has been stringified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawKey {
    Str(String),
    Int(i64),
}

impl fmt::Display for RawKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawKey::Str(s) => f.write_str(s),
            RawKey::Int(i) => write!(f, "{}", i),
        }
    }
}

impl From<&str> for RawKey {
    fn from(value: &str) -> Self {
        RawKey::Str(value.to_string())
    }
}

impl From<String> for RawKey {
    fn from(value: String) -> Self {
        RawKey::Str(value)
    }
}

impl From<i64> for RawKey {
    fn from(value: i64) -> Self {
        RawKey::Int(value)
    }
}

/// An un-normalized event value.
#[derive(Clone)]
pub enum RawValue {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Bytes(Bytes),
    Seq(Vec<RawValue>),
    Map(Vec<(RawKey, RawValue)>),
    Dump(Arc<dyn EventDump>),
}

impl RawValue {
    /// Builds a mapping, keeping the entries in the given order.
    pub fn map<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<RawKey>,
        V: Into<RawValue>,
    {
        RawValue::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn dump<T: EventDump + 'static>(object: T) -> Self {
        RawValue::Dump(Arc::new(object))
    }
}

impl fmt::Debug for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Null => f.write_str("Null"),
            RawValue::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            RawValue::Number(n) => f.debug_tuple("Number").field(n).finish(),
            RawValue::String(s) => f.debug_tuple("String").field(s).finish(),
            RawValue::Bytes(b) => f.debug_tuple("Bytes").field(&b.len()).finish(),
            RawValue::Seq(items) => f.debug_tuple("Seq").field(items).finish(),
            RawValue::Map(entries) => f.debug_tuple("Map").field(entries).finish(),
            RawValue::Dump(_) => f.write_str("Dump(..)"),
        }
    }
}

impl From<Value> for RawValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => RawValue::Null,
            Value::Bool(b) => RawValue::Bool(b),
            Value::Number(n) => RawValue::Number(n),
            Value::String(s) => RawValue::String(s),
            Value::Array(items) => RawValue::Seq(items.into_iter().map(RawValue::from).collect()),
            Value::Object(map) => RawValue::map(map),
        }
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::String(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        RawValue::String(value)
    }
}

impl From<bool> for RawValue {
    fn from(value: bool) -> Self {
        RawValue::Bool(value)
    }
}

impl From<i64> for RawValue {
    fn from(value: i64) -> Self {
        RawValue::Number(value.into())
    }
}

impl From<Bytes> for RawValue {
    fn from(value: Bytes) -> Self {
        RawValue::Bytes(value)
    }
}

impl From<Vec<u8>> for RawValue {
    fn from(value: Vec<u8>) -> Self {
        RawValue::Bytes(Bytes::from(value))
    }
}

impl From<Vec<RawValue>> for RawValue {
    fn from(value: Vec<RawValue>) -> Self {
        RawValue::Seq(value)
    }
}

impl<T: Into<RawValue>> From<Option<T>> for RawValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(RawValue::Null, Into::into)
    }
}

/// Converts any raw event value into its JSON-safe form. Never fails.
pub fn normalize(value: &RawValue) -> Value {
    match value {
        RawValue::Null => Value::Null,
        RawValue::Bool(b) => Value::Bool(*b),
        RawValue::Number(n) => Value::Number(n.clone()),
        RawValue::String(s) => Value::String(s.clone()),
        RawValue::Bytes(bytes) => {
            Value::String(base64::engine::general_purpose::STANDARD.encode(bytes))
        }
        RawValue::Seq(items) => Value::Array(items.iter().map(normalize).collect()),
        RawValue::Map(entries) => Value::Object(
            entries
                .iter()
                .map(|(k, v)| (k.to_string(), normalize(v)))
                .collect(),
        ),
        RawValue::Dump(object) => normalize_dump(object.as_ref()),
    }
}

fn normalize_dump(object: &dyn EventDump) -> Value {
    match object.dump() {
        Ok(raw) => return normalize(&raw),
        Err(e) => tracing::debug!(error = %e, "Event dump unavailable, trying JSON form"),
    }

    let reparsed = object.dump_json().and_then(|text| {
        serde_json::from_str::<Value>(&text).map_err(|e| DumpError::Failed(e.to_string()))
    });
    match reparsed {
        Ok(json @ Value::Object(_)) => json,
        Ok(other) => {
            tracing::debug!(value = %other, "Event JSON form is not a mapping, sending empty object");
            Value::Object(Map::new())
        }
        Err(e) => {
            tracing::debug!(error = %e, "Event has no usable representation, sending empty object");
            Value::Object(Map::new())
        }
    }
}
