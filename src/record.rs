//! Generic record: an ordered column -> value mapping used for both write
//! payloads and read results. A record is either a loose map or a serialized
//! typed value; both expose the same field-iteration surface so the SQL
//! composer and hooks never branch on which one they hold.

use crate::error::DataError;
use serde::Serialize;
use serde_json::{Map, Value};

/// Sentinel forcing a string column to SQL NULL.
pub const NULL_STRING: &str = "NULL_STRING";

/// Sentinel forcing a date column to SQL NULL.
pub const NULL_DATE: &str = "NULL_DATE";

/// Sentinel forcing an integer column to SQL NULL.
pub const NULL_INT: i64 = i64::MIN;

/// True when a value is one of the reserved null sentinels.
pub fn is_null_sentinel(v: &Value) -> bool {
    match v {
        Value::String(s) => s == NULL_STRING || s == NULL_DATE,
        Value::Number(n) => n.as_i64() == Some(NULL_INT),
        _ => false,
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Record {
    /// Built from loose JSON (request bodies, query rows).
    Map(Map<String, Value>),
    /// Built from a typed value via serde; field order is declaration order.
    Typed(Map<String, Value>),
}

impl Record {
    pub fn new() -> Self {
        Record::Map(Map::new())
    }

    pub fn from_map(map: Map<String, Value>) -> Self {
        Record::Map(map)
    }

    /// Wrap a JSON value. Fails unless it is an object.
    pub fn from_value(value: Value) -> Result<Self, DataError> {
        match value {
            Value::Object(map) => Ok(Record::Map(map)),
            other => Err(DataError::BadRequest(format!(
                "record must be a JSON object, got {}",
                json_type_name(&other)
            ))),
        }
    }

    /// Serialize a typed value into a record.
    pub fn from_typed<T: Serialize>(value: &T) -> Result<Self, DataError> {
        let v = serde_json::to_value(value)
            .map_err(|e| DataError::BadRequest(format!("cannot serialize record: {e}")))?;
        match v {
            Value::Object(map) => Ok(Record::Typed(map)),
            other => Err(DataError::BadRequest(format!(
                "typed record must serialize to an object, got {}",
                json_type_name(&other)
            ))),
        }
    }

    pub(crate) fn inner(&self) -> &Map<String, Value> {
        match self {
            Record::Map(m) | Record::Typed(m) => m,
        }
    }

    fn inner_mut(&mut self) -> &mut Map<String, Value> {
        match self {
            Record::Map(m) | Record::Typed(m) => m,
        }
    }

    /// Iterate fields in insertion order.
    pub fn fields(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.inner().iter()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.inner().get(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.inner_mut().insert(name.into(), value);
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.inner_mut().remove(name)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.inner().contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.inner().is_empty()
    }

    pub fn len(&self) -> usize {
        self.inner().len()
    }

    pub fn into_value(self) -> Value {
        match self {
            Record::Map(m) | Record::Typed(m) => Value::Object(m),
        }
    }
}

impl Default for Record {
    fn default() -> Self {
        Record::new()
    }
}

/// Records serialize as their field map, never as an enum.
impl Serialize for Record {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.inner().serialize(serializer)
    }
}

pub fn json_type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
