//! Log record representation consumed by the transport.
//!
//! A [`LogRecord`] carries the severity, the message text, and any splat
//! values supplied alongside the call. Structured fields are restricted to a
//! closed set of scalar variants so that every record maps onto a flat JSON
//! object without deep-copying caller data.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::level::Level;

/// Scalar value attached to a structured field.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Str(String),
}

/// Flat mapping of field names to scalar values.
pub type Fields = BTreeMap<String, FieldValue>;

impl FieldValue {
    /// Convert a JSON value, rejecting arrays and objects.
    ///
    /// The rejected value is handed back so callers can report or discard it.
    pub fn from_json(value: serde_json::Value) -> Result<Self, serde_json::Value> {
        use serde_json::Value;
        match value {
            Value::Null => Ok(Self::Null),
            Value::Bool(b) => Ok(Self::Bool(b)),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Self::Int(i))
                } else if let Some(u) = n.as_u64() {
                    Ok(Self::UInt(u))
                } else {
                    n.as_f64().map(Self::Float).ok_or(Value::Number(n))
                }
            }
            Value::String(s) => Ok(Self::Str(s)),
            other @ (Value::Array(_) | Value::Object(_)) => Err(other),
        }
    }

    pub fn is_finite(&self) -> bool {
        match self {
            FieldValue::Float(f) => f.is_finite(),
            _ => true,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => f.write_str("null"),
            FieldValue::Bool(b) => write!(f, "{b}"),
            FieldValue::Int(i) => write!(f, "{i}"),
            FieldValue::UInt(u) => write!(f, "{u}"),
            FieldValue::Float(v) => write!(f, "{v}"),
            FieldValue::Str(s) => f.write_str(s),
        }
    }
}

macro_rules! field_value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for FieldValue {
                fn from(value: $ty) -> Self {
                    FieldValue::$variant(value.into())
                }
            }
        )*
    };
}

field_value_from!(
    bool => Bool,
    i32 => Int,
    i64 => Int,
    u32 => UInt,
    u64 => UInt,
    f32 => Float,
    f64 => Float,
    String => Str,
    &str => Str,
);

/// Build [`Fields`] from a JSON object, silently dropping nested objects
/// and arrays.
pub fn fields_from_json(map: serde_json::Map<String, serde_json::Value>) -> Fields {
    map.into_iter()
        .filter_map(|(key, value)| FieldValue::from_json(value).ok().map(|v| (key, v)))
        .collect()
}

/// One value supplied alongside a log call.
///
/// Only [`Splat::Fields`] contributes to the wire message; bare values are
/// accepted for parity with printf-style call sites and then ignored.
#[derive(Clone, Debug, PartialEq)]
pub enum Splat {
    Fields(Fields),
    Value(FieldValue),
}

impl From<Fields> for Splat {
    fn from(fields: Fields) -> Self {
        Splat::Fields(fields)
    }
}

impl From<FieldValue> for Splat {
    fn from(value: FieldValue) -> Self {
        Splat::Value(value)
    }
}

impl From<serde_json::Value> for Splat {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Object(map) => Splat::Fields(fields_from_json(map)),
            other => match FieldValue::from_json(other) {
                Ok(v) => Splat::Value(v),
                Err(_) => Splat::Value(FieldValue::Null),
            },
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LogRecord {
    /// Severity of the record.
    pub level: Level,
    /// The log message content.
    pub message: String,
    /// Values supplied alongside the message, in call order.
    pub splat: Vec<Splat>,
    /// Time the record was created.
    pub timestamp: DateTime<Utc>,
}

impl LogRecord {
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            splat: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    /// Append structured fields to the record's splat.
    pub fn with_fields(mut self, fields: Fields) -> Self {
        self.splat.push(Splat::Fields(fields));
        self
    }

    /// Append a single field, merging into the trailing splat object when
    /// there is one.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        match self.splat.last_mut() {
            Some(Splat::Fields(fields)) => {
                fields.insert(key.into(), value.into());
            }
            _ => {
                let mut fields = Fields::new();
                fields.insert(key.into(), value.into());
                self.splat.push(Splat::Fields(fields));
            }
        }
        self
    }

    pub fn with_splat(mut self, splat: impl Into<Splat>) -> Self {
        self.splat.push(splat.into());
        self
    }
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.level, self.message)
    }
}
