//! Wire message construction.
//!
//! Each record becomes one JSON object. Field precedence, from weakest to
//! strongest:
//!
//! 1. configured static metadata,
//! 2. per-call splat fields (later splat objects override earlier ones),
//! 3. the identity fields `host` and `application`,
//! 4. `@version`, `@timestamp`, `level` and `message`.
//!
//! The static metadata is copied once when the encoder is built, so later
//! changes to a caller's map cannot leak into subsequent messages.

use std::sync::Arc;

use chrono::SecondsFormat;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::log_record::{FieldValue, Fields, LogRecord, Splat};

/// Platform line terminator appended to every datagram.
#[cfg(windows)]
pub const LINE_ENDING: &str = "\r\n";
/// Platform line terminator appended to every datagram.
#[cfg(not(windows))]
pub const LINE_ENDING: &str = "\n";

pub const VERSION_FIELD: &str = "@version";
pub const TIMESTAMP_FIELD: &str = "@timestamp";
pub const WIRE_VERSION: &str = "1";

#[derive(Clone, Debug, Error)]
pub enum EncodeError {
    /// JSON has no representation for NaN or infinity.
    #[error("field {0:?} holds a non-finite number")]
    NonFinite(String),
    #[error("failed to serialise log record: {0}")]
    Json(#[source] Arc<serde_json::Error>),
}

impl From<serde_json::Error> for EncodeError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(Arc::new(err))
    }
}

/// Turns records into wire messages using fixed identity metadata.
#[derive(Clone, Debug)]
pub struct LogRecordEncoder {
    meta: Fields,
    host: String,
    application: String,
}

impl LogRecordEncoder {
    pub fn new(meta: &Fields, host: impl Into<String>, application: impl Into<String>) -> Self {
        Self {
            meta: meta.clone(),
            host: host.into(),
            application: application.into(),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn application(&self) -> &str {
        &self.application
    }

    /// Build the JSON message for `record`.
    pub fn encode(&self, record: &LogRecord) -> Result<String, EncodeError> {
        let mut data = Map::new();
        insert_fields(&mut data, &self.meta)?;
        for splat in &record.splat {
            if let Splat::Fields(fields) = splat {
                insert_fields(&mut data, fields)?;
            }
        }
        data.insert("host".into(), Value::String(self.host.clone()));
        data.insert(
            "application".into(),
            Value::String(self.application.clone()),
        );
        data.insert(VERSION_FIELD.into(), Value::String(WIRE_VERSION.into()));
        data.insert(
            TIMESTAMP_FIELD.into(),
            Value::String(
                record
                    .timestamp
                    .to_rfc3339_opts(SecondsFormat::Millis, true),
            ),
        );
        data.insert("level".into(), Value::String(record.level.to_string()));
        data.insert("message".into(), Value::String(record.message.clone()));
        Ok(serde_json::to_string(&data)?)
    }
}

fn insert_fields(data: &mut Map<String, Value>, fields: &Fields) -> Result<(), EncodeError> {
    for (key, value) in fields {
        if !value.is_finite() {
            return Err(EncodeError::NonFinite(key.clone()));
        }
        data.insert(key.clone(), field_to_json(value)?);
    }
    Ok(())
}

fn field_to_json(value: &FieldValue) -> Result<Value, EncodeError> {
    Ok(serde_json::to_value(value)?)
}

/// Strip trailing whitespace from `message` and append one `terminator`.
pub fn frame_message(message: &str, terminator: &str) -> Vec<u8> {
    let body = message.trim_end();
    let mut framed = Vec::with_capacity(body.len() + terminator.len());
    framed.extend_from_slice(body.as_bytes());
    framed.extend_from_slice(terminator.as_bytes());
    framed
}
